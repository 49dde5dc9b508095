// Renders a drained record as one line-protocol line:
// <prefix>,cont=<container>,group=<group>,id=<id>,name=<name> <field>=<v>,...

use std::str::FromStr;

use crate::models::RunningStats;

/// Fields a record can emit. Names match the `METRIC_KEYS` allow-list entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricField {
    CpuMinPerc,
    CpuMaxPerc,
    CpuAvgPerc,
    MemMinMb,
    MemMaxMb,
    MemAvgMb,
    MemMinPerc,
    MemMaxPerc,
    MemAvgPerc,
    DiskMb,
}

impl MetricField {
    pub fn name(&self) -> &'static str {
        match self {
            MetricField::CpuMinPerc => "cpu_min_perc",
            MetricField::CpuMaxPerc => "cpu_max_perc",
            MetricField::CpuAvgPerc => "cpu_avg_perc",
            MetricField::MemMinMb => "mem_min_mb",
            MetricField::MemMaxMb => "mem_max_mb",
            MetricField::MemAvgMb => "mem_avg_mb",
            MetricField::MemMinPerc => "mem_min_perc",
            MetricField::MemMaxPerc => "mem_max_perc",
            MetricField::MemAvgPerc => "mem_avg_perc",
            MetricField::DiskMb => "disk_mb",
        }
    }

    pub fn value(&self, s: &RunningStats) -> f64 {
        match self {
            MetricField::CpuMinPerc => s.cpu_percent.min,
            MetricField::CpuMaxPerc => s.cpu_percent.max,
            MetricField::CpuAvgPerc => s.cpu_percent.avg,
            MetricField::MemMinMb => s.mem_mb.min,
            MetricField::MemMaxMb => s.mem_mb.max,
            MetricField::MemAvgMb => s.mem_mb.avg,
            MetricField::MemMinPerc => s.mem_percent.min,
            MetricField::MemMaxPerc => s.mem_percent.max,
            MetricField::MemAvgPerc => s.mem_percent.avg,
            MetricField::DiskMb => s.disk_mb,
        }
    }
}

impl FromStr for MetricField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "cpu_min_perc" => Ok(MetricField::CpuMinPerc),
            "cpu_max_perc" => Ok(MetricField::CpuMaxPerc),
            "cpu_avg_perc" => Ok(MetricField::CpuAvgPerc),
            "mem_min_mb" => Ok(MetricField::MemMinMb),
            "mem_max_mb" => Ok(MetricField::MemMaxMb),
            "mem_avg_mb" => Ok(MetricField::MemAvgMb),
            "mem_min_perc" => Ok(MetricField::MemMinPerc),
            "mem_max_perc" => Ok(MetricField::MemMaxPerc),
            "mem_avg_perc" => Ok(MetricField::MemAvgPerc),
            "disk_mb" => Ok(MetricField::DiskMb),
            other => Err(format!("unknown metric field '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LineFormatter {
    prefix: String,
    container: String,
    fields: Vec<MetricField>,
}

impl LineFormatter {
    /// Builds a formatter from the configured allow-list. Unknown names are dropped;
    /// order and duplicates are kept as configured.
    pub fn new(prefix: &str, container: &str, metric_keys: &[String]) -> Self {
        let fields = metric_keys
            .iter()
            .filter_map(|k| k.parse::<MetricField>().ok())
            .collect();
        Self {
            prefix: prefix.to_string(),
            container: container.to_string(),
            fields,
        }
    }

    pub fn fields(&self) -> &[MetricField] {
        &self.fields
    }

    pub fn format(&self, stats: &RunningStats) -> String {
        let values: Vec<String> = self
            .fields
            .iter()
            .map(|f| format!("{}={:.2}", f.name(), f.value(stats)))
            .collect();
        format!(
            "{},cont={},group={},id={},name={} {}",
            self.prefix,
            escape_tag(&self.container),
            escape_tag(&stats.group),
            escape_tag(&stats.id),
            escape_tag(&stats.name),
            values.join(",")
        )
    }
}

/// Escapes the characters line protocol treats as separators in tag values.
fn escape_tag(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, ',' | ' ' | '=') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_tag_escapes_separators() {
        assert_eq!(escape_tag("a b,c=d"), "a\\ b\\,c\\=d");
        assert_eq!(escape_tag("plain"), "plain");
    }

    #[test]
    fn field_names_parse_back() {
        for f in [
            MetricField::CpuMinPerc,
            MetricField::MemAvgPerc,
            MetricField::DiskMb,
        ] {
            assert_eq!(f.name().parse::<MetricField>().unwrap(), f);
        }
        assert!("cpu_max".parse::<MetricField>().is_err());
    }
}
