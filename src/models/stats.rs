// Running min/max/avg statistics for one entity over the current flush window

use serde::Serialize;

use super::Reading;
use crate::units::round2;

/// One independently averaged metric. `avg == round2(sum / count)`, kept within `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunningMetric {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    #[serde(skip)]
    pub sum: f64,
    #[serde(skip)]
    pub count: u64,
}

impl RunningMetric {
    /// First sample of the window: min = max = avg = value.
    pub fn seed(value: f64) -> Self {
        Self {
            min: value,
            max: value,
            avg: value,
            sum: value,
            count: 1,
        }
    }

    pub fn fold(&mut self, value: f64) {
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.sum += value;
        self.count += 1;
        self.avg = round2(self.sum / self.count as f64).clamp(self.min, self.max);
    }
}

/// Aggregate for one entity identity. Created on the first sample of a window,
/// folded in place afterwards, dropped wholesale at flush.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunningStats {
    pub id: String,
    pub name: String,
    pub group: String,
    pub cpu_percent: RunningMetric,
    pub mem_mb: RunningMetric,
    pub mem_percent: RunningMetric,
    /// Latest sample only; a gauge, not averaged.
    pub disk_mb: f64,
}

impl RunningStats {
    pub fn seed(id: &str, name: &str, group: &str, reading: &Reading) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            group: group.to_string(),
            cpu_percent: RunningMetric::seed(reading.cpu_percent),
            mem_mb: RunningMetric::seed(reading.mem_mb),
            mem_percent: RunningMetric::seed(reading.mem_percent),
            disk_mb: reading.disk_mb.unwrap_or(0.0),
        }
    }

    pub fn fold(&mut self, reading: &Reading) {
        self.cpu_percent.fold(reading.cpu_percent);
        self.mem_mb.fold(reading.mem_mb);
        self.mem_percent.fold(reading.mem_percent);
        if let Some(disk) = reading.disk_mb {
            self.disk_mb = disk;
        }
    }
}
