// Parse the `docker stats --no-stream` table into ContainerSample rows.
//
// CONTAINER ID   NAME  CPU %  MEM USAGE / LIMIT    MEM %  NET I/O         BLOCK I/O    PIDS
// 3f4e5a6b7c8d   web   0.50%  12.5MiB / 1.944GiB   0.63%  1.2kB / 648B    0B / 0B      5

use tracing::warn;

use crate::error::SampleError;
use crate::models::ContainerSample;
use crate::units::{memory_to_mb, percent, round2, size_to_mb};

/// Whitespace-separated fields in one well-formed row.
const MIN_FIELDS: usize = 14;

/// Parses one data row. `disk_mb` is left at zero; the caller attaches the size.
pub fn parse_stats_line(line: &str) -> Result<ContainerSample, SampleError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < MIN_FIELDS {
        return Err(SampleError::malformed(
            line,
            format!("expected {} fields, got {}", MIN_FIELDS, fields.len()),
        ));
    }

    let cpu = percent(fields[2])?;
    let mem = memory_to_mb(fields[3])?;
    let mem_perc = percent(fields[6])?;
    let net_in = size_to_mb(fields[7])?;
    let net_out = size_to_mb(fields[9])?;
    let block_in = size_to_mb(fields[10])?;
    let block_out = size_to_mb(fields[12])?;
    let pids = fields[13]
        .parse::<u32>()
        .map_err(|e| SampleError::malformed(line, format!("pids: {}", e)))?;

    Ok(ContainerSample {
        id: fields[0].to_string(),
        name: fields[1].to_string(),
        cpu_percent: round2(cpu),
        mem_mb: round2(mem),
        mem_percent: round2(mem_perc),
        net_in_mb: round2(net_in),
        net_out_mb: round2(net_out),
        block_in_mb: round2(block_in),
        block_out_mb: round2(block_out),
        pids,
        disk_mb: 0.0,
    })
}

/// Parses the whole table. The header and blank lines are ignored; malformed rows are
/// logged and skipped without discarding the others.
pub fn parse_stats_output(output: &str) -> Vec<ContainerSample> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty() && !line.contains("CONTAINER ID"))
        .filter_map(|line| match parse_stats_line(line) {
            Ok(sample) => Some(sample),
            Err(e) => {
                warn!(error = %e, operation = "parse_docker_stats", "skipping container row");
                None
            }
        })
        .collect()
}
