// Unit converters for the textual magnitudes printed by the container runtime.
// All sizes end up in MB using 1024-based division, for both "GiB" and "GB" labels.

use crate::error::UnitError;

const KIB_PER_MIB: f64 = 1024.0;
const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// Rounds towards zero at two decimal places: `1.2349 -> 1.23`, `-1.2349 -> -1.23`.
///
/// Plain truncation of the scaled binary value, so `0.29` becomes `0.28`.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).trunc() / 100.0
}

fn parse_number(s: &str) -> Result<f64, UnitError> {
    s.trim()
        .parse::<f64>()
        .map_err(|source| UnitError::InvalidNumber {
            value: s.to_string(),
            source,
        })
}

/// `"45.3%"` -> `45.3`. A missing `%` is tolerated.
pub fn percent(value: &str) -> Result<f64, UnitError> {
    parse_number(value.trim().trim_end_matches('%'))
}

/// `"1.2GiB" | "512MiB" | "256KiB"` -> MB. Case-insensitive.
pub fn memory_to_mb(value: &str) -> Result<f64, UnitError> {
    let upper = value.trim().to_ascii_uppercase();
    if let Some(n) = upper.strip_suffix("GIB") {
        return Ok(parse_number(n)? * 1024.0);
    }
    if let Some(n) = upper.strip_suffix("MIB") {
        return parse_number(n);
    }
    if let Some(n) = upper.strip_suffix("KIB") {
        return Ok(parse_number(n)? / KIB_PER_MIB);
    }
    Err(UnitError::UnknownUnit(value.to_string()))
}

/// `"1.2GB" | "512MB" | "256kB" | "100B"` -> MB, with the same 1024 divisor as [`memory_to_mb`].
pub fn size_to_mb(value: &str) -> Result<f64, UnitError> {
    let upper = value.trim().to_ascii_uppercase();
    if let Some(n) = upper.strip_suffix("GB") {
        return Ok(parse_number(n)? * 1024.0);
    }
    if let Some(n) = upper.strip_suffix("MB") {
        return parse_number(n);
    }
    if let Some(n) = upper.strip_suffix("KB") {
        return Ok(parse_number(n)? / KIB_PER_MIB);
    }
    if let Some(n) = upper.strip_suffix('B') {
        return Ok(parse_number(n)? / BYTES_PER_MIB);
    }
    Err(UnitError::UnknownUnit(value.to_string()))
}

/// Raw byte count -> MB.
pub fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MIB
}
