// Domain models: raw samples from the sources and the running statistics built from them

mod sample;
mod stats;

pub use sample::{ContainerSample, ProcessSample, Reading, Snapshot, SourceKind, SystemSample};
pub use stats::{RunningMetric, RunningStats};

/// Identity key of the single host record.
pub const SYSTEM_ID: &str = "system";
