// Point-in-time samples produced by the sources, one record type per source kind

use std::fmt;

use super::SYSTEM_ID;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    System,
    Container,
    Process,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::System => "system",
            SourceKind::Container => "container",
            SourceKind::Process => "process",
        }
    }

    /// Value of the `group=` tag for records of this kind.
    pub fn group(&self) -> &'static str {
        match self {
            SourceKind::System => "system",
            SourceKind::Container => "docker",
            SourceKind::Process => "process",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host-wide usage.
#[derive(Debug, Clone)]
pub struct SystemSample {
    /// Display name of the host record (the configured container name).
    pub name: String,
    pub cpu_percent: f64,
    pub mem_mb: f64,
    pub mem_percent: f64,
    pub disk_mb: f64,
}

/// One row of the container runtime stats table.
/// Network, block I/O and pid columns are informational only; nothing aggregates them.
#[derive(Debug, Clone)]
pub struct ContainerSample {
    pub id: String,
    pub name: String,
    pub cpu_percent: f64,
    pub mem_mb: f64,
    pub mem_percent: f64,
    pub net_in_mb: f64,
    pub net_out_mb: f64,
    pub block_in_mb: f64,
    pub block_out_mb: f64,
    pub pids: u32,
    /// Virtual size of the container filesystem.
    pub disk_mb: f64,
}

#[derive(Debug, Clone)]
pub struct ProcessSample {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: f64,
    pub mem_mb: f64,
    pub mem_percent: f64,
}

/// Output of one successful source fetch.
#[derive(Debug, Clone)]
pub enum Snapshot {
    System(SystemSample),
    Containers(Vec<ContainerSample>),
    Process(ProcessSample),
}

impl Snapshot {
    pub fn kind(&self) -> SourceKind {
        match self {
            Snapshot::System(_) => SourceKind::System,
            Snapshot::Containers(_) => SourceKind::Container,
            Snapshot::Process(_) => SourceKind::Process,
        }
    }

    /// Flattens the snapshot into `(identity, display name, reading)` triples.
    pub fn readings(&self) -> Vec<(String, String, Reading)> {
        match self {
            Snapshot::System(s) => vec![(SYSTEM_ID.to_string(), s.name.clone(), s.reading())],
            Snapshot::Containers(list) => list
                .iter()
                .map(|c| (c.id.clone(), c.name.clone(), c.reading()))
                .collect(),
            Snapshot::Process(p) => vec![(p.pid.to_string(), p.name.clone(), p.reading())],
        }
    }
}

/// The metrics every sample kind contributes to a running record.
/// `disk_mb` is `None` when the source has no disk gauge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub cpu_percent: f64,
    pub mem_mb: f64,
    pub mem_percent: f64,
    pub disk_mb: Option<f64>,
}

impl Reading {
    pub fn is_finite(&self) -> bool {
        self.cpu_percent.is_finite()
            && self.mem_mb.is_finite()
            && self.mem_percent.is_finite()
            && self.disk_mb.is_none_or(f64::is_finite)
    }
}

impl SystemSample {
    pub fn reading(&self) -> Reading {
        Reading {
            cpu_percent: self.cpu_percent,
            mem_mb: self.mem_mb,
            mem_percent: self.mem_percent,
            disk_mb: Some(self.disk_mb),
        }
    }
}

impl ContainerSample {
    pub fn reading(&self) -> Reading {
        Reading {
            cpu_percent: self.cpu_percent,
            mem_mb: self.mem_mb,
            mem_percent: self.mem_percent,
            disk_mb: Some(self.disk_mb),
        }
    }
}

impl ProcessSample {
    pub fn reading(&self) -> Reading {
        Reading {
            cpu_percent: self.cpu_percent,
            mem_mb: self.mem_mb,
            mem_percent: self.mem_percent,
            disk_mb: None,
        }
    }
}
