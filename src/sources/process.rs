// Per-process CPU and memory usage via sysinfo (the agent itself or a named process)

use std::ffi::OsStr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sysinfo::{Pid, ProcessesToUpdate, System};
use tracing::instrument;

use super::{SampleSource, join_error};
use crate::error::SampleError;
use crate::models::{ProcessSample, Snapshot, SourceKind};
use crate::units::round2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessTarget {
    /// The running agent.
    Own,
    /// First process whose name matches exactly.
    Named(String),
}

impl ProcessTarget {
    pub fn display_name(&self) -> &str {
        match self {
            ProcessTarget::Own => env!("CARGO_PKG_NAME"),
            ProcessTarget::Named(name) => name,
        }
    }
}

pub struct ProcessSource {
    target: ProcessTarget,
    sys: Arc<Mutex<System>>,
}

impl ProcessSource {
    pub fn new(target: ProcessTarget) -> Self {
        Self {
            target,
            sys: Arc::new(Mutex::new(System::new())),
        }
    }
}

/// RSS in MB (from KB, as `ps` reports it) and as a percentage of total memory.
pub(crate) fn process_memory(rss_bytes: u64, total_bytes: u64) -> (f64, f64) {
    let rss_kb = rss_bytes / 1024;
    let mem_mb = round2(rss_kb as f64 / 1024.0);
    let mem_percent = if total_bytes > 0 {
        round2(rss_bytes as f64 / total_bytes as f64 * 100.0)
    } else {
        0.0
    };
    (mem_mb, mem_percent)
}

fn unavailable(reason: impl std::fmt::Display) -> SampleError {
    SampleError::unavailable(SourceKind::Process, reason)
}

fn resolve_pid(sys: &mut System, target: &ProcessTarget) -> Result<Pid, SampleError> {
    match target {
        ProcessTarget::Own => sysinfo::get_current_pid().map_err(unavailable),
        ProcessTarget::Named(name) => {
            sys.refresh_processes(ProcessesToUpdate::All, true);
            sys.processes_by_exact_name(OsStr::new(name))
                .next()
                .map(|p| p.pid())
                .ok_or_else(|| unavailable(format!("no process named '{}'", name)))
        }
    }
}

#[async_trait]
impl SampleSource for ProcessSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Process
    }

    #[instrument(skip(self), fields(source = "process"))]
    async fn fetch(&self) -> Result<Snapshot, SampleError> {
        let sys = self.sys.clone();
        let target = self.target.clone();

        tokio::task::spawn_blocking(move || {
            let mut sys = sys
                .lock()
                .map_err(|e| unavailable(format!("sysinfo lock poisoned: {}", e)))?;
            let pid = resolve_pid(&mut sys, &target)?;

            sys.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
            std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
            sys.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
            sys.refresh_memory();

            let process = sys
                .process(pid)
                .ok_or_else(|| unavailable(format!("process {} not found", pid.as_u32())))?;
            let (mem_mb, mem_percent) = process_memory(process.memory(), sys.total_memory());

            Ok(Snapshot::Process(ProcessSample {
                pid: pid.as_u32(),
                name: target.display_name().to_string(),
                cpu_percent: round2(process.cpu_usage() as f64),
                mem_mb,
                mem_percent,
            }))
        })
        .await
        .map_err(|e| join_error(SourceKind::Process, e))?
    }
}
