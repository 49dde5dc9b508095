// Host-wide CPU, memory and root-disk usage via sysinfo

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sysinfo::{Disks, System};
use tracing::{debug, instrument};

use super::{SampleSource, join_error};
use crate::error::SampleError;
use crate::models::{Snapshot, SourceKind, SystemSample};
use crate::units::round2;

const BYTES_PER_MB: u64 = 1024 * 1024;

pub struct SystemSource {
    name: String,
    disk_mount: PathBuf,
    sys: Arc<Mutex<System>>,
    disks: Arc<Mutex<Disks>>,
}

impl SystemSource {
    /// `name` is the display name of the host record; `disk_mount` the mount point whose
    /// usage is reported as the disk gauge.
    pub fn new(name: &str, disk_mount: impl AsRef<Path>) -> Self {
        let mut sys = System::new();
        sys.refresh_cpu_all();
        sys.refresh_memory();
        Self {
            name: name.to_string(),
            disk_mount: disk_mount.as_ref().to_path_buf(),
            sys: Arc::new(Mutex::new(sys)),
            disks: Arc::new(Mutex::new(Disks::new_with_refreshed_list())),
        }
    }
}

/// Used memory in whole MB and as a percentage of total.
pub(crate) fn memory_usage(total: u64, available: u64) -> (f64, f64) {
    let used = total.saturating_sub(available);
    let used_mb = (used / BYTES_PER_MB) as f64;
    let percent = if total > 0 {
        round2(used as f64 / total as f64 * 100.0)
    } else {
        0.0
    };
    (used_mb, percent)
}

fn poisoned(what: &str, e: impl std::fmt::Display) -> SampleError {
    SampleError::unavailable(SourceKind::System, format!("{} lock poisoned: {}", what, e))
}

#[async_trait]
impl SampleSource for SystemSource {
    fn kind(&self) -> SourceKind {
        SourceKind::System
    }

    #[instrument(skip(self), fields(source = "system"))]
    async fn fetch(&self) -> Result<Snapshot, SampleError> {
        let sys = self.sys.clone();
        let disks = self.disks.clone();
        let mount = self.disk_mount.clone();
        let name = self.name.clone();

        tokio::task::spawn_blocking(move || {
            let mut sys = sys.lock().map_err(|e| poisoned("sysinfo", e))?;

            // CPU usage is a delta between two refreshes.
            sys.refresh_cpu_all();
            std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
            sys.refresh_cpu_all();
            let cpu_percent = round2(sys.global_cpu_usage() as f64);

            sys.refresh_memory();
            let (mem_mb, mem_percent) = memory_usage(sys.total_memory(), sys.available_memory());

            let mut disks = disks.lock().map_err(|e| poisoned("sysinfo disks", e))?;
            disks.refresh(false);
            let disk_mb = match disks.list().iter().find(|d| d.mount_point() == mount.as_path()) {
                Some(d) => {
                    (d.total_space().saturating_sub(d.available_space()) / BYTES_PER_MB) as f64
                }
                None => {
                    debug!(mount = %mount.display(), "mount point not found; disk reported as 0");
                    0.0
                }
            };

            Ok(Snapshot::System(SystemSample {
                name,
                cpu_percent,
                mem_mb,
                mem_percent,
                disk_mb,
            }))
        })
        .await
        .map_err(|e| join_error(SourceKind::System, e))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_usage_whole_mb_and_truncated_percent() {
        let total = 8 * 1024 * BYTES_PER_MB;
        let available = total - (1536 * BYTES_PER_MB + 512 * 1024);
        let (mb, pct) = memory_usage(total, available);
        // the partial MB is dropped
        assert_eq!(mb, 1536.0);
        assert_eq!(pct, 18.75);
    }

    #[test]
    fn memory_usage_zero_total() {
        assert_eq!(memory_usage(0, 0), (0.0, 0.0));
    }
}
