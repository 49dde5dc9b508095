// Container samples: usage from the docker CLI stats table, virtual size via bollard

mod stats;

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bollard::Docker;
use bollard::query_parameters::ListContainersOptions;
use tracing::{instrument, warn};

use super::{SampleSource, command};
use crate::error::SampleError;
use crate::models::{ContainerSample, Snapshot, SourceKind};
use crate::units::{bytes_to_mb, round2};

pub use stats::{parse_stats_line, parse_stats_output};

pub struct DockerSource {
    docker: Option<Docker>,
    docker_bin: String,
    command_timeout: Duration,
}

impl DockerSource {
    /// Connects lazily to the local daemon socket. A failed connect is not fatal;
    /// every fetch then reports the source as unavailable.
    pub fn connect(docker_bin: &str, command_timeout: Duration) -> Self {
        let docker = match Docker::connect_with_unix_defaults() {
            Ok(d) => Some(d),
            Err(e) => {
                warn!(error = %e, operation = "docker_connect", "Docker API unavailable");
                None
            }
        };
        Self {
            docker,
            docker_bin: docker_bin.to_string(),
            command_timeout,
        }
    }

    /// Virtual size (SizeRootFs) of every running container, keyed by full ID.
    async fn container_sizes(&self) -> Result<HashMap<String, f64>, SampleError> {
        let docker = self
            .docker
            .as_ref()
            .ok_or_else(|| SampleError::unavailable(SourceKind::Container, "no Docker client"))?;

        let options = ListContainersOptions {
            all: false,
            size: true,
            ..Default::default()
        };
        let containers = docker
            .list_containers(Some(options))
            .await
            .map_err(|e| SampleError::unavailable(SourceKind::Container, e))?;

        Ok(containers
            .into_iter()
            .filter_map(|c| {
                let id = c.id?;
                let size = c.size_root_fs.unwrap_or(0).max(0) as u64;
                Some((id, round2(bytes_to_mb(size))))
            })
            .collect())
    }
}

/// Attaches the size to each row; the CLI prints truncated IDs, so match by prefix.
/// Rows with no matching container are skipped.
pub(crate) fn attach_sizes(
    rows: Vec<ContainerSample>,
    sizes: &HashMap<String, f64>,
) -> Vec<ContainerSample> {
    rows.into_iter()
        .filter_map(|mut row| {
            let size = sizes
                .iter()
                .find(|(id, _)| id.starts_with(&row.id))
                .map(|(_, size)| *size);
            match size {
                Some(size) => {
                    row.disk_mb = size;
                    Some(row)
                }
                None => {
                    warn!(
                        container = %row.id,
                        operation = "container_size",
                        "no size for container; skipping row"
                    );
                    None
                }
            }
        })
        .collect()
}

#[async_trait]
impl SampleSource for DockerSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Container
    }

    #[instrument(skip(self), fields(source = "container"))]
    async fn fetch(&self) -> Result<Snapshot, SampleError> {
        let output = command::run(
            SourceKind::Container,
            &self.docker_bin,
            &["stats", "--no-stream"],
            self.command_timeout,
        )
        .await?;
        let rows = parse_stats_output(&output);
        if rows.is_empty() {
            return Ok(Snapshot::Containers(rows));
        }
        let sizes = self.container_sizes().await?;
        Ok(Snapshot::Containers(attach_sizes(rows, &sizes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str) -> ContainerSample {
        parse_stats_line(&format!(
            "{} name 1.00% 10MiB / 1GiB 1.00% 0B / 0B 0B / 0B 1",
            id
        ))
        .unwrap()
    }

    #[test]
    fn attach_sizes_matches_short_id_prefix() {
        let mut sizes = HashMap::new();
        sizes.insert("aaaaaaaaaaaa0123456789".to_string(), 120.5);
        sizes.insert("bbbbbbbbbbbb0123456789".to_string(), 7.0);
        let out = attach_sizes(vec![row("aaaaaaaaaaaa"), row("bbbbbbbbbbbb")], &sizes);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].disk_mb, 120.5);
        assert_eq!(out[1].disk_mb, 7.0);
    }

    #[test]
    fn attach_sizes_drops_unknown_container() {
        let sizes = HashMap::from([("aaaaaaaaaaaa".to_string(), 1.0)]);
        let out = attach_sizes(vec![row("cccccccccccc"), row("aaaaaaaaaaaa")], &sizes);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "aaaaaaaaaaaa");
    }
}
