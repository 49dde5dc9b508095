// Sample sources: each fetch returns one typed snapshot or fails for the whole tick.

pub mod command;
pub mod docker;
pub mod process;
pub mod system;

use async_trait::async_trait;

use crate::error::SampleError;
use crate::models::{Snapshot, SourceKind};

pub use docker::DockerSource;
pub use process::{ProcessSource, ProcessTarget};
pub use system::SystemSource;

#[async_trait]
pub trait SampleSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    async fn fetch(&self) -> Result<Snapshot, SampleError>;
}

/// Maps a `spawn_blocking` join failure to an unavailable source.
pub(crate) fn join_error(kind: SourceKind, e: tokio::task::JoinError) -> SampleError {
    SampleError::unavailable(kind, format!("sampling task join: {}", e))
}
