// Bounded subprocess runner for command-line samplers.

use std::time::Duration;

use tokio::process::Command;

use crate::error::SampleError;
use crate::models::SourceKind;

/// Runs `program args..` and returns its stdout. The child is killed when the
/// timeout expires, so a hung command never blocks the sampling loop.
pub async fn run(
    kind: SourceKind,
    program: &str,
    args: &[&str],
    timeout: Duration,
) -> Result<String, SampleError> {
    let mut cmd = Command::new(program);
    cmd.args(args).kill_on_drop(true);

    let output = match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(out)) => out,
        Ok(Err(e)) => {
            return Err(SampleError::unavailable(
                kind,
                format!("failed to run {}: {}", program, e),
            ));
        }
        Err(_) => {
            return Err(SampleError::Timeout {
                kind,
                after: timeout,
            });
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SampleError::unavailable(
            kind,
            format!("{} exited with {}: {}", program, output.status, stderr.trim()),
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
