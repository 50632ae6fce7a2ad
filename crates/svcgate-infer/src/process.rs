use crate::InferenceError;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Run a child to completion, killing it if `limit` elapses first.
pub(crate) async fn run_to_completion(
    mut cmd: Command,
    limit: Option<Duration>,
    label: &str,
) -> Result<Output, InferenceError> {
    let program = cmd.as_std().get_program().to_string_lossy().into_owned();

    cmd.stdin(Stdio::null()).kill_on_drop(true);

    let pending = cmd.output();
    let result = match limit {
        Some(limit) => tokio::time::timeout(limit, pending)
            .await
            .map_err(|_| InferenceError::Timeout(limit))?,
        None => pending.await,
    };
    let output = result.map_err(|source| InferenceError::Spawn { program, source })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    if !stdout.is_empty() {
        debug!("{} stdout: {}", label, stdout);
    }
    if !stderr.is_empty() {
        debug!("{} stderr: {}", label, stderr);
    }

    Ok(output)
}
