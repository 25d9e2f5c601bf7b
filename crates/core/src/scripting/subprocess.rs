//! Spawn a child process, feed it JSON, collect its output.
//!
//! Stdin is fed and stdout/stderr are drained on their own tasks, so a
//! child that never reads its input or floods its output cannot stall the
//! run past [`CommandInput::timeout`].

use std::process::Stdio;
use std::time::Instant;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{ChildStdin, Command};
use tokio::task::JoinHandle;

use super::command::{CommandError, CommandInput, CommandOutput};

/// Bytes kept per stream; anything beyond is read and discarded.
const MAX_CAPTURE_BYTES: usize = 10 * 1024 * 1024;

const READ_CHUNK: usize = 64 * 1024;

/// Run `cmd` to completion under the input's timeout.
///
/// The caller sets the program and arguments. A non-zero exit is reported
/// in [`CommandOutput::exit_code`], not as an error. On timeout the child
/// is killed.
pub async fn run_command(
    cmd: &mut Command,
    input: CommandInput,
) -> Result<CommandOutput, CommandError> {
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .envs(input.env_vars.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    if let Some(dir) = &input.working_directory {
        cmd.current_dir(dir);
    }

    let started = Instant::now();
    let mut child = cmd.spawn()?;

    let stdout = tokio::spawn(capture(child.stdout.take()));
    let stderr = tokio::spawn(capture(child.stderr.take()));
    let feeder = child.stdin.take().map(|pipe| {
        let payload = serde_json::to_vec(&input.stdin).unwrap_or_default();
        tokio::spawn(feed(pipe, payload))
    });

    let waited = tokio::time::timeout(input.timeout, child.wait()).await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    if let Some(feeder) = feeder {
        feeder.abort();
    }

    let status = match waited {
        Ok(Ok(status)) => status,
        Ok(Err(e)) => {
            abort_all(&[&stdout, &stderr]);
            return Err(CommandError::Spawn(e));
        }
        Err(_) => {
            if let Err(e) = child.start_kill() {
                tracing::warn!(error = %e, "Failed to kill timed-out child");
            }
            abort_all(&[&stdout, &stderr]);
            return Err(CommandError::Timeout { elapsed_ms });
        }
    };

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&stdout.await.unwrap_or_default()).into_owned(),
        stderr: String::from_utf8_lossy(&stderr.await.unwrap_or_default()).into_owned(),
        exit_code: status.code().unwrap_or(-1),
        duration_ms: elapsed_ms,
    })
}

/// Write `payload` and close the pipe. A child that exits early just
/// closes its end; that is not an error.
async fn feed(mut pipe: ChildStdin, payload: Vec<u8>) {
    if let Err(e) = pipe.write_all(&payload).await {
        tracing::debug!(error = %e, "Child closed stdin before reading all input");
    }
}

/// Read a stream to EOF, keeping at most [`MAX_CAPTURE_BYTES`].
async fn capture<R: AsyncRead + Unpin>(stream: Option<R>) -> Vec<u8> {
    let Some(mut stream) = stream else {
        return Vec::new();
    };
    let mut kept = Vec::new();
    let mut chunk = vec![0u8; READ_CHUNK];
    loop {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                let room = MAX_CAPTURE_BYTES.saturating_sub(kept.len());
                kept.extend_from_slice(&chunk[..n.min(room)]);
            }
        }
    }
    kept
}

fn abort_all(tasks: &[&JoinHandle<Vec<u8>>]) {
    for task in tasks {
        task.abort();
    }
}
