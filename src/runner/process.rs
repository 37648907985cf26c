//! Child process plumbing shared by the detector and the interpreter.
//!
//! One process per call: stdin is closed, stdout is collected in arrival order, stderr is handed to the caller line by
//! line as it arrives. Both streams are decoded lossily, so stray non-UTF-8 bytes never fail a capture. The exit status is returned but never interpreted here.

use std::ffi::OsStr;
use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::debug;

use crate::config::Invocation;

/// Why a child process produced no usable output.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("{program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("reading process output: {0}")]
    Io(#[from] io::Error),

    #[error("timed out after {}s", .0.as_secs_f64())]
    TimedOut(Duration),
}

/// What a finished child left behind.
#[derive(Debug)]
pub struct ProcessOutput {
    pub stdout: String,
    pub status: ExitStatus,
}

/// Spawn `invocation` with `extra_args` appended and wait for it to exit.
///
/// ## Parameters
/// - `timeout`: kill the child and return [`ProcessError::TimedOut`] if it runs longer than this
/// - `on_stderr`: called once per stderr line, in arrival order
///
/// ## Notes
/// - Stdout is decoded lossily once the child has exited.
pub async fn run_captured(
    invocation: &Invocation,
    extra_args: &[&OsStr],
    timeout: Option<Duration>,
    mut on_stderr: impl FnMut(&str),
) -> Result<ProcessOutput, ProcessError> {
    let mut child = Command::new(&invocation.program)
        .args(&invocation.args)
        .args(extra_args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ProcessError::Spawn {
            program: invocation.program.to_string_lossy().into_owned(),
            source,
        })?;

    debug!(pid = child.id(), command = %invocation.display(), "spawned");

    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| io::Error::other("child stdout was not captured"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| io::Error::other("child stderr was not captured"))?;
    let mut stderr_lines = BufReader::new(stderr).split(b'\n');

    let collect = async {
        let mut out = Vec::new();
        let mut buf = [0u8; 8192];
        let mut stdout_open = true;
        let mut stderr_open = true;

        while stdout_open || stderr_open {
            tokio::select! {
                read = stdout.read(&mut buf), if stdout_open => match read? {
                    0 => stdout_open = false,
                    n => out.extend_from_slice(&buf[..n]),
                },
                line = stderr_lines.next_segment(), if stderr_open => match line? {
                    Some(line) => on_stderr(decode_line(&line).as_ref()),
                    None => stderr_open = false,
                },
            }
        }

        let status = child.wait().await?;
        Ok::<_, io::Error>((out, status))
    };

    let finished = match timeout {
        Some(limit) => tokio::time::timeout(limit, collect).await.ok(),
        None => Some(collect.await),
    };

    match finished {
        Some(result) => {
            let (out, status) = result?;
            debug!(%status, bytes = out.len(), "exited");
            Ok(ProcessOutput {
                stdout: String::from_utf8_lossy(&out).into_owned(),
                status,
            })
        }
        None => {
            let limit = timeout.unwrap_or_default();
            debug!(limit_secs = limit.as_secs_f64(), "timed out, killing");
            if let Err(e) = child.kill().await {
                debug!(error = %e, "kill after timeout failed");
            }
            Err(ProcessError::TimedOut(limit))
        }
    }
}

/// Lossy decode of one stderr line, without its trailing `\r`.
fn decode_line(line: &[u8]) -> std::borrow::Cow<'_, str> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line)
}
