//! Interpreter harness execution
//!
//! One process per (request, target): `<interpreter> [args…] <request> <target>`. Stdout is the raw result text;
//! stderr lines become diagnostics and are never parsed.

use std::path::Path;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use super::interfaces::ScriptExecutor;
use super::process::{self, ProcessError};
use super::reporter::{Diagnostic, DiagnosticKind, RunReporter};
use crate::config::{Invocation, RunnerConfig};

/// Why a target produced no output to normalize. Fatal for that target only.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("Failed to start interpreter process: {0}")]
    Spawn(String),

    #[error("Failed to read interpreter output: {0}")]
    Io(#[source] std::io::Error),

    #[error("Interpreter process timed out after {}s", .0.as_secs_f64())]
    TimedOut(Duration),
}

impl From<ProcessError> for ExecError {
    fn from(err: ProcessError) -> Self {
        match err {
            ProcessError::Spawn { .. } => ExecError::Spawn(err.to_string()),
            ProcessError::Io(e) => ExecError::Io(e),
            ProcessError::TimedOut(limit) => ExecError::TimedOut(limit),
        }
    }
}

/// Stdout of a finished interpreter process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawOutput {
    pub stdout: String,
    /// Exit code, for logging only; `None` when killed by a signal
    pub exit_code: Option<i32>,
}

/// Runs the interpreter harness configured in [`RunnerConfig::interpreter`].
#[derive(Debug, Clone)]
pub struct InterpreterExecutor {
    invocation: Invocation,
    timeout: Option<Duration>,
}

impl InterpreterExecutor {
    pub fn new(invocation: Invocation, timeout: Option<Duration>) -> Self {
        Self { invocation, timeout }
    }

    pub fn from_config(config: &RunnerConfig) -> Self {
        Self::new(config.interpreter.clone(), config.timeout)
    }
}

impl ScriptExecutor for InterpreterExecutor {
    #[tracing::instrument(skip_all, fields(script = %target.display()))]
    async fn execute(
        &self,
        request: &Path,
        target: &Path,
        reporter: &mut dyn RunReporter,
    ) -> Result<RawOutput, ExecError> {
        let target_name = target.display().to_string();
        let output = process::run_captured(
            &self.invocation,
            &[request.as_os_str(), target.as_os_str()],
            self.timeout,
            |line| {
                warn!(script = %target_name, "{line}");
                reporter.on_diagnostic(&Diagnostic::new(DiagnosticKind::ScriptStderr, target_name.as_str(), line));
            },
        )
        .await?;

        Ok(RawOutput {
            stdout: output.stdout,
            exit_code: output.status.code(),
        })
    }
}
