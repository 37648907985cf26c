//! Advisory safety scan
//!
//! Runs `<detector> [args…] <target>` and looks for the warning marker in its stdout. The exit status is not
//! inspected. A detector that cannot run never blocks execution; it produces [`ScanVerdict::ScanFailed`].

use std::path::Path;
use std::time::Duration;

use scriptest_core::ScanVerdict;
use thiserror::Error;
use tracing::{debug, warn};

use super::interfaces::SafetyScanner;
use super::process::{self, ProcessError};
use super::reporter::{Diagnostic, DiagnosticKind, RunReporter};
use crate::config::{Invocation, RunnerConfig};

/// The detector could not produce a verdict.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Failed to start detector process: {0}")]
    Spawn(String),

    #[error("Failed to read detector output: {0}")]
    Io(#[source] std::io::Error),

    #[error("Detector timed out after {}s", .0.as_secs_f64())]
    TimedOut(Duration),
}

impl From<ProcessError> for ScanError {
    fn from(err: ProcessError) -> Self {
        match err {
            ProcessError::Spawn { .. } => ScanError::Spawn(err.to_string()),
            ProcessError::Io(e) => ScanError::Io(e),
            ProcessError::TimedOut(limit) => ScanError::TimedOut(limit),
        }
    }
}

/// Verdict for detector output: suspicious iff it contains `marker`.
pub fn classify(output: &str, marker: &str) -> ScanVerdict {
    if !marker.is_empty() && output.contains(marker) {
        ScanVerdict::Suspicious {
            reasons: output.trim_end().to_string(),
        }
    } else {
        ScanVerdict::Clean
    }
}

/// Scanner backed by the detector script.
#[derive(Debug, Clone)]
pub struct DetectorScanner {
    invocation: Invocation,
    warning_marker: String,
    timeout: Option<Duration>,
    enabled: bool,
}

impl DetectorScanner {
    pub fn new(invocation: Invocation, warning_marker: impl Into<String>) -> Self {
        Self {
            invocation,
            warning_marker: warning_marker.into(),
            timeout: None,
            enabled: true,
        }
    }

    pub fn from_config(config: &RunnerConfig) -> Self {
        Self::new(config.detector.clone(), config.warning_marker.clone())
            .with_timeout(config.timeout)
            .with_enabled(config.scan_enabled)
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// A disabled scanner reports every target as clean without spawning anything.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Run the detector and classify its output.
    pub async fn try_scan(&self, target: &Path, reporter: &mut dyn RunReporter) -> Result<ScanVerdict, ScanError> {
        let target_name = target.display().to_string();
        let output = process::run_captured(&self.invocation, &[target.as_os_str()], self.timeout, |line| {
            debug!(script = %target_name, "detector: {line}");
            reporter.on_diagnostic(&Diagnostic::new(DiagnosticKind::DetectorStderr, target_name.as_str(), line));
        })
        .await?;
        Ok(classify(&output.stdout, &self.warning_marker))
    }
}

impl SafetyScanner for DetectorScanner {
    #[tracing::instrument(skip_all, fields(script = %target.display()))]
    async fn scan(&self, target: &Path, reporter: &mut dyn RunReporter) -> ScanVerdict {
        if !self.enabled {
            debug!("scan disabled");
            return ScanVerdict::Clean;
        }

        match self.try_scan(target, reporter).await {
            Ok(verdict) => {
                debug!(?verdict, "scanned");
                verdict
            }
            Err(e) => {
                let reason = e.to_string();
                warn!(%reason, "scan failed, running target anyway");
                reporter.on_diagnostic(&Diagnostic::new(
                    DiagnosticKind::ScanFailed,
                    target.display().to_string(),
                    reason.as_str(),
                ));
                ScanVerdict::ScanFailed { reason }
            }
        }
    }
}
