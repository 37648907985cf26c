//! Run sequencing: request file, then scan → gate → execute → normalize → aggregate for each target.
//!
//! Targets run strictly one after another in declaration order. Every per-target failure becomes a
//! `{ "error": … }` entry in the report; only failing to write the request file aborts the run, and at that point
//! nothing has executed.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use scriptest_core::{GateOutcome, RunReport, SpecError, TargetOutcome, TestSpecification, aggregate};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::editor::SystemEditor;
use super::execute::InterpreterExecutor;
use super::gate;
use super::interfaces::{DecisionPrompt, EditorLauncher, SafetyScanner, ScriptExecutor};
use super::normalize::normalize;
use super::reporter::{Diagnostic, DiagnosticKind, RunReporter};
use super::scan::DetectorScanner;
use crate::config::RunnerConfig;

/// Report text for a target the user cancelled.
pub const CANCELLED_BY_USER: &str = "execution canceled by user";

/// Run-level failure. Per-target failures never surface here.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to serialize test request: {0}")]
    Serialize(#[source] SpecError),

    #[error("failed to write request file {}: {source}", path.display())]
    Artifact {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

// ============================================================================
// Request artifact
// ============================================================================

static ARTIFACT_SEQ: AtomicU64 = AtomicU64::new(0);

/// The serialized request on disk. Removed exactly once: by [`RequestArtifact::remove`], or on drop if the run
/// unwinds early.
#[derive(Debug)]
pub struct RequestArtifact {
    path: PathBuf,
    removed: bool,
}

impl RequestArtifact {
    /// `scriptest_request_<pid>_<millis>_<seq>.json` in `dir`.
    pub fn unique_path(dir: &Path) -> PathBuf {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let seq = ARTIFACT_SEQ.fetch_add(1, Ordering::Relaxed);
        dir.join(format!("scriptest_request_{}_{millis}_{seq}.json", process::id()))
    }

    pub async fn write(dir: &Path, spec: &TestSpecification) -> Result<Self, RunError> {
        let json = spec.to_json_pretty().map_err(RunError::Serialize)?;
        let path = Self::unique_path(dir);
        tokio::fs::write(&path, json).await.map_err(|source| RunError::Artifact {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "request written");
        Ok(Self { path, removed: false })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn remove(mut self) -> io::Result<()> {
        self.removed = true;
        tokio::fs::remove_file(&self.path).await
    }
}

impl Drop for RequestArtifact {
    fn drop(&mut self) {
        if !self.removed {
            self.removed = true;
            if let Err(e) = fs::remove_file(&self.path) {
                warn!(path = %self.path.display(), error = %e, "could not remove request file");
            }
        }
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Drives a [`TestSpecification`] through every target.
pub struct Orchestrator<S, X, P, E, R> {
    scanner: S,
    executor: X,
    prompt: P,
    editor: E,
    reporter: R,
    temp_dir: PathBuf,
}

/// The production wiring: detector and interpreter processes, system editor.
pub type DefaultOrchestrator<P, R> = Orchestrator<DetectorScanner, InterpreterExecutor, P, SystemEditor, R>;

impl<P: DecisionPrompt, R: RunReporter> DefaultOrchestrator<P, R> {
    pub fn from_config(config: &RunnerConfig, prompt: P, reporter: R) -> Self {
        Orchestrator::new(
            DetectorScanner::from_config(config),
            InterpreterExecutor::from_config(config),
            prompt,
            SystemEditor::new(),
            reporter,
        )
        .with_temp_dir(config.temp_dir.clone())
    }
}

impl<S, X, P, E, R> Orchestrator<S, X, P, E, R>
where
    S: SafetyScanner,
    X: ScriptExecutor,
    P: DecisionPrompt,
    E: EditorLauncher,
    R: RunReporter,
{
    pub fn new(scanner: S, executor: X, prompt: P, editor: E, reporter: R) -> Self {
        Self {
            scanner,
            executor,
            prompt,
            editor,
            reporter,
            temp_dir: std::env::temp_dir(),
        }
    }

    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = dir.into();
        self
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn prompt(&self) -> &P {
        &self.prompt
    }

    pub fn into_reporter(self) -> R {
        self.reporter
    }

    pub fn into_prompt(self) -> P {
        self.prompt
    }

    /// Run every target and return the report.
    ///
    /// ## Errors
    /// Only when the request file cannot be written; no target has run in that case.
    #[tracing::instrument(skip_all, fields(function = %spec.function_under_test, targets = spec.targets.len()))]
    pub async fn run(&mut self, spec: &TestSpecification) -> Result<RunReport, RunError> {
        let started = Instant::now();
        let artifact = RequestArtifact::write(&self.temp_dir, spec).await?;
        self.reporter.on_run_start(spec);

        let mut report = RunReport::default();
        for (display_name, path) in spec.targets.iter() {
            self.reporter.on_target_start(display_name, path);
            match self.run_target(artifact.path(), display_name, path).await {
                Some(outcome) => {
                    self.reporter.on_target_complete(display_name, &outcome);
                    report.record(display_name, outcome);
                }
                None => self.reporter.on_target_skipped(display_name),
            }
        }

        let artifact_path = artifact.path().display().to_string();
        if let Err(e) = artifact.remove().await {
            warn!(path = %artifact_path, error = %e, "could not remove request file");
            self.reporter.on_diagnostic(&Diagnostic::new(
                DiagnosticKind::CleanupFailed,
                "",
                format!("could not remove {artifact_path}: {e}"),
            ));
        }

        info!(entries = report.len(), failures = report.has_failures(), "run complete");
        self.reporter.on_run_complete(&report, started.elapsed());
        Ok(report)
    }

    /// `None` when the user skipped the target.
    async fn run_target(&mut self, request: &Path, display_name: &str, path: &Path) -> Option<TargetOutcome> {
        let verdict = self.scanner.scan(path, &mut self.reporter).await;
        self.reporter.on_scan_verdict(display_name, &verdict);

        let gate_outcome = gate::resolve(
            &verdict,
            display_name,
            path,
            &mut self.prompt,
            &self.editor,
            &mut self.reporter,
        )
        .await;
        match gate_outcome {
            GateOutcome::Proceed => {}
            GateOutcome::Skipped => return None,
            GateOutcome::Cancelled => return Some(TargetOutcome::failed(CANCELLED_BY_USER)),
        }

        let raw = match self.executor.execute(request, path, &mut self.reporter).await {
            Ok(raw) => raw,
            Err(e) => return Some(TargetOutcome::failed(e.to_string())),
        };
        debug!(exit_code = ?raw.exit_code, bytes = raw.stdout.len(), "interpreter finished");

        Some(match normalize(&raw.stdout) {
            Ok(records) => TargetOutcome::Completed(aggregate(records)),
            Err(e) => TargetOutcome::failed(e.to_string()),
        })
    }
}
