//! Progress and diagnostics side-channel (pytest-style console output by default)
//!
//! ## RunReporter Trait
//!
//! The orchestrator reports through a `RunReporter` so presentation stays out of the pipeline. Every callback except
//! completion has a no-op default.
//!
//! Diagnostics are non-fatal: interpreter and detector stderr lines, scan failures, editor launch failures and request
//! file cleanup failures. They never change an outcome.

use std::fmt;
use std::io::{IsTerminal, Write};
use std::path::Path;
use std::time::Duration;

use scriptest_core::{RunReport, ScanVerdict, TargetOutcome, TestSpecification};

// ============================================================================
// Diagnostics
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A line the interpreter wrote to stderr
    ScriptStderr,
    /// A line the detector wrote to stderr
    DetectorStderr,
    /// The detector could not run; the target runs anyway
    ScanFailed,
    /// The editor could not be launched
    EditorFailed,
    /// The request file could not be removed
    CleanupFailed,
}

impl DiagnosticKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticKind::ScriptStderr => "stderr",
            DiagnosticKind::DetectorStderr => "detector stderr",
            DiagnosticKind::ScanFailed => "scan failed",
            DiagnosticKind::EditorFailed => "editor",
            DiagnosticKind::CleanupFailed => "cleanup",
        }
    }

    /// Stderr chatter is expected; everything else deserves attention.
    pub fn is_warning(self) -> bool {
        !matches!(self, DiagnosticKind::ScriptStderr | DiagnosticKind::DetectorStderr)
    }
}

/// A non-fatal message about one target (or the run, when `target` is empty).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub target: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            target: target.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.target.is_empty() {
            write!(f, "[{}] {}", self.kind.as_str(), self.message)
        } else {
            write!(f, "[{}] {}: {}", self.kind.as_str(), self.target, self.message)
        }
    }
}

// ============================================================================
// Reporter Trait
// ============================================================================

/// Trait for reporting run progress.
///
/// Implement this trait to customize output (JSON, GUI events, etc.)
pub trait RunReporter {
    /// Called once the request file is written, before the first target
    fn on_run_start(&mut self, _spec: &TestSpecification) {}

    /// Called before a target is scanned
    fn on_target_start(&mut self, _display_name: &str, _path: &Path) {}

    /// Called with the scan verdict of a target
    fn on_scan_verdict(&mut self, _display_name: &str, _verdict: &ScanVerdict) {}

    /// Called when the user chose to skip a target (it gets no report entry)
    fn on_target_skipped(&mut self, _display_name: &str) {}

    /// Called with each non-fatal diagnostic
    fn on_diagnostic(&mut self, _diagnostic: &Diagnostic) {}

    /// Called when a target has an outcome
    fn on_target_complete(&mut self, display_name: &str, outcome: &TargetOutcome);

    /// Called when all targets are done
    fn on_run_complete(&mut self, report: &RunReport, duration: Duration);
}

/// Reporter that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl RunReporter for NullReporter {
    fn on_target_complete(&mut self, _display_name: &str, _outcome: &TargetOutcome) {}

    fn on_run_complete(&mut self, _report: &RunReport, _duration: Duration) {}
}

// ============================================================================
// Console Reporter
// ============================================================================

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Default console reporter (pytest-style)
pub struct ConsoleReporter<W: Write> {
    out: W,
    pub verbose: bool,
    pub color: bool,
    skipped: usize,
}

impl ConsoleReporter<std::io::Stderr> {
    /// Output on stderr, so stdout stays free for `--json`. Colored when stderr is a terminal.
    pub fn stderr(verbose: bool) -> Self {
        let color = std::io::stderr().is_terminal();
        Self::new(std::io::stderr(), verbose, color)
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W, verbose: bool, color: bool) -> Self {
        Self {
            out,
            verbose,
            color,
            skipped: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.color {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    // Console output is best-effort; a closed stderr must not fail the run.
    fn line(&mut self, text: &str) {
        let _ = writeln!(self.out, "{text}");
    }
}

impl<W: Write> RunReporter for ConsoleReporter<W> {
    fn on_run_start(&mut self, spec: &TestSpecification) {
        self.skipped = 0;
        let banner = self.paint(BOLD, "=================== scriptest session starts ===================");
        self.line(&banner);
        self.line(&format!(
            "function {}: {} case(s) x {} target(s)",
            spec.function_under_test,
            spec.cases().len(),
            spec.targets.len()
        ));
        self.line("");
    }

    fn on_target_start(&mut self, display_name: &str, path: &Path) {
        if self.verbose {
            self.line(&format!("{display_name} ({})", path.display()));
        }
    }

    fn on_scan_verdict(&mut self, display_name: &str, verdict: &ScanVerdict) {
        if let ScanVerdict::Suspicious { reasons } = verdict {
            let flagged = self.paint(YELLOW, "flagged by safety scan");
            self.line(&format!("{display_name}: {flagged}"));
            if self.verbose {
                for reason in reasons.lines().filter(|l| !l.trim().is_empty()) {
                    self.line(&format!("    {reason}"));
                }
            }
        }
    }

    fn on_target_skipped(&mut self, display_name: &str) {
        self.skipped += 1;
        let status = self.paint(YELLOW, "SKIPPED");
        self.line(&format!("{display_name} {status}"));
    }

    fn on_diagnostic(&mut self, diagnostic: &Diagnostic) {
        if diagnostic.kind.is_warning() {
            let label = self.paint(YELLOW, "warning");
            self.line(&format!("{label}: {diagnostic}"));
        } else if self.verbose {
            self.line(&format!("    {diagnostic}"));
        }
    }

    fn on_target_complete(&mut self, display_name: &str, outcome: &TargetOutcome) {
        let result = match outcome {
            TargetOutcome::Failed { error } => {
                let status = self.paint(RED, "ERROR");
                self.line(&format!("{display_name} {status}: {error}"));
                return;
            }
            TargetOutcome::Completed(result) => result,
        };

        if self.verbose {
            self.line(display_name);
            for record in &result.results {
                let status = if record.passed() {
                    self.paint(GREEN, "PASSED")
                } else {
                    self.paint(RED, "FAILED")
                };
                let received = record.received().unwrap_or_default();
                self.line(&format!("    {status} {}  (received {received})", record.test()));
            }
        } else {
            let marks: String = result
                .results
                .iter()
                .map(|r| if r.passed() { self.paint(GREEN, ".") } else { self.paint(RED, "F") })
                .collect();
            self.line(&format!("{display_name} {marks}"));
        }

        // Print failure details
        for record in result.results.iter().filter(|r| !r.passed()) {
            let test = self.paint(RED, record.test());
            self.line(&format!("    {test}: {}", record.error().unwrap_or_default()));
        }
    }

    fn on_run_complete(&mut self, report: &RunReport, duration: Duration) {
        let totals = report.totals();
        let errors = report.iter().filter(|(_, o)| o.error().is_some()).count();

        let mut parts = Vec::new();
        if totals.passed > 0 {
            parts.push(self.paint(GREEN, &format!("{} passed", totals.passed)));
        }
        if totals.failed > 0 {
            parts.push(self.paint(RED, &format!("{} failed", totals.failed)));
        }
        if errors > 0 {
            parts.push(self.paint(RED, &format!("{errors} error(s)")));
        }
        if self.skipped > 0 {
            parts.push(self.paint(YELLOW, &format!("{} skipped", self.skipped)));
        }
        if parts.is_empty() {
            parts.push("no tests ran".to_string());
        }

        self.line("");
        self.line(&format!(
            "====== {} in {:.2}s ======",
            parts.join(", "),
            duration.as_secs_f64()
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptest_core::{TestRecord, aggregate};

    fn render(run: impl FnOnce(&mut ConsoleReporter<Vec<u8>>)) -> String {
        let mut reporter = ConsoleReporter::new(Vec::new(), false, false);
        run(&mut reporter);
        String::from_utf8(reporter.into_inner()).unwrap()
    }

    fn sample_outcome() -> TargetOutcome {
        TargetOutcome::Completed(aggregate(vec![
            TestRecord::pass("(3,)", Some("9".into())),
            TestRecord::fail("(4,)", Some("15".into()), Some("expected 16".into())),
        ]))
    }

    #[test]
    fn test_completed_target_shows_marks_and_failures() {
        let out = render(|r| r.on_target_complete("square.py", &sample_outcome()));
        insta::assert_snapshot!(out.trim_end(), @r"
        square.py .F
            (4,): expected 16
        ");
    }

    #[test]
    fn test_failed_target_shows_error() {
        let out = render(|r| r.on_target_complete("bad.py", &TargetOutcome::failed("execution canceled by user")));
        assert_eq!(out, "bad.py ERROR: execution canceled by user\n");
    }

    #[test]
    fn test_summary_line_counts() {
        let mut report = RunReport::default();
        report.record("square.py", sample_outcome());
        report.record("bad.py", TargetOutcome::failed("boom"));
        let out = render(|r| {
            r.on_target_skipped("skipped.py");
            r.on_run_complete(&report, Duration::from_millis(1500));
        });
        assert!(out.ends_with("====== 1 passed, 1 failed, 1 error(s), 1 skipped in 1.50s ======\n"));
    }

    #[test]
    fn test_stderr_diagnostics_hidden_unless_verbose() {
        let diag = Diagnostic::new(DiagnosticKind::ScriptStderr, "a.py", "Traceback");
        assert_eq!(render(|r| r.on_diagnostic(&diag)), "");

        let warning = Diagnostic::new(DiagnosticKind::ScanFailed, "a.py", "detector missing");
        assert_eq!(
            render(|r| r.on_diagnostic(&warning)),
            "warning: [scan failed] a.py: detector missing\n"
        );
    }

    #[test]
    fn test_color_codes_only_when_enabled() {
        let mut reporter = ConsoleReporter::new(Vec::new(), false, true);
        reporter.on_target_skipped("x.py");
        let out = String::from_utf8(reporter.into_inner()).unwrap();
        assert!(out.contains("\x1b[33mSKIPPED\x1b[0m"));
    }
}
