//! End-to-end runs against fake detector and interpreter processes.
//!
//! The fake interpreter prints the target file's contents (minus `#` directive lines), so each target file is the
//! harness output for that script. Directives: `#sleep` hangs, `#stderr` writes a line to stderr. The fake detector
//! flags any target containing `DANGER`.
#![cfg(unix)]

use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use scriptest::runner::{
    CANCELLED_BY_USER, ChannelPrompt, DecisionPrompt, Diagnostic, DiagnosticKind, DetectorScanner, EditorLauncher,
    FixedPrompt, InterpreterExecutor, Orchestrator, RunReporter, ScriptedPrompt,
};
use scriptest::{
    Expected, Invocation, Param, ParamList, ParamType, RunReport, RunnerConfig, ScanVerdict, TargetOutcome,
    TestSpecification, UserDecision,
};
use tempfile::TempDir;

const FAKE_INTERPRETER: &str = r#"
test -f "$1" || { echo "{'error': 'request file missing'}"; exit 0; }
grep -q '^#stderr' "$2" && echo 'harness noise' >&2
grep -q '^#sleep' "$2" && sleep 10
grep -v '^#' "$2"
exit 0
"#;

const FAKE_DETECTOR: &str = r#"grep -q DANGER "$1" && echo "Warning: dangerous call in $1"; exit 0"#;

const PASS_AND_FAIL: &str =
    "[{'test': \"(['3', 'int'],)\", 'passed': True, 'received': 9}, \
     {'test': \"(['4', 'int'],)\", 'passed': False, 'received': 15, 'error': 'expected 16, got 15'}]";

const ALL_PASS: &str = "[{'test': \"(['3', 'int'],)\", 'passed': True, 'received': 9}]";

// ============================================================================
// Fixture
// ============================================================================

struct Fixture {
    scripts: TempDir,
    scratch: TempDir,
    config: RunnerConfig,
}

impl Fixture {
    fn new() -> Self {
        let scratch = tempfile::tempdir().unwrap();
        let config = RunnerConfig::default()
            .with_interpreter(sh(FAKE_INTERPRETER))
            .with_detector(sh(FAKE_DETECTOR))
            .with_temp_dir(scratch.path());
        Self {
            scripts: tempfile::tempdir().unwrap(),
            scratch,
            config,
        }
    }

    fn with_config(mut self, f: impl FnOnce(RunnerConfig) -> RunnerConfig) -> Self {
        self.config = f(self.config);
        self
    }

    /// Create a target whose fake harness output is `output`.
    fn target(&self, name: &str, output: &str) -> PathBuf {
        let path = self.scripts.path().join(name);
        fs::write(&path, output).unwrap();
        path
    }

    fn spec(&self, targets: &[&PathBuf]) -> TestSpecification {
        let mut spec = TestSpecification::new("square")
            .with_case(
                ParamList::new(vec![Param::new("3", ParamType::Int)]),
                Expected::new("9", ParamType::Int),
            )
            .with_case(
                ParamList::new(vec![Param::new("4", ParamType::Int)]),
                Expected::new("16", ParamType::Int),
            );
        for target in targets {
            spec.targets.add(target.as_path()).unwrap();
        }
        spec
    }

    async fn run<P: DecisionPrompt>(
        &self,
        spec: &TestSpecification,
        prompt: P,
        editor: &RecordingEditor,
    ) -> (RunReport, Events, P) {
        let events = Events::default();
        let mut orchestrator = Orchestrator::new(
            DetectorScanner::from_config(&self.config),
            InterpreterExecutor::from_config(&self.config),
            prompt,
            editor.clone(),
            RecordingReporter(events.clone()),
        )
        .with_temp_dir(self.scratch.path());
        let report = orchestrator.run(spec).await.unwrap();
        assert_no_artifacts(self.scratch.path());
        (report, events, orchestrator.into_prompt())
    }
}

fn sh(script: &str) -> Invocation {
    Invocation::new("sh").arg("-c").arg(script).arg("sh")
}

fn assert_no_artifacts(dir: &Path) {
    let leftovers: Vec<_> = fs::read_dir(dir).unwrap().map(|e| e.unwrap().path()).collect();
    assert!(leftovers.is_empty(), "request file left behind: {leftovers:?}");
}

// ============================================================================
// Recording seams
// ============================================================================

type Events = Rc<RefCell<Vec<String>>>;

struct RecordingReporter(Events);

impl RecordingReporter {
    fn push(&self, event: String) {
        self.0.borrow_mut().push(event);
    }
}

impl RunReporter for RecordingReporter {
    fn on_run_start(&mut self, spec: &TestSpecification) {
        self.push(format!("start {}", spec.targets.len()));
    }

    fn on_scan_verdict(&mut self, display_name: &str, verdict: &ScanVerdict) {
        let verdict = match verdict {
            ScanVerdict::Clean => "clean",
            ScanVerdict::Suspicious { .. } => "suspicious",
            ScanVerdict::ScanFailed { .. } => "scan-failed",
        };
        self.push(format!("scan {display_name} {verdict}"));
    }

    fn on_target_skipped(&mut self, display_name: &str) {
        self.push(format!("skipped {display_name}"));
    }

    fn on_diagnostic(&mut self, diagnostic: &Diagnostic) {
        self.push(format!("diagnostic {}", diagnostic.kind.as_str()));
    }

    fn on_target_complete(&mut self, display_name: &str, outcome: &TargetOutcome) {
        let status = if outcome.error().is_some() { "error" } else { "done" };
        self.push(format!("{status} {display_name}"));
    }

    fn on_run_complete(&mut self, report: &RunReport, _duration: Duration) {
        self.push(format!("complete {}", report.len()));
    }
}

#[derive(Clone, Default)]
struct RecordingEditor {
    opened: Rc<RefCell<Vec<PathBuf>>>,
}

impl EditorLauncher for RecordingEditor {
    fn open(&self, path: &Path) -> io::Result<()> {
        self.opened.borrow_mut().push(path.to_path_buf());
        Ok(())
    }
}

fn events(events: &Events) -> Vec<String> {
    events.borrow().clone()
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_clean_run_reports_every_target() {
    let fx = Fixture::new();
    let alice = fx.target("alice.py", PASS_AND_FAIL);
    let bob = fx.target("bob.py", ALL_PASS);
    let spec = fx.spec(&[&alice, &bob]);

    let (report, log, _) = fx.run(&spec, FixedPrompt::cancel(), &RecordingEditor::default()).await;

    assert_eq!(report.len(), 2);
    let alice = report.get("alice.py").unwrap().as_completed().unwrap();
    assert_eq!((alice.summary.total, alice.summary.passed, alice.summary.failed), (2, 1, 1));
    assert_eq!(alice.results[1].error(), Some("expected 16, got 15"));
    assert_eq!(alice.results[1].received(), Some("15"));
    let bob = report.get("bob.py").unwrap().as_completed().unwrap();
    assert_eq!(bob.summary.pass_rate(), 100);

    assert_eq!(
        events(&log),
        vec![
            "start 2",
            "scan alice.py clean",
            "done alice.py",
            "scan bob.py clean",
            "done bob.py",
            "complete 2",
        ]
    );
}

#[tokio::test]
async fn test_report_json_shape() {
    let fx = Fixture::new();
    let bob = fx.target("bob.py", ALL_PASS);
    let broken = fx.target("broken.py", "{'error': 'NameError: square'}");
    let spec = fx.spec(&[&bob, &broken]);

    let (report, _, _) = fx.run(&spec, FixedPrompt::cancel(), &RecordingEditor::default()).await;

    assert_eq!(
        serde_json::to_value(&report).unwrap(),
        serde_json::json!({
            "bob.py": {
                "results": [
                    {"test": "(['3', 'int'],)", "passed": true, "received": "9", "error": null}
                ],
                "summary": {"total": 1, "passed": 1, "failed": 0}
            },
            "broken.py": {"error": "Error: NameError: square"}
        })
    );
}

#[tokio::test]
async fn test_malformed_output_fails_only_that_target() {
    let fx = Fixture::new();
    let crashed = fx.target("crashed.py", "Traceback (most recent call last):\n  File \"x\", line 1\n");
    let fine = fx.target("fine.py", ALL_PASS);
    let spec = fx.spec(&[&crashed, &fine]);

    let (report, _, _) = fx.run(&spec, FixedPrompt::cancel(), &RecordingEditor::default()).await;

    let error = report.get("crashed.py").unwrap().error().unwrap();
    assert!(error.starts_with("Failed to parse interpreter output: "), "{error}");
    assert!(report.get("fine.py").unwrap().as_completed().is_some());
    assert!(report.has_failures());
}

#[tokio::test]
async fn test_cancel_then_continue() {
    let fx = Fixture::new();
    let risky = fx.target("risky.py", &format!("#DANGER\n{ALL_PASS}"));
    let fine = fx.target("fine.py", ALL_PASS);
    let spec = fx.spec(&[&risky, &fine]);

    let (report, log, prompt) = fx
        .run(&spec, ScriptedPrompt::new([UserDecision::Cancel]), &RecordingEditor::default())
        .await;

    assert_eq!(report.get("risky.py").unwrap().error(), Some(CANCELLED_BY_USER));
    assert!(report.get("fine.py").unwrap().as_completed().is_some());
    assert_eq!(prompt.asked.len(), 1);
    assert_eq!(prompt.asked[0].display_name, "risky.py");
    assert!(prompt.asked[0].reasons.starts_with("Warning: dangerous call in "));
    assert!(events(&log).contains(&"scan risky.py suspicious".to_string()));
}

#[tokio::test]
async fn test_skip_leaves_no_entry() {
    let fx = Fixture::new();
    let risky = fx.target("risky.py", &format!("#DANGER\n{ALL_PASS}"));
    let fine = fx.target("fine.py", ALL_PASS);
    let spec = fx.spec(&[&risky, &fine]);

    let (report, log, _) = fx.run(&spec, FixedPrompt::skip(), &RecordingEditor::default()).await;

    assert_eq!(report.len(), 1);
    assert!(report.get("risky.py").is_none());
    assert!(events(&log).contains(&"skipped risky.py".to_string()));
    assert!(!report.has_failures());
}

#[tokio::test]
async fn test_run_anyway_executes_flagged_target() {
    let fx = Fixture::new();
    let risky = fx.target("risky.py", &format!("#DANGER\n{ALL_PASS}"));
    let spec = fx.spec(&[&risky]);

    let (report, _, _) = fx.run(&spec, FixedPrompt::run_anyway(), &RecordingEditor::default()).await;

    assert_eq!(report.get("risky.py").unwrap().as_completed().unwrap().summary.passed, 1);
}

#[tokio::test]
async fn test_open_and_reask_loops_until_terminal_choice() {
    let fx = Fixture::new();
    let risky = fx.target("risky.py", &format!("#DANGER\n{ALL_PASS}"));
    let spec = fx.spec(&[&risky]);
    let editor = RecordingEditor::default();

    let prompt = ScriptedPrompt::new([
        UserDecision::OpenAndReask,
        UserDecision::OpenAndReask,
        UserDecision::RunAnyway,
    ]);
    let (report, _, prompt) = fx.run(&spec, prompt, &editor).await;

    assert_eq!(prompt.asked.len(), 3);
    assert_eq!(*editor.opened.borrow(), vec![risky.clone(), risky]);
    assert!(report.get("risky.py").unwrap().as_completed().is_some());
}

#[tokio::test]
async fn test_scan_failure_passes_through_with_diagnostic() {
    let fx = Fixture::new().with_config(|c| c.with_detector(Invocation::new("/nonexistent/detector")));
    let target = fx.target("solution.py", ALL_PASS);
    let spec = fx.spec(&[&target]);

    let (report, log, prompt) = fx.run(&spec, ScriptedPrompt::default(), &RecordingEditor::default()).await;

    assert!(report.get("solution.py").unwrap().as_completed().is_some());
    assert!(prompt.asked.is_empty());
    let log = events(&log);
    assert!(log.contains(&format!("diagnostic {}", DiagnosticKind::ScanFailed.as_str())));
    assert!(log.contains(&"scan solution.py scan-failed".to_string()));
}

#[tokio::test]
async fn test_disabled_scan_never_asks() {
    let fx = Fixture::new().with_config(|c| c.with_scan(false));
    let risky = fx.target("risky.py", &format!("#DANGER\n{ALL_PASS}"));
    let spec = fx.spec(&[&risky]);

    let (report, _, prompt) = fx.run(&spec, ScriptedPrompt::default(), &RecordingEditor::default()).await;

    assert!(prompt.asked.is_empty());
    assert!(report.get("risky.py").unwrap().as_completed().is_some());
}

#[tokio::test]
async fn test_spawn_failure_is_a_target_error() {
    let fx = Fixture::new().with_config(|c| c.with_interpreter(Invocation::new("/nonexistent/python")));
    let a = fx.target("a.py", ALL_PASS);
    let b = fx.target("b.py", ALL_PASS);
    let spec = fx.spec(&[&a, &b]);

    let (report, _, _) = fx.run(&spec, FixedPrompt::cancel(), &RecordingEditor::default()).await;

    assert_eq!(report.len(), 2);
    for (_, outcome) in report.iter() {
        let error = outcome.error().unwrap();
        assert!(error.starts_with("Failed to start interpreter process: "), "{error}");
    }
}

#[tokio::test]
async fn test_script_reported_error() {
    let fx = Fixture::new();
    let target = fx.target("solution.py", "{'error': \"name 'square' is not defined\"}");
    let spec = fx.spec(&[&target]);

    let (report, _, _) = fx.run(&spec, FixedPrompt::cancel(), &RecordingEditor::default()).await;

    assert_eq!(
        report.get("solution.py").unwrap().error(),
        Some("Error: name 'square' is not defined")
    );
}

#[tokio::test]
async fn test_timeout_kills_the_interpreter() {
    let fx = Fixture::new().with_config(|c| c.with_timeout(Some(Duration::from_millis(200))));
    let slow = fx.target("slow.py", &format!("#sleep\n{ALL_PASS}"));
    let fast = fx.target("fast.py", ALL_PASS);
    let spec = fx.spec(&[&slow, &fast]);

    let started = std::time::Instant::now();
    let (report, _, _) = fx.run(&spec, FixedPrompt::cancel(), &RecordingEditor::default()).await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(
        report.get("slow.py").unwrap().error(),
        Some("Interpreter process timed out after 0.2s")
    );
    assert!(report.get("fast.py").unwrap().as_completed().is_some());
}

#[tokio::test]
async fn test_stderr_becomes_diagnostic_not_output() {
    let fx = Fixture::new();
    let noisy = fx.target("noisy.py", &format!("#stderr\n{ALL_PASS}"));
    let spec = fx.spec(&[&noisy]);

    let (report, log, _) = fx.run(&spec, FixedPrompt::cancel(), &RecordingEditor::default()).await;

    assert!(report.get("noisy.py").unwrap().as_completed().is_some());
    assert!(events(&log).contains(&format!("diagnostic {}", DiagnosticKind::ScriptStderr.as_str())));
}

#[tokio::test]
async fn test_binary_detector_stderr_still_reaches_the_prompt() {
    let noisy_detector = format!(r"printf '\377\376 locale noise\n' >&2; {FAKE_DETECTOR}");
    let fx = Fixture::new().with_config(|c| c.with_detector(sh(&noisy_detector)));
    let risky = fx.target("risky.py", &format!("#DANGER\n{ALL_PASS}"));
    let spec = fx.spec(&[&risky]);

    let (report, log, prompt) = fx
        .run(&spec, ScriptedPrompt::new([UserDecision::Cancel]), &RecordingEditor::default())
        .await;

    assert_eq!(prompt.asked.len(), 1);
    assert_eq!(report.get("risky.py").unwrap().error(), Some(CANCELLED_BY_USER));
    assert!(events(&log).contains(&"scan risky.py suspicious".to_string()));
}

#[tokio::test]
async fn test_binary_interpreter_stderr_is_only_a_diagnostic() {
    let noisy_interpreter = format!(r"printf '\377 bad byte\n' >&2; {FAKE_INTERPRETER}");
    let fx = Fixture::new().with_config(|c| c.with_interpreter(sh(&noisy_interpreter)));
    let target = fx.target("solution.py", ALL_PASS);
    let spec = fx.spec(&[&target]);

    let (report, log, _) = fx.run(&spec, FixedPrompt::cancel(), &RecordingEditor::default()).await;

    assert_eq!(report.get("solution.py").unwrap().as_completed().unwrap().summary.passed, 1);
    assert!(events(&log).contains(&format!("diagnostic {}", DiagnosticKind::ScriptStderr.as_str())));
}

#[tokio::test]
async fn test_empty_spec_runs_nothing() {
    let fx = Fixture::new();
    let spec = fx.spec(&[]);

    let (report, log, _) = fx.run(&spec, FixedPrompt::cancel(), &RecordingEditor::default()).await;

    assert!(report.is_empty());
    assert_eq!(events(&log), vec!["start 0", "complete 0"]);
}

#[tokio::test]
async fn test_channel_prompt_drives_decisions_from_another_task() {
    let fx = Fixture::new();
    let risky = fx.target("risky.py", &format!("#DANGER\n{ALL_PASS}"));
    let other = fx.target("other.py", &format!("#DANGER\n{ALL_PASS}"));
    let spec = fx.spec(&[&risky, &other]);

    let (prompt, mut requests) = ChannelPrompt::new(1);
    let responder = tokio::spawn(async move {
        let mut seen = Vec::new();
        while let Some(pending) = requests.recv().await {
            seen.push(pending.request.display_name.clone());
            let decision = if pending.request.display_name == "risky.py" {
                UserDecision::RunAnyway
            } else {
                UserDecision::Skip
            };
            pending.respond(decision);
        }
        seen
    });

    let (report, _, prompt) = fx.run(&spec, prompt, &RecordingEditor::default()).await;
    drop(prompt);

    assert!(report.get("risky.py").unwrap().as_completed().is_some());
    assert!(report.get("other.py").is_none());
    assert_eq!(responder.await.unwrap(), vec!["risky.py", "other.py"]);
}

#[tokio::test]
async fn test_request_file_is_passed_to_interpreter() {
    let fx = Fixture::new().with_config(|c| {
        c.with_interpreter(sh(r#"request="$(cat "$1")"; case "$request" in
            *'"testfunc": "square"'*) echo "[{'test': 'req', 'passed': True}]";;
            *) echo "{'error': 'bad request'}";;
        esac"#))
    });
    let target = fx.target("solution.py", "");
    let spec = fx.spec(&[&target]);

    let (report, _, _) = fx.run(&spec, FixedPrompt::cancel(), &RecordingEditor::default()).await;

    let result = report.get("solution.py").unwrap().as_completed().unwrap();
    assert_eq!(result.results[0].test(), "req");
}
