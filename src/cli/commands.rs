//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use scriptest_core::{ParamList, RunReport, ScanVerdict, TestSpecification};
use tracing::debug;

use super::{CliError, CliResult, ExitCode, USAGE_ERROR};
use crate::config::RunnerConfig;
use crate::runner::{
    ConsolePrompt, ConsoleReporter, DecisionPrompt, DefaultOrchestrator, DetectorScanner, FixedPrompt, NullReporter,
    normalize,
};

// ============================================================================
// run
// ============================================================================

/// What to do when the detector flags a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnSuspicious {
    /// Prompt on the terminal
    #[default]
    Ask,
    RunAnyway,
    Skip,
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Targets added on top of the ones in the spec file
    pub scripts: Vec<PathBuf>,
    pub function: Option<String>,
    pub json: bool,
    pub on_suspicious: OnSuspicious,
    pub verbose: bool,
}

/// Load a spec file and apply the command-line additions.
pub fn load_spec(path: &Path, options: &RunOptions) -> CliResult<TestSpecification> {
    let json = fs::read_to_string(path)
        .map_err(|e| CliError::with_code(format!("Error reading {}: {e}", path.display()), USAGE_ERROR))?;
    let mut spec = TestSpecification::from_json(&json)
        .map_err(|e| CliError::with_code(format!("Error in {}: {e}", path.display()), USAGE_ERROR))?;

    if let Some(function) = &options.function {
        spec.function_under_test = function.clone();
    }
    for script in &options.scripts {
        spec.targets
            .add(script.clone())
            .map_err(|e| CliError::with_code(format!("Error: {e}"), USAGE_ERROR))?;
    }
    if spec.function_under_test.is_empty() {
        return Err(CliError::with_code(
            "Error: no function under test (set \"testfunc\" or pass --function)",
            USAGE_ERROR,
        ));
    }
    Ok(spec)
}

/// Run every target of the spec file. Exits 1 if any target errored or any test failed.
pub fn run_spec(spec_path: &Path, options: &RunOptions, config: &RunnerConfig) -> CliResult<ExitCode> {
    let spec = load_spec(spec_path, options)?;
    debug!(targets = spec.targets.len(), cases = spec.cases().len(), "spec loaded");

    let runtime = build_runtime()?;
    let verbose = options.verbose;
    let report = runtime.block_on(async {
        match options.on_suspicious {
            OnSuspicious::Ask => run_with(config, ConsolePrompt::stdio(), &spec, verbose).await,
            OnSuspicious::RunAnyway => run_with(config, FixedPrompt::run_anyway(), &spec, verbose).await,
            OnSuspicious::Skip => run_with(config, FixedPrompt::skip(), &spec, verbose).await,
        }
    })?;

    if options.json {
        println!("{}", report_json(&report)?);
    }

    Ok(if report.has_failures() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

async fn run_with<P: DecisionPrompt>(
    config: &RunnerConfig,
    prompt: P,
    spec: &TestSpecification,
    verbose: bool,
) -> CliResult<RunReport> {
    let mut orchestrator = DefaultOrchestrator::from_config(config, prompt, ConsoleReporter::stderr(verbose));
    orchestrator
        .run(spec)
        .await
        .map_err(|e| CliError::failure(format!("Error: {e}")))
}

pub fn report_json(report: &RunReport) -> CliResult<String> {
    serde_json::to_string_pretty(report).map_err(|e| CliError::failure(format!("Error serializing report: {e}")))
}

// ============================================================================
// scan
// ============================================================================

/// Run the detector once. Exits 1 if the script is flagged.
pub fn scan_script(script: &Path, config: &RunnerConfig) -> CliResult<ExitCode> {
    if !script.is_file() {
        return Err(CliError::with_code(
            format!("Error: {} is not a file", script.display()),
            USAGE_ERROR,
        ));
    }

    let scanner = DetectorScanner::from_config(config).with_enabled(true);
    let runtime = build_runtime()?;
    let verdict = runtime
        .block_on(scanner.try_scan(script, &mut NullReporter))
        .map_err(|e| CliError::failure(format!("Error: {e}")))?;

    println!("{}", verdict_text(&verdict));
    Ok(match verdict {
        ScanVerdict::Clean => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}

fn verdict_text(verdict: &ScanVerdict) -> String {
    match verdict {
        ScanVerdict::Clean => "clean".to_string(),
        ScanVerdict::Suspicious { reasons } => format!("suspicious\n{reasons}"),
        ScanVerdict::ScanFailed { reason } => format!("scan failed: {reason}"),
    }
}

// ============================================================================
// normalize / key (debug)
// ============================================================================

/// Normalize raw interpreter output from `file` (or stdin) and print the records.
pub fn normalize_output(file: Option<&Path>) -> CliResult<ExitCode> {
    let raw = match file {
        Some(path) => fs::read_to_string(path)
            .map_err(|e| CliError::with_code(format!("Error reading {}: {e}", path.display()), USAGE_ERROR))?,
        None => io::read_to_string(io::stdin())
            .map_err(|e| CliError::with_code(format!("Error reading stdin: {e}"), USAGE_ERROR))?,
    };
    println!("{}", normalize_to_json(&raw)?);
    Ok(ExitCode::SUCCESS)
}

/// Records as pretty JSON, or the rendered diagnostic as the error message.
pub fn normalize_to_json(raw: &str) -> CliResult<String> {
    let records = normalize(raw).map_err(|e| match e.diagnostic() {
        Some(diagnostic) => CliError::failure(format!(
            "Failed to parse interpreter output:\n{}",
            render_diagnostic(diagnostic)
        )),
        None => CliError::failure(e.to_string()),
    })?;
    serde_json::to_string_pretty(&records).map_err(|e| CliError::failure(format!("Error serializing records: {e}")))
}

fn render_diagnostic(diagnostic: &dyn miette::Diagnostic) -> String {
    let mut out = String::new();
    let handler = miette::GraphicalReportHandler::new_themed(miette::GraphicalTheme::unicode_nocolor());
    match handler.render_report(&mut out, diagnostic) {
        Ok(()) => out,
        Err(_) => diagnostic.to_string(),
    }
}

pub fn print_key(params: &ParamList) -> CliResult<ExitCode> {
    println!("{}", params.to_key());
    Ok(ExitCode::SUCCESS)
}

fn build_runtime() -> CliResult<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::failure(format!("Error starting runtime: {e}")))
}
