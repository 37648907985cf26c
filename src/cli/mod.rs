//! CLI module for scriptest
//!
//! ## Commands
//!
//! - `run <SPEC.json>` - Scan, gate and run every target of a test specification
//! - `scan <SCRIPT>` - Run only the safety detector
//! - `normalize [FILE]` - Turn raw interpreter output into test records (debug)
//! - `key <VALUE:TYPE>...` - Print the mapping key of a parameter list (debug)
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use scriptest_core::{Param, ParamList};

use crate::config::RunnerConfig;
use crate::version::SCRIPTEST_VERSION;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }

    pub fn with_code(message: impl Into<String>, code: i32) -> Self {
        Self::new(message, ExitCode(code))
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// Exit code for usage errors (bad spec file, unreadable input).
pub const USAGE_ERROR: i32 = 2;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Parameterized test runner for externally-authored scripts
#[derive(Parser, Debug)]
#[command(name = "scriptest")]
#[command(version = SCRIPTEST_VERSION)]
#[command(about = "Run parameterized tests against interpreter scripts", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbose output (per-test results, detector reasons, debug logs)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan, gate and run every target of a test specification
    Run {
        /// Test specification (JSON request format)
        #[arg(value_name = "SPEC")]
        spec: PathBuf,
        /// Additional script to test (repeatable)
        #[arg(short = 's', long = "script", value_name = "PATH")]
        scripts: Vec<PathBuf>,
        /// Override the function under test
        #[arg(short = 'f', long = "function", value_name = "NAME")]
        function: Option<String>,
        /// Print the run report as JSON on stdout
        #[arg(long)]
        json: bool,
        /// Run flagged scripts without asking
        #[arg(short = 'y', long, conflicts_with = "skip_suspicious")]
        yes: bool,
        /// Skip flagged scripts without asking
        #[arg(long)]
        skip_suspicious: bool,
        /// Do not run the safety detector
        #[arg(long)]
        no_scan: bool,
        #[command(flatten)]
        runner: RunnerArgs,
    },

    /// Run only the safety detector against a script
    Scan {
        #[arg(value_name = "SCRIPT")]
        script: PathBuf,
        #[command(flatten)]
        runner: RunnerArgs,
    },

    /// Normalize raw interpreter output into test records (debug)
    Normalize {
        /// File with raw output (default: stdin)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Print the mapping key for a parameter list (debug)
    Key {
        /// Parameters as VALUE:TYPE, e.g. 3:int 'a b':str
        #[arg(value_name = "VALUE:TYPE", value_parser = parse_param)]
        params: Vec<Param>,
    },
}

/// Process settings shared by `run` and `scan`.
#[derive(Args, Debug, Default, Clone)]
pub struct RunnerArgs {
    /// Interpreter program (default: $SCRIPTEST_PYTHON or python)
    #[arg(long, value_name = "PROG")]
    pub python: Option<PathBuf>,
    /// Directory holding test.py and detection_script.py
    #[arg(long, value_name = "DIR")]
    pub scripts_dir: Option<PathBuf>,
    /// Kill the detector or interpreter after this many seconds
    #[arg(long, value_name = "SECS", value_parser = parse_timeout)]
    pub timeout: Option<Duration>,
}

impl RunnerArgs {
    /// Environment-derived config with these flags applied on top.
    pub fn to_config(&self) -> RunnerConfig {
        let mut config = RunnerConfig::from_env().with_timeout(self.timeout);
        if let Some(dir) = &self.scripts_dir {
            config = config.with_scripts_dir(dir);
        }
        if let Some(python) = &self.python {
            config = config.with_python(python.clone());
        }
        config
    }
}

fn parse_param(s: &str) -> Result<Param, String> {
    s.parse::<Param>().map_err(|e| e.to_string())
}

fn parse_timeout(s: &str) -> Result<Duration, String> {
    let secs: f64 = s.trim().parse().map_err(|_| format!("invalid number of seconds: '{s}'"))?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err(format!("timeout must be a positive number of seconds, got '{s}'"));
    }
    Duration::try_from_secs_f64(secs).map_err(|e| format!("invalid timeout '{s}': {e}"))
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run(cli: Cli) {
    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    let verbose = cli.verbose;
    match cli.command {
        Command::Run {
            spec,
            scripts,
            function,
            json,
            yes,
            skip_suspicious,
            no_scan,
            runner,
        } => {
            let options = commands::RunOptions {
                scripts,
                function,
                json,
                on_suspicious: if yes {
                    commands::OnSuspicious::RunAnyway
                } else if skip_suspicious {
                    commands::OnSuspicious::Skip
                } else {
                    commands::OnSuspicious::Ask
                },
                verbose,
            };
            let config = runner.to_config().with_scan(!no_scan);
            commands::run_spec(&spec, &options, &config)
        }
        Command::Scan { script, runner } => commands::scan_script(&script, &runner.to_config()),
        Command::Normalize { file } => commands::normalize_output(file.as_deref()),
        Command::Key { params } => commands::print_key(&ParamList::new(params)),
    }
}

// ============================================================================
// Tests
// ============================================================================
