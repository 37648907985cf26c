//! Runner I/O boundary interfaces
//!
//! The orchestrator only talks to the outside world through these traits:
//! - Safety scanning (detector process)
//! - Script execution (interpreter process)
//! - User decisions (console, GUI bridge, fixed answers)
//! - Opening a target in an editor
//!
//! Default implementations live next to their concern (`scan`, `execute`, `gate`, `editor`). Tests and other
//! presentation layers substitute their own.

use std::io;
use std::path::{Path, PathBuf};

use scriptest_core::{ScanVerdict, UserDecision};

use super::execute::{ExecError, RawOutput};
use super::reporter::RunReporter;

// ============================================================================
// Safety Scanner Interface
// ============================================================================

/// Classify a target before it runs.
///
/// Never fails: a detector that cannot run yields [`ScanVerdict::ScanFailed`].
#[allow(async_fn_in_trait)]
pub trait SafetyScanner {
    async fn scan(&self, target: &Path, reporter: &mut dyn RunReporter) -> ScanVerdict;
}

// ============================================================================
// Script Executor Interface
// ============================================================================

/// Run one target against the request file and return its raw stdout.
#[allow(async_fn_in_trait)]
pub trait ScriptExecutor {
    async fn execute(
        &self,
        request: &Path,
        target: &Path,
        reporter: &mut dyn RunReporter,
    ) -> Result<RawOutput, ExecError>;
}

// ============================================================================
// Decision Prompt Interface
// ============================================================================

/// What the user is asked about when a target is flagged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionRequest {
    pub display_name: String,
    pub path: PathBuf,
    /// Detector output explaining the flag
    pub reasons: String,
}

/// Ask the user what to do with a flagged target.
///
/// This is the gate's suspension point; it may wait indefinitely.
#[allow(async_fn_in_trait)]
pub trait DecisionPrompt {
    async fn decide(&mut self, request: &DecisionRequest) -> UserDecision;
}

// ============================================================================
// Editor Interface
// ============================================================================

/// Open a file for inspection without waiting for the editor to close.
pub trait EditorLauncher {
    fn open(&self, path: &Path) -> io::Result<()>;
}
