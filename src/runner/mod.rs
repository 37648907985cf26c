//! Test run pipeline: safety scan, decision gate, interpreter execution, output normalization and aggregation.
//!
//! [`Orchestrator`] sequences the stages for every target of a [`scriptest_core::TestSpecification`]. Each stage
//! sits behind a trait in [`interfaces`], so presentation layers and tests can swap any of them.

pub mod editor;
pub mod execute;
pub mod gate;
pub mod interfaces;
pub mod normalize;
pub mod orchestrator;
pub mod process;
pub mod reporter;
pub mod scan;

pub use editor::SystemEditor;
pub use execute::{ExecError, InterpreterExecutor, RawOutput};
pub use gate::{ChannelPrompt, ConsolePrompt, FixedPrompt, PendingDecision, ScriptedPrompt};
pub use interfaces::{DecisionPrompt, DecisionRequest, EditorLauncher, SafetyScanner, ScriptExecutor};
pub use normalize::{NO_VALUE_PLACEHOLDER, NormalizeError, normalize};
pub use orchestrator::{CANCELLED_BY_USER, DefaultOrchestrator, Orchestrator, RequestArtifact, RunError};
pub use reporter::{ConsoleReporter, Diagnostic, DiagnosticKind, NullReporter, RunReporter};
pub use scan::{DetectorScanner, ScanError};
