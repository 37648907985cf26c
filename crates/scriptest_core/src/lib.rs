//! Provide the shared data model of a scriptest run: test specifications, scan verdicts, per-test records and the
//! result aggregator.
//!
//! This crate is intentionally small and dependency-light. Both the runner and any presentation layer (CLI, desktop
//! front end) build on the same types, so a specification written by one can be executed by the other.
//!
//! ## Notes
//!
//! - This is a “model” crate: **no process spawning**, no global state. The only IO helpers are the (de)serializers for
//!   the request artifact format.
//! - Wire spellings follow the interpreter harness (`testfunc`, `tests`, `scriptPaths`, `NoneType`, …).

pub mod decision;
pub mod errors;
pub mod params;
pub mod record;
pub mod spec;
pub mod types;

pub use decision::{GateOutcome, ScanVerdict, UserDecision};
pub use errors::SpecError;
pub use params::{Expected, Param, ParamList};
pub use record::{
    AggregatedResult, MISSING_ERROR_PLACEHOLDER, RunReport, Summary, TargetOutcome, TestRecord, aggregate,
};
pub use spec::{DISPLAY_NAME_MAX_CHARS, Targets, TestSpecification};
pub use types::ParamType;
