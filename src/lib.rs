#![forbid(unsafe_code)]
//! scriptest: parameterized test runner for externally-authored scripts.
//!
//! A [`TestSpecification`] names a function, a set of parameter lists with their expected outputs, and the scripts
//! that define the function. The [`runner`] scans each script for risky constructs, asks the user what to do with
//! flagged ones, runs the rest through the interpreter harness, and turns the harness output (written in the
//! interpreter's literal syntax) into a [`RunReport`].
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

pub mod cli;
pub mod config;
pub mod runner;
pub mod version;

pub use config::{Invocation, RunnerConfig};
pub use runner::{Orchestrator, RunError, RunReporter};

pub use scriptest_core::{
    AggregatedResult, Expected, GateOutcome, Param, ParamList, ParamType, RunReport, ScanVerdict, SpecError, Summary,
    TargetOutcome, TestRecord, TestSpecification, UserDecision, aggregate,
};
pub use scriptest_literal::LiteralError;
