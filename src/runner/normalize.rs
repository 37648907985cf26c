//! Raw interpreter output to typed test records.
//!
//! The harness prints its results in the interpreter's literal syntax. [`scriptest_literal`] turns that into strict
//! JSON; this module checks the shape and builds [`TestRecord`]s.
//!
//! ## Notes
//! - `received` is always re-serialized to compact JSON text (`9` → `"9"`, `'a'` → `"\"a\""`, `None` → `"null"`).
//!   An absent `received` becomes [`NO_VALUE_PLACEHOLDER`].
//! - `error` is only kept on failing records.

use scriptest_core::TestRecord;
use scriptest_literal::LiteralError;
use serde_json::{Map, Value};
use thiserror::Error;

/// `received` text for a record that reported no value.
pub const NO_VALUE_PLACEHOLDER: &str = "<no value>";

/// Why raw output could not become records. Fatal for that target only.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// Output is not a literal at all
    #[error("Failed to parse interpreter output: {source}")]
    Parse {
        /// The text that was attempted
        text: String,
        #[source]
        source: LiteralError,
    },

    /// The harness itself reported a failure (`{'error': ...}`)
    #[error("Error: {0}")]
    ScriptReported(String),

    /// A literal, but not a list of records
    #[error("Unexpected interpreter output: {0}")]
    Shape(String),
}

impl NormalizeError {
    /// The span-carrying diagnostic, for parse failures.
    pub fn diagnostic(&self) -> Option<&LiteralError> {
        match self {
            NormalizeError::Parse { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Parse raw interpreter stdout into records.
#[tracing::instrument(skip_all, fields(raw_len = raw.len()))]
pub fn normalize(raw: &str) -> Result<Vec<TestRecord>, NormalizeError> {
    let value = scriptest_literal::to_json(raw).map_err(|source| NormalizeError::Parse {
        text: raw.to_string(),
        source,
    })?;
    records_from_value(value)
}

/// Build records from already-parsed output.
pub fn records_from_value(value: Value) -> Result<Vec<TestRecord>, NormalizeError> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(map) => {
            return Err(match map.get("error") {
                Some(error) => NormalizeError::ScriptReported(text_of(error)),
                None => NormalizeError::Shape("expected a list of test records, found an object".to_string()),
            });
        }
        other => {
            return Err(NormalizeError::Shape(format!(
                "expected a list of test records, found {}",
                kind_of(&other)
            )));
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(map) => record_from_map(index, map),
            other => Err(NormalizeError::Shape(format!(
                "record {index} is {}, expected an object",
                kind_of(&other)
            ))),
        })
        .collect()
}

fn record_from_map(index: usize, mut map: Map<String, Value>) -> Result<TestRecord, NormalizeError> {
    let test = match map.remove("test") {
        Some(test) => text_of(&test),
        None => return Err(NormalizeError::Shape(format!("record {index} has no 'test' field"))),
    };

    let passed = match map.remove("passed") {
        Some(Value::Bool(passed)) => passed,
        Some(other) => {
            return Err(NormalizeError::Shape(format!(
                "record {index} ('{test}'): 'passed' is {}, expected a boolean",
                kind_of(&other)
            )));
        }
        None => {
            return Err(NormalizeError::Shape(format!(
                "record {index} ('{test}') has no 'passed' field"
            )));
        }
    };

    let received = Some(match map.remove("received") {
        Some(value) => value.to_string(),
        None => NO_VALUE_PLACEHOLDER.to_string(),
    });

    if passed {
        return Ok(TestRecord::pass(test, received));
    }

    let error = match map.remove("error") {
        None | Some(Value::Null) => None,
        Some(error) => Some(text_of(&error)),
    };
    Ok(TestRecord::fail(test, received, error))
}

/// Strings verbatim, anything else as compact JSON.
fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
