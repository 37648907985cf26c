//! Per-test records, per-target aggregates and the run report.

use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Error text stored for a failing record that carried no reason of its own.
pub const MISSING_ERROR_PLACEHOLDER: &str = "test failed without an error message";

/// Outcome of one test case against one target.
///
/// `error` is present exactly when `passed` is false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRecord")]
pub struct TestRecord {
    test: String,
    passed: bool,
    received: Option<String>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct RawRecord {
    test: String,
    passed: bool,
    #[serde(default)]
    received: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl TryFrom<RawRecord> for TestRecord {
    type Error = String;

    fn try_from(raw: RawRecord) -> Result<Self, Self::Error> {
        if raw.passed == raw.error.is_some() {
            return Err(format!(
                "record '{}': error must be present exactly when the test failed",
                raw.test
            ));
        }
        Ok(TestRecord {
            test: raw.test,
            passed: raw.passed,
            received: raw.received,
            error: raw.error,
        })
    }
}

impl TestRecord {
    pub fn pass(test: impl Into<String>, received: Option<String>) -> Self {
        Self {
            test: test.into(),
            passed: true,
            received,
            error: None,
        }
    }

    /// A failing record. An absent reason is replaced by [`MISSING_ERROR_PLACEHOLDER`].
    pub fn fail(test: impl Into<String>, received: Option<String>, error: Option<String>) -> Self {
        Self {
            test: test.into(),
            passed: false,
            received,
            error: Some(error.unwrap_or_else(|| MISSING_ERROR_PLACEHOLDER.to_string())),
        }
    }

    pub fn test(&self) -> &str {
        &self.test
    }

    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn received(&self) -> Option<&str> {
        self.received.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Pass/fail counts. `total == passed + failed` always.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
}

impl Summary {
    /// Percentage of passing tests, rounded down; `0` for an empty summary.
    pub fn pass_rate(&self) -> usize {
        if self.total == 0 { 0 } else { self.passed * 100 / self.total }
    }

    pub fn merge(self, other: Summary) -> Summary {
        Summary {
            total: self.total + other.total,
            passed: self.passed + other.passed,
            failed: self.failed + other.failed,
        }
    }
}

/// All records for one target plus their summary.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AggregatedResult {
    pub results: Vec<TestRecord>,
    pub summary: Summary,
}

/// Fold per-test records into an [`AggregatedResult`].
///
/// ## Notes
/// - Pure; an empty input yields a valid, vacuous aggregate (`0/0/0`).
pub fn aggregate(records: Vec<TestRecord>) -> AggregatedResult {
    let total = records.len();
    let passed = records.iter().filter(|r| r.passed).count();
    AggregatedResult {
        results: records,
        summary: Summary {
            total,
            passed,
            failed: total - passed,
        },
    }
}

/// What a run produced for one (non-skipped) target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TargetOutcome {
    Completed(AggregatedResult),
    Failed { error: String },
}

impl TargetOutcome {
    pub fn failed(error: impl Into<String>) -> Self {
        TargetOutcome::Failed { error: error.into() }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            TargetOutcome::Failed { error } => Some(error),
            TargetOutcome::Completed(_) => None,
        }
    }

    pub fn as_completed(&self) -> Option<&AggregatedResult> {
        match self {
            TargetOutcome::Completed(result) => Some(result),
            TargetOutcome::Failed { .. } => None,
        }
    }
}

/// Display name → outcome, in target-declaration order. Skipped targets have no entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunReport {
    entries: Vec<(String, TargetOutcome)>,
}

impl RunReport {
    /// Record the outcome of a target. A repeated display name replaces the earlier outcome.
    pub fn record(&mut self, display_name: impl Into<String>, outcome: TargetOutcome) {
        let display_name = display_name.into();
        if let Some(slot) = self.entries.iter_mut().find(|(n, _)| *n == display_name) {
            slot.1 = outcome;
        } else {
            self.entries.push((display_name, outcome));
        }
    }

    pub fn get(&self, display_name: &str) -> Option<&TargetOutcome> {
        self.entries.iter().find(|(n, _)| n == display_name).map(|(_, o)| o)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TargetOutcome)> {
        self.entries.iter().map(|(n, o)| (n.as_str(), o))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Combined summary of every completed target.
    pub fn totals(&self) -> Summary {
        self.entries
            .iter()
            .filter_map(|(_, o)| o.as_completed())
            .fold(Summary::default(), |acc, r| acc.merge(r.summary))
    }

    /// Whether any target errored or any test failed.
    pub fn has_failures(&self) -> bool {
        self.entries.iter().any(|(_, o)| match o {
            TargetOutcome::Failed { .. } => true,
            TargetOutcome::Completed(r) => r.summary.failed > 0,
        })
    }
}

impl Serialize for RunReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, outcome) in &self.entries {
            map.serialize_entry(name, outcome)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RunReport {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Map::<String, Value>::deserialize(deserializer)?;
        let mut report = RunReport::default();
        for (name, value) in raw {
            let outcome = serde_json::from_value(value).map_err(D::Error::custom)?;
            report.record(name, outcome);
        }
        Ok(report)
    }
}
