//! Safety pre-scan verdicts and the user decisions they can trigger.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Outcome of the advisory safety scan of one target. Produced fresh per target per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "kebab-case")]
pub enum ScanVerdict {
    Clean,
    /// The detector flagged the script; `reasons` is the detector's full output.
    Suspicious { reasons: String },
    /// The detector could not be run. Non-fatal: execution proceeds.
    ScanFailed { reason: String },
}

/// Choice offered to the user when a target is flagged as suspicious.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UserDecision {
    Cancel,
    RunAnyway,
    Skip,
    /// Open the target in an editor, then present the same choice again.
    OpenAndReask,
}

impl UserDecision {
    pub const ALL: [UserDecision; 4] = [
        UserDecision::Cancel,
        UserDecision::RunAnyway,
        UserDecision::Skip,
        UserDecision::OpenAndReask,
    ];

    /// Human-readable label, as shown on a prompt button.
    pub fn label(self) -> &'static str {
        match self {
            UserDecision::Cancel => "Cancel",
            UserDecision::RunAnyway => "Run anyway",
            UserDecision::Skip => "Skip",
            UserDecision::OpenAndReask => "Open file",
        }
    }

    /// Single-letter shortcut accepted by text prompts.
    pub fn shortcut(self) -> char {
        match self {
            UserDecision::Cancel => 'c',
            UserDecision::RunAnyway => 'r',
            UserDecision::Skip => 's',
            UserDecision::OpenAndReask => 'o',
        }
    }
}

impl fmt::Display for UserDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Parse a typed answer: a shortcut letter, the label, or the kebab-case name (case-insensitive).
impl FromStr for UserDecision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let answer = s.trim().to_ascii_lowercase();
        UserDecision::ALL
            .into_iter()
            .find(|d| {
                (answer.len() == 1 && answer.starts_with(d.shortcut()))
                    || answer == d.label().to_ascii_lowercase()
                    || answer
                        == match d {
                            UserDecision::Cancel => "cancel",
                            UserDecision::RunAnyway => "run-anyway",
                            UserDecision::Skip => "skip",
                            UserDecision::OpenAndReask => "open",
                        }
            })
            .ok_or_else(|| format!("unrecognized choice '{}'", s.trim()))
    }
}

/// Terminal state of the decision gate for one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    Proceed,
    Cancelled,
    Skipped,
}
