//! Conversion lifecycle of a single file.
//!
//! ```text
//! none ──Submit──▶ submitting ──Accepted──▶ converting ──Completed──▶ done
//!  ▲                   │                        │
//!  │                Rejected                  Failed
//!  │                   ▼                        │
//!  └─────Reset───── failed ◀────────────────────┘
//! ```
//!
//! The submitter drives only `Submit`, `Accepted` and `Rejected`. `Completed`
//! and `Failed` come from whoever observes the conversion service (a poller or
//! a push notification); `Reset` is an explicit user action.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a file is in its conversion lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionStep {
    /// Never attempted (or reset after a failure).
    #[default]
    None,
    /// A start-conversion request is in flight.
    Submitting,
    /// The service accepted the task and is converting.
    Converting,
    /// Conversion finished.
    Done,
    /// Submission or conversion failed.
    Failed,
}

/// An edge of the lifecycle graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepEvent {
    Submit,
    Accepted,
    Rejected,
    Completed,
    Failed,
    Reset,
}

impl ConversionStep {
    /// All steps, in lifecycle order.
    pub const ALL: [ConversionStep; 5] = [
        ConversionStep::None,
        ConversionStep::Submitting,
        ConversionStep::Converting,
        ConversionStep::Done,
        ConversionStep::Failed,
    ];

    /// Apply `event`, returning the next step, or `None` if the edge does not exist.
    pub fn apply(self, event: StepEvent) -> Option<ConversionStep> {
        use ConversionStep as S;
        use StepEvent as E;
        match (self, event) {
            (S::None, E::Submit) => Some(S::Submitting),
            (S::Submitting, E::Accepted) => Some(S::Converting),
            (S::Submitting, E::Rejected) => Some(S::Failed),
            (S::Converting, E::Completed) => Some(S::Done),
            (S::Converting, E::Failed) => Some(S::Failed),
            (S::Failed, E::Reset) => Some(S::None),
            _ => None,
        }
    }

    /// A request or conversion is outstanding for this file.
    pub fn is_in_flight(self) -> bool {
        matches!(self, ConversionStep::Submitting | ConversionStep::Converting)
    }

    /// No further edge exists without an explicit reset.
    pub fn is_terminal(self) -> bool {
        matches!(self, ConversionStep::Done | ConversionStep::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConversionStep::None => "none",
            ConversionStep::Submitting => "submitting",
            ConversionStep::Converting => "converting",
            ConversionStep::Done => "done",
            ConversionStep::Failed => "failed",
        }
    }
}

impl fmt::Display for ConversionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ConversionStep {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConversionStep::ALL
            .into_iter()
            .find(|step| step.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown conversion step '{s}'"))
    }
}
