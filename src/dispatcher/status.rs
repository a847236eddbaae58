//! Job lifecycle states.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Status of a compilation job.
///
/// Declared in lifecycle order: `Initial → ReadyToParse → Parsed →
/// {ReadyToCompile | Failed} → Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompileJobStatus {
    /// Constructed or reset, nothing prepared
    Initial,
    /// Source range resolved, ready for `parse`
    ReadyToParse,
    /// Parse attempted, outcome not yet inspected
    Parsed,
    /// Parse succeeded
    ReadyToCompile,
    /// Parse failed, error not yet reported
    Failed,
    /// Error reported
    Done,
}

impl Default for CompileJobStatus {
    fn default() -> Self {
        Self::Initial
    }
}

impl CompileJobStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::Initial,
        Self::ReadyToParse,
        Self::Parsed,
        Self::ReadyToCompile,
        Self::Failed,
        Self::Done,
    ];

    /// Returns true for the status no operation leaves.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self == Self::Done
    }

    /// Returns true if some job operation moves a job from `self` to `next`.
    ///
    /// Every non-terminal status can go back to `Initial` through reset.
    #[must_use]
    pub fn can_advance_to(self, next: Self) -> bool {
        use CompileJobStatus::{Done, Failed, Initial, Parsed, ReadyToCompile, ReadyToParse};
        match (self, next) {
            (Initial, ReadyToParse)
            | (ReadyToParse, Parsed)
            | (Parsed, ReadyToCompile | Failed)
            | (Failed, Done) => true,
            (from, Initial) => !from.is_terminal(),
            _ => false,
        }
    }

    /// Snake-case name used in logs and reports.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::ReadyToParse => "ready_to_parse",
            Self::Parsed => "parsed",
            Self::ReadyToCompile => "ready_to_compile",
            Self::Failed => "failed",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for CompileJobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
