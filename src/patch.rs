//! Single-record status patch outcomes.
//!
//! Every write the lifecycle engine performs is a status patch scoped to one
//! record. Adapters evaluate the patch against the freshly read current status
//! and report what happened instead of failing, so replaying the same patch is
//! always safe.

use serde::{Deserialize, Serialize};

/// Result of applying a status patch to a single stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PatchOutcome<S> {
    /// The record moved from `from` to the requested status.
    Applied {
        /// Status held before the patch.
        from: S,
    },
    /// The record already held the requested status; nothing was written.
    Unchanged,
    /// The transition is not permitted from the record's current status.
    Rejected {
        /// Status the record holds, which was left untouched.
        current: S,
    },
}

impl<S: Copy + PartialEq> PatchOutcome<S> {
    /// Decides the outcome of moving `current` to `target`.
    ///
    /// `allowed` is the transition rule of the record's state machine.
    #[must_use]
    pub fn evaluate(current: S, target: S, allowed: impl FnOnce(S, S) -> bool) -> Self {
        if current == target {
            return Self::Unchanged;
        }
        if allowed(current, target) {
            Self::Applied { from: current }
        } else {
            Self::Rejected { current }
        }
    }

    /// Returns whether the patch wrote a new status.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}
