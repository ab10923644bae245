//! Balance mutation lifecycle
//!
//! A deposit or withdrawal moves through
//! `Pending -> Locked -> Validated -> Applied -> Committed`.
//! Any failure before commit ends in `RolledBack`.

use serde::{Deserialize, Serialize};

/// Kind of balance mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    Deposit,
    Withdrawal,
}

impl std::fmt::Display for MutationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MutationKind::Deposit => write!(f, "deposit"),
            MutationKind::Withdrawal => write!(f, "withdrawal"),
        }
    }
}

/// State of a single mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationState {
    Pending,
    Locked,
    Validated,
    Applied,
    Committed,
    RolledBack,
}

impl MutationState {
    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, MutationState::Committed | MutationState::RolledBack)
    }

    /// Whether `next` is a legal successor of this state
    pub fn can_transition_to(&self, next: MutationState) -> bool {
        use MutationState::*;
        matches!(
            (*self, next),
            (Pending, Locked)
                | (Locked, Validated)
                | (Validated, Applied)
                | (Applied, Committed)
                | (Pending | Locked | Validated | Applied, RolledBack)
        )
    }
}

impl std::fmt::Display for MutationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MutationState::Pending => write!(f, "pending"),
            MutationState::Locked => write!(f, "locked"),
            MutationState::Validated => write!(f, "validated"),
            MutationState::Applied => write!(f, "applied"),
            MutationState::Committed => write!(f, "committed"),
            MutationState::RolledBack => write!(f, "rolled_back"),
        }
    }
}

/// Tracks one mutation through its lifecycle, logging each step.
#[derive(Debug)]
pub struct MutationTracker {
    kind: MutationKind,
    wallet_id: i64,
    state: MutationState,
}

impl MutationTracker {
    pub fn new(kind: MutationKind, wallet_id: i64) -> Self {
        Self {
            kind,
            wallet_id,
            state: MutationState::Pending,
        }
    }

    pub fn state(&self) -> MutationState {
        self.state
    }

    /// Move to `next`. Illegal transitions are a programming error and are
    /// ignored (with an error log) in release builds.
    pub fn advance(&mut self, next: MutationState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        if !self.state.can_transition_to(next) {
            tracing::error!(
                kind = %self.kind,
                wallet_id = self.wallet_id,
                from = %self.state,
                to = %next,
                "Illegal mutation state transition"
            );
            return;
        }
        tracing::debug!(
            kind = %self.kind,
            wallet_id = self.wallet_id,
            from = %self.state,
            to = %next,
            "Mutation state changed"
        );
        self.state = next;
    }

    /// Mark the mutation as rolled back unless it already finished.
    pub fn roll_back(&mut self) {
        if !self.state.is_terminal() {
            self.advance(MutationState::RolledBack);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let mut tracker = MutationTracker::new(MutationKind::Deposit, 1);
        for next in [
            MutationState::Locked,
            MutationState::Validated,
            MutationState::Applied,
            MutationState::Committed,
        ] {
            tracker.advance(next);
            assert_eq!(tracker.state(), next);
        }
        assert!(tracker.state().is_terminal());
    }

    #[test]
    fn test_rollback_from_any_open_state() {
        for state in [
            MutationState::Pending,
            MutationState::Locked,
            MutationState::Validated,
            MutationState::Applied,
        ] {
            assert!(state.can_transition_to(MutationState::RolledBack));
        }
    }

    #[test]
    fn test_terminal_states_are_final() {
        assert!(!MutationState::Committed.can_transition_to(MutationState::RolledBack));
        assert!(!MutationState::RolledBack.can_transition_to(MutationState::Committed));
        assert!(!MutationState::Pending.can_transition_to(MutationState::Applied));
    }

    #[test]
    fn test_roll_back_after_commit_is_noop() {
        let mut tracker = MutationTracker::new(MutationKind::Withdrawal, 7);
        tracker.advance(MutationState::Locked);
        tracker.advance(MutationState::Validated);
        tracker.advance(MutationState::Applied);
        tracker.advance(MutationState::Committed);
        tracker.roll_back();
        assert_eq!(tracker.state(), MutationState::Committed);
    }

    #[test]
    #[should_panic(expected = "illegal transition pending -> committed")]
    #[cfg(debug_assertions)]
    fn test_illegal_transition_panics_in_debug() {
        let mut tracker = MutationTracker::new(MutationKind::Deposit, 1);
        tracker.advance(MutationState::Committed);
    }

    #[test]
    fn test_display() {
        assert_eq!(MutationState::RolledBack.to_string(), "rolled_back");
        assert_eq!(MutationKind::Withdrawal.to_string(), "withdrawal");
    }
}
