//! Retry object status and its transition rules.

use serde::{Deserialize, Serialize};
use strum_macros::EnumIter;

/// Lifecycle status of a retry object.
///
/// Transitions:
/// - `InProgress` -> any status
/// - `Paused` -> `InProgress`
/// - `AuthorizationError` -> `InProgress` (on authorization recovery)
/// - terminal statuses never change
///
/// Re-applying the current status is always allowed, so redundant updates from
/// overlapping ticks are harmless.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, EnumIter,
)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    /// Being resubmitted on every tick
    #[default]
    InProgress,
    /// Booking went through
    Success,
    /// The task is attached to another booking
    AnotherTask,
    /// Retry suspended by the user
    Paused,
    /// Session lost; waits for re-authentication
    AuthorizationError,
    /// Rejected permanently by the terminal
    Error,
    /// The requested slot window has passed
    Expired,
    /// Transport failure after all attempts
    NetworkError,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::InProgress => "in-progress",
            Status::Success => "success",
            Status::AnotherTask => "another-task",
            Status::Paused => "paused",
            Status::AuthorizationError => "authorization-error",
            Status::Error => "error",
            Status::Expired => "expired",
            Status::NetworkError => "network-error",
        }
    }

    /// Is this a terminal status (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Status::Success
                | Status::AnotherTask
                | Status::Error
                | Status::Expired
                | Status::NetworkError
        )
    }

    /// Is this item picked up by the scheduler?
    pub fn is_active(self) -> bool {
        self == Status::InProgress
    }

    /// Whether an item in `self` may move to `next`.
    pub fn can_transition_to(self, next: Status) -> bool {
        if self == next {
            return true;
        }
        match self {
            Status::InProgress => true,
            Status::Paused | Status::AuthorizationError => next == Status::InProgress,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_wire_names_match_as_str() {
        for status in Status::iter() {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            let back: Status = serde_json::from_str(&json).unwrap();
            assert_eq!(back, status);
        }
    }

    #[test]
    fn test_terminal_statuses_never_move() {
        for from in Status::iter().filter(|s| s.is_terminal()) {
            for to in Status::iter().filter(|to| *to != from) {
                assert!(
                    !from.can_transition_to(to),
                    "{from} -> {to} should be rejected"
                );
            }
        }
    }

    #[test]
    fn test_reversible_transitions() {
        assert!(Status::InProgress.can_transition_to(Status::Paused));
        assert!(Status::Paused.can_transition_to(Status::InProgress));
        assert!(Status::AuthorizationError.can_transition_to(Status::InProgress));
        assert!(Status::Expired.can_transition_to(Status::Expired));
        assert!(!Status::Paused.can_transition_to(Status::Error));
        assert!(!Status::AuthorizationError.can_transition_to(Status::Paused));
    }

    #[test]
    fn test_in_progress_reaches_everything() {
        for to in Status::iter() {
            assert!(Status::InProgress.can_transition_to(to));
        }
    }

    #[test]
    fn test_only_in_progress_is_active() {
        let active: Vec<Status> = Status::iter().filter(|s| s.is_active()).collect();
        assert_eq!(active, vec![Status::InProgress]);
    }
}
