//! Receipt lifecycle state machine.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Lifecycle status of a receipt.
///
/// `Pending` is the only non-terminal state; `Approved` and `Rejected`
/// are final. Points are disbursed only on the transition into `Approved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptStatus {
    /// Uploaded and awaiting review.
    Pending,
    /// Approved; points have been awarded exactly once.
    Approved,
    /// Rejected; no points awarded.
    Rejected,
}

impl ReceiptStatus {
    /// Returns true once the receipt can no longer change state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }

    /// Returns true if the transition `self -> target` is legal.
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Approved) | (Self::Pending, Self::Rejected)
        )
    }

    /// Validates the transition `self -> target`.
    ///
    /// # Errors
    ///
    /// Returns `ReceiptError::IllegalTransition` when the transition is
    /// not allowed.
    pub fn validate_transition(&self, target: Self) -> Result<(), ReceiptError> {
        if self.can_transition_to(target) {
            Ok(())
        } else {
            Err(ReceiptError::IllegalTransition {
                from: *self,
                to: target,
            })
        }
    }
}

/// Errors from receipt lifecycle operations.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// Receipt not found or already processed.
    ///
    /// A conditional transition out of `pending` that matches zero rows
    /// lands here, so a second concurrent approval reports failure rather
    /// than double-crediting.
    #[error("Receipt not found or already processed: {0}")]
    NotPending(Uuid),

    /// Receipt not found.
    #[error("Receipt not found: {0}")]
    NotFound(Uuid),

    /// Receipt has no derivable total and cannot be approved.
    #[error("Receipt {0} has no total and cannot be approved")]
    TotalMissing(Uuid),

    /// Illegal state transition.
    #[error("Illegal receipt transition: {from:?} -> {to:?}")]
    IllegalTransition {
        /// Current status.
        from: ReceiptStatus,
        /// Requested status.
        to: ReceiptStatus,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_transitions() {
        assert!(ReceiptStatus::Pending.can_transition_to(ReceiptStatus::Approved));
        assert!(ReceiptStatus::Pending.can_transition_to(ReceiptStatus::Rejected));
        assert!(!ReceiptStatus::Pending.can_transition_to(ReceiptStatus::Pending));
    }

    #[test]
    fn test_terminal_states_frozen() {
        for terminal in [ReceiptStatus::Approved, ReceiptStatus::Rejected] {
            assert!(terminal.is_terminal());
            for target in [
                ReceiptStatus::Pending,
                ReceiptStatus::Approved,
                ReceiptStatus::Rejected,
            ] {
                assert!(!terminal.can_transition_to(target));
            }
        }
    }

    #[test]
    fn test_validate_transition_error() {
        let err = ReceiptStatus::Approved
            .validate_transition(ReceiptStatus::Rejected)
            .unwrap_err();
        assert!(matches!(err, ReceiptError::IllegalTransition { .. }));
    }
}
