//! Voucher state machine.
//!
//! Pure transition rules: given the current status, either produce the
//! [`Transition`] to apply or a [`WorkflowError`]. Balance checks, capability
//! checks and persistence are the engine's job.

use chrono::Utc;
use girder_shared::types::{UserId, VoucherId};

use crate::ledger::VoucherType;
use crate::workflow::error::WorkflowError;
use crate::workflow::posting::PostingPolicy;
use crate::workflow::types::{Transition, VoucherAction, VoucherStatus};

/// Stateless service for voucher status transitions.
pub struct VoucherStateMachine;

impl VoucherStateMachine {
    /// Submit a draft voucher for approval.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the voucher is in draft.
    pub fn submit(current: VoucherStatus, actor: UserId) -> Result<Transition, WorkflowError> {
        match current {
            VoucherStatus::Draft => Ok(Self::transition(VoucherAction::Submit, current, actor)),
            _ => Err(WorkflowError::InvalidTransition {
                action: VoucherAction::Submit,
                from: current,
            }),
        }
    }

    /// Approve a submitted voucher.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the voucher is submitted.
    pub fn approve(current: VoucherStatus, actor: UserId) -> Result<Transition, WorkflowError> {
        match current {
            VoucherStatus::Submitted => {
                Ok(Self::transition(VoucherAction::Approve, current, actor))
            }
            _ => Err(WorkflowError::InvalidTransition {
                action: VoucherAction::Approve,
                from: current,
            }),
        }
    }

    /// Post a voucher to the ledger.
    ///
    /// Approved vouchers always post; draft and submitted vouchers post only
    /// when `policy` lists their type for direct posting.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` when the policy does not allow posting from `current`.
    pub fn post(
        current: VoucherStatus,
        voucher_type: VoucherType,
        policy: &PostingPolicy,
        actor: UserId,
    ) -> Result<Transition, WorkflowError> {
        if policy.can_post_from(voucher_type, current) {
            Ok(Self::transition(VoucherAction::Post, current, actor))
        } else {
            Err(WorkflowError::InvalidTransition {
                action: VoucherAction::Post,
                from: current,
            })
        }
    }

    /// Reverse a posted voucher.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyReversed` for a reversed voucher and `InvalidTransition`
    /// for anything not yet posted.
    pub fn reverse(
        voucher_id: VoucherId,
        current: VoucherStatus,
        actor: UserId,
    ) -> Result<Transition, WorkflowError> {
        match current {
            VoucherStatus::Posted => Ok(Self::transition(VoucherAction::Reverse, current, actor)),
            VoucherStatus::Reversed => Err(WorkflowError::AlreadyReversed(voucher_id)),
            _ => Err(WorkflowError::InvalidTransition {
                action: VoucherAction::Reverse,
                from: current,
            }),
        }
    }

    /// Check if a status transition is valid under `policy`.
    #[must_use]
    pub fn is_valid_transition(
        from: VoucherStatus,
        to: VoucherStatus,
        voucher_type: VoucherType,
        policy: &PostingPolicy,
    ) -> bool {
        match (from, to) {
            (VoucherStatus::Draft, VoucherStatus::Submitted)
            | (VoucherStatus::Submitted, VoucherStatus::Approved)
            | (VoucherStatus::Posted, VoucherStatus::Reversed) => true,
            (_, VoucherStatus::Posted) => policy.can_post_from(voucher_type, from),
            _ => false,
        }
    }

    fn transition(action: VoucherAction, from: VoucherStatus, actor: UserId) -> Transition {
        Transition {
            action,
            from,
            to: action.target_status(),
            actor,
            at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_from_draft() {
        let actor = UserId::new();
        let transition = VoucherStateMachine::submit(VoucherStatus::Draft, actor).unwrap();
        assert_eq!(transition.from, VoucherStatus::Draft);
        assert_eq!(transition.to, VoucherStatus::Submitted);
        assert_eq!(transition.actor, actor);
    }

    #[test]
    fn test_submit_from_non_draft_fails() {
        for status in [
            VoucherStatus::Submitted,
            VoucherStatus::Approved,
            VoucherStatus::Posted,
            VoucherStatus::Reversed,
        ] {
            assert!(matches!(
                VoucherStateMachine::submit(status, UserId::new()),
                Err(WorkflowError::InvalidTransition { from, .. }) if from == status
            ));
        }
    }

    #[test]
    fn test_approve_from_submitted() {
        let transition =
            VoucherStateMachine::approve(VoucherStatus::Submitted, UserId::new()).unwrap();
        assert_eq!(transition.to, VoucherStatus::Approved);
    }

    #[test]
    fn test_approve_from_draft_fails() {
        assert!(VoucherStateMachine::approve(VoucherStatus::Draft, UserId::new()).is_err());
    }

    #[test]
    fn test_post_from_approved() {
        let transition = VoucherStateMachine::post(
            VoucherStatus::Approved,
            VoucherType::Journal,
            &PostingPolicy::default(),
            UserId::new(),
        )
        .unwrap();
        assert_eq!(transition.to, VoucherStatus::Posted);
    }

    #[test]
    fn test_post_from_draft_needs_direct_post_type() {
        let strict = PostingPolicy::default();
        assert!(VoucherStateMachine::post(
            VoucherStatus::Draft,
            VoucherType::Contra,
            &strict,
            UserId::new()
        )
        .is_err());

        let relaxed = PostingPolicy::with_direct_post([VoucherType::Contra]);
        let transition = VoucherStateMachine::post(
            VoucherStatus::Draft,
            VoucherType::Contra,
            &relaxed,
            UserId::new(),
        )
        .unwrap();
        assert_eq!(transition.from, VoucherStatus::Draft);
        assert_eq!(transition.to, VoucherStatus::Posted);
    }

    #[test]
    fn test_reverse_from_posted() {
        let transition =
            VoucherStateMachine::reverse(VoucherId::new(), VoucherStatus::Posted, UserId::new())
                .unwrap();
        assert_eq!(transition.to, VoucherStatus::Reversed);
    }

    #[test]
    fn test_reverse_twice_fails() {
        let voucher_id = VoucherId::new();
        let result =
            VoucherStateMachine::reverse(voucher_id, VoucherStatus::Reversed, UserId::new());
        assert!(matches!(result, Err(WorkflowError::AlreadyReversed(id)) if id == voucher_id));
    }

    #[test]
    fn test_reverse_unposted_fails() {
        let result =
            VoucherStateMachine::reverse(VoucherId::new(), VoucherStatus::Approved, UserId::new());
        assert!(matches!(
            result,
            Err(WorkflowError::InvalidTransition {
                action: VoucherAction::Reverse,
                ..
            })
        ));
    }
}
