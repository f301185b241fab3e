//! Property-based tests for the voucher state machine.
//!
//! Transitions are forward-only and every successful transition agrees with
//! `is_valid_transition`.

use girder_shared::types::{UserId, VoucherId};
use proptest::prelude::*;

use super::posting::PostingPolicy;
use super::service::VoucherStateMachine;
use super::types::{VoucherAction, VoucherStatus};
use crate::ledger::VoucherType;

fn status_strategy() -> impl Strategy<Value = VoucherStatus> {
    prop_oneof![
        Just(VoucherStatus::Draft),
        Just(VoucherStatus::Submitted),
        Just(VoucherStatus::Approved),
        Just(VoucherStatus::Posted),
        Just(VoucherStatus::Reversed),
    ]
}

fn action_strategy() -> impl Strategy<Value = VoucherAction> {
    prop_oneof![
        Just(VoucherAction::Submit),
        Just(VoucherAction::Approve),
        Just(VoucherAction::Post),
        Just(VoucherAction::Reverse),
    ]
}

fn voucher_type_strategy() -> impl Strategy<Value = VoucherType> {
    prop_oneof![
        Just(VoucherType::Receipt),
        Just(VoucherType::Payment),
        Just(VoucherType::Journal),
        Just(VoucherType::Purchase),
        Just(VoucherType::Contra),
    ]
}

fn rank(status: VoucherStatus) -> u8 {
    match status {
        VoucherStatus::Draft => 0,
        VoucherStatus::Submitted => 1,
        VoucherStatus::Approved => 2,
        VoucherStatus::Posted => 3,
        VoucherStatus::Reversed => 4,
    }
}

fn apply(
    action: VoucherAction,
    status: VoucherStatus,
    voucher_type: VoucherType,
    policy: &PostingPolicy,
) -> Option<VoucherStatus> {
    let actor = UserId::new();
    let result = match action {
        VoucherAction::Submit => VoucherStateMachine::submit(status, actor),
        VoucherAction::Approve => VoucherStateMachine::approve(status, actor),
        VoucherAction::Post => VoucherStateMachine::post(status, voucher_type, policy, actor),
        VoucherAction::Reverse => VoucherStateMachine::reverse(VoucherId::new(), status, actor),
    };
    result.ok().map(|transition| transition.to)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Status rank strictly increases on every successful transition.
    #[test]
    fn prop_transitions_move_forward(
        status in status_strategy(),
        action in action_strategy(),
        voucher_type in voucher_type_strategy(),
        direct in any::<bool>(),
    ) {
        let policy = if direct {
            PostingPolicy::with_direct_post([voucher_type])
        } else {
            PostingPolicy::default()
        };
        if let Some(next) = apply(action, status, voucher_type, &policy) {
            prop_assert!(rank(next) > rank(status));
            prop_assert!(VoucherStateMachine::is_valid_transition(
                status,
                next,
                voucher_type,
                &policy
            ));
        }
    }

    /// A reversed voucher accepts no further action.
    #[test]
    fn prop_reversed_is_terminal(
        action in action_strategy(),
        voucher_type in voucher_type_strategy()
    ) {
        let policy = PostingPolicy::with_direct_post([voucher_type]);
        prop_assert!(apply(action, VoucherStatus::Reversed, voucher_type, &policy).is_none());
    }

    /// Any random walk of actions ends in a reachable status and never skips approval
    /// for types outside the direct-post set.
    #[test]
    fn prop_random_walk_respects_approval(
        actions in prop::collection::vec(action_strategy(), 1..12),
        voucher_type in voucher_type_strategy(),
    ) {
        let policy = PostingPolicy::default();
        let mut status = VoucherStatus::Draft;
        let mut approved = false;
        for action in actions {
            if let Some(next) = apply(action, status, voucher_type, &policy) {
                if next == VoucherStatus::Approved {
                    approved = true;
                }
                if next == VoucherStatus::Posted {
                    prop_assert!(approved);
                }
                status = next;
            }
        }
    }
}
