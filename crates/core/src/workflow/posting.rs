//! Which statuses a voucher may be posted from.

use std::collections::BTreeSet;

use crate::ledger::VoucherType;
use crate::workflow::error::WorkflowError;
use crate::workflow::types::VoucherStatus;

/// Posting policy: approved vouchers post; configured types may skip approval.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostingPolicy {
    direct_post_types: BTreeSet<VoucherType>,
}

impl PostingPolicy {
    /// A policy where `types` may be posted straight from draft or submitted.
    #[must_use]
    pub fn with_direct_post(types: impl IntoIterator<Item = VoucherType>) -> Self {
        Self {
            direct_post_types: types.into_iter().collect(),
        }
    }

    /// Parses configured voucher type names.
    ///
    /// # Errors
    ///
    /// Returns `UnknownVoucherType` for a name that is not a voucher type.
    pub fn parse<S: AsRef<str>>(names: &[S]) -> Result<Self, WorkflowError> {
        let types = names
            .iter()
            .map(|name| {
                let name = name.as_ref().trim();
                VoucherType::parse(name)
                    .ok_or_else(|| WorkflowError::UnknownVoucherType(name.to_string()))
            })
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self {
            direct_post_types: types,
        })
    }

    /// Returns true if `voucher_type` skips the approval step.
    #[must_use]
    pub fn is_direct_post(&self, voucher_type: VoucherType) -> bool {
        self.direct_post_types.contains(&voucher_type)
    }

    /// Returns true if a voucher of `voucher_type` in `status` may be posted.
    #[must_use]
    pub fn can_post_from(&self, voucher_type: VoucherType, status: VoucherStatus) -> bool {
        match status {
            VoucherStatus::Approved => true,
            VoucherStatus::Draft | VoucherStatus::Submitted => self.is_direct_post(voucher_type),
            VoucherStatus::Posted | VoucherStatus::Reversed => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_requires_approval() {
        let policy = PostingPolicy::default();
        assert!(policy.can_post_from(VoucherType::Journal, VoucherStatus::Approved));
        assert!(!policy.can_post_from(VoucherType::Journal, VoucherStatus::Draft));
        assert!(!policy.can_post_from(VoucherType::Journal, VoucherStatus::Submitted));
    }

    #[test]
    fn test_direct_post_types_skip_approval() {
        let policy = PostingPolicy::with_direct_post([VoucherType::Contra]);
        assert!(policy.can_post_from(VoucherType::Contra, VoucherStatus::Draft));
        assert!(policy.can_post_from(VoucherType::Contra, VoucherStatus::Submitted));
        assert!(!policy.can_post_from(VoucherType::Journal, VoucherStatus::Draft));
    }

    #[test]
    fn test_posted_and_reversed_never_post() {
        let policy = PostingPolicy::with_direct_post([VoucherType::Contra]);
        assert!(!policy.can_post_from(VoucherType::Contra, VoucherStatus::Posted));
        assert!(!policy.can_post_from(VoucherType::Contra, VoucherStatus::Reversed));
    }

    #[test]
    fn test_parse_names() {
        let policy = PostingPolicy::parse(&["contra", " Receipt "]).unwrap();
        assert!(policy.is_direct_post(VoucherType::Contra));
        assert!(policy.is_direct_post(VoucherType::Receipt));
        assert!(!policy.is_direct_post(VoucherType::Payment));

        let err = PostingPolicy::parse(&["sales"]).unwrap_err();
        assert!(matches!(err, WorkflowError::UnknownVoucherType(name) if name == "sales"));
    }
}
