//! Workflow domain types for the voucher lifecycle.

use chrono::{DateTime, Utc};
use girder_shared::types::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::capability::Capability;

/// Voucher status in the approval workflow.
///
/// The valid transitions are:
/// - Draft → Submitted (submit)
/// - Submitted → Approved (approve)
/// - Approved → Posted (post; Draft/Submitted too for direct-post types)
/// - Posted → Reversed (reverse)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoucherStatus {
    /// Voucher is being drafted and can be modified.
    Draft,
    /// Voucher has been submitted for approval.
    Submitted,
    /// Voucher has been approved and is ready for posting.
    Approved,
    /// Voucher has been posted to the ledger (immutable).
    Posted,
    /// Voucher has been reversed by a compensating voucher (immutable).
    Reversed,
}

impl VoucherStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::Approved => "approved",
            Self::Posted => "posted",
            Self::Reversed => "reversed",
        }
    }

    /// Parses a status from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "submitted" => Some(Self::Submitted),
            "approved" => Some(Self::Approved),
            "posted" => Some(Self::Posted),
            "reversed" => Some(Self::Reversed),
            _ => None,
        }
    }

    /// Returns true if the voucher content can be modified.
    #[must_use]
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Draft)
    }

    /// Returns true if the voucher content is frozen.
    #[must_use]
    pub fn is_immutable(&self) -> bool {
        matches!(self, Self::Posted | Self::Reversed)
    }
}

impl fmt::Display for VoucherStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A workflow action requested on a voucher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoucherAction {
    /// Draft → Submitted.
    Submit,
    /// Submitted → Approved.
    Approve,
    /// Approved → Posted.
    Post,
    /// Posted → Reversed.
    Reverse,
}

impl VoucherAction {
    /// Returns the string representation of the action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::Approve => "approve",
            Self::Post => "post",
            Self::Reverse => "reverse",
        }
    }

    /// The status a successful action leads to.
    #[must_use]
    pub fn target_status(&self) -> VoucherStatus {
        match self {
            Self::Submit => VoucherStatus::Submitted,
            Self::Approve => VoucherStatus::Approved,
            Self::Post => VoucherStatus::Posted,
            Self::Reverse => VoucherStatus::Reversed,
        }
    }

    /// The capability an actor needs to perform the action.
    #[must_use]
    pub fn required_capability(&self) -> Capability {
        match self {
            Self::Submit => Capability::Write,
            Self::Approve => Capability::Approve,
            Self::Post => Capability::Post,
            Self::Reverse => Capability::Reverse,
        }
    }
}

impl fmt::Display for VoucherAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A validated state transition with audit data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// The action performed.
    pub action: VoucherAction,
    /// Status before the action.
    pub from: VoucherStatus,
    /// Status after the action.
    pub to: VoucherStatus,
    /// Who performed it.
    pub actor: UserId,
    /// When it was performed.
    pub at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_as_str() {
        assert_eq!(VoucherStatus::Draft.as_str(), "draft");
        assert_eq!(VoucherStatus::Submitted.as_str(), "submitted");
        assert_eq!(VoucherStatus::Approved.as_str(), "approved");
        assert_eq!(VoucherStatus::Posted.as_str(), "posted");
        assert_eq!(VoucherStatus::Reversed.as_str(), "reversed");
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!(VoucherStatus::parse("draft"), Some(VoucherStatus::Draft));
        assert_eq!(
            VoucherStatus::parse("SUBMITTED"),
            Some(VoucherStatus::Submitted)
        );
        assert_eq!(
            VoucherStatus::parse("Approved"),
            Some(VoucherStatus::Approved)
        );
        assert_eq!(VoucherStatus::parse("posted"), Some(VoucherStatus::Posted));
        assert_eq!(
            VoucherStatus::parse("reversed"),
            Some(VoucherStatus::Reversed)
        );
        assert_eq!(VoucherStatus::parse("voided"), None);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(format!("{}", VoucherStatus::Draft), "draft");
        assert_eq!(format!("{}", VoucherStatus::Reversed), "reversed");
    }

    #[test]
    fn test_only_draft_is_editable() {
        assert!(VoucherStatus::Draft.is_editable());
        assert!(!VoucherStatus::Submitted.is_editable());
        assert!(!VoucherStatus::Approved.is_editable());
        assert!(!VoucherStatus::Posted.is_editable());
        assert!(!VoucherStatus::Reversed.is_editable());
    }

    #[test]
    fn test_status_immutable() {
        assert!(!VoucherStatus::Draft.is_immutable());
        assert!(!VoucherStatus::Approved.is_immutable());
        assert!(VoucherStatus::Posted.is_immutable());
        assert!(VoucherStatus::Reversed.is_immutable());
    }

    #[test]
    fn test_action_targets_and_capabilities() {
        assert_eq!(VoucherAction::Submit.target_status(), VoucherStatus::Submitted);
        assert_eq!(VoucherAction::Reverse.target_status(), VoucherStatus::Reversed);
        assert_eq!(VoucherAction::Submit.required_capability(), Capability::Write);
        assert_eq!(VoucherAction::Approve.required_capability(), Capability::Approve);
        assert_eq!(VoucherAction::Post.required_capability(), Capability::Post);
        assert_eq!(VoucherAction::Reverse.required_capability(), Capability::Reverse);
    }
}
