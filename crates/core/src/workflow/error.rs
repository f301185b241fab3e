//! Workflow error types for the voucher lifecycle.

use girder_shared::types::VoucherId;
use thiserror::Error;

use crate::error::ErrorKind;
use crate::workflow::capability::{Capability, Resource, Role};
use crate::workflow::types::{VoucherAction, VoucherStatus};

/// Errors that can occur during workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The action is not allowed from the current status.
    #[error("Cannot {action} a voucher in status {from}")]
    InvalidTransition {
        /// The attempted action.
        action: VoucherAction,
        /// The current status.
        from: VoucherStatus,
    },

    /// The voucher has already been reversed.
    #[error("Voucher {0} has already been reversed")]
    AlreadyReversed(VoucherId),

    /// Reversing vouchers are final.
    #[error("Voucher {0} reverses another voucher and cannot be reversed")]
    ReversingVoucher(VoucherId),

    /// The actor's role does not grant the capability.
    #[error("Role {role} may not {capability} {resource}")]
    PermissionDenied {
        /// The actor's role.
        role: Role,
        /// The resource acted on.
        resource: Resource,
        /// The refused capability.
        capability: Capability,
    },

    /// Unknown voucher type in configuration.
    #[error("Unknown voucher type: {0}")]
    UnknownVoucherType(String),
}

impl WorkflowError {
    /// Returns the error category.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidTransition { .. }
            | Self::AlreadyReversed(_)
            | Self::ReversingVoucher(_) => ErrorKind::StateTransition,
            Self::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            Self::UnknownVoucherType(_) => ErrorKind::Validation,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::AlreadyReversed(_) => "ALREADY_REVERSED",
            Self::ReversingVoucher(_) => "REVERSING_VOUCHER",
            Self::PermissionDenied { .. } => "PERMISSION_DENIED",
            Self::UnknownVoucherType(_) => "UNKNOWN_VOUCHER_TYPE",
        }
    }
}
