//! Voucher workflow management.
//!
//! This module implements the voucher lifecycle state machine, the role and
//! capability model, the posting policy and reversal construction.
//!
//! # Modules
//!
//! - `types` - Workflow domain types (`VoucherStatus`, `VoucherAction`)
//! - `capability` - Roles, capabilities and the `AccessPolicy` seam
//! - `error` - Workflow-specific error types
//! - `posting` - Which statuses each voucher type may post from
//! - `service` - State transition logic
//! - `reversal` - Reversing voucher creation

pub mod capability;
pub mod error;
pub mod posting;
pub mod reversal;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use capability::{AccessPolicy, Actor, Capability, Resource, Role, RoleMatrix};
pub use error::WorkflowError;
pub use posting::PostingPolicy;
pub use reversal::{ReversalInput, ReversalOutput, ReversalService};
pub use service::VoucherStateMachine;
pub use types::{Transition, VoucherAction, VoucherStatus};
