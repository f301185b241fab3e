//! Roles, capabilities and the access policy seam.
//!
//! Authentication lives outside the engine: callers hand in an [`Actor`] and
//! the engine asks an [`AccessPolicy`] whether the actor's role may perform a
//! capability on a resource. [`RoleMatrix`] is the default policy.

use girder_shared::types::{CompanyId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::WorkflowError;

/// User roles within a company.
///
/// Roles are ordered by privilege level (higher = more privileges).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Read-only access.
    Viewer = 0,
    /// Can create and submit vouchers and record stock movements.
    Submitter = 1,
    /// Can approve vouchers and stock adjustments.
    Approver = 2,
    /// Can post and reverse vouchers.
    Accountant = 3,
    /// Full access except ownership transfer.
    Admin = 4,
    /// Full access.
    Owner = 5,
}

impl Role {
    /// Parse a role from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "viewer" => Some(Self::Viewer),
            "submitter" => Some(Self::Submitter),
            "approver" => Some(Self::Approver),
            "accountant" => Some(Self::Accountant),
            "admin" => Some(Self::Admin),
            "owner" => Some(Self::Owner),
            _ => None,
        }
    }

    /// Returns the string representation of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Viewer => "viewer",
            Self::Submitter => "submitter",
            Self::Approver => "approver",
            Self::Accountant => "accountant",
            Self::Admin => "admin",
            Self::Owner => "owner",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an actor wants to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    /// View.
    Read,
    /// Create or edit.
    Write,
    /// Approve vouchers and stock adjustments.
    Approve,
    /// Post vouchers.
    Post,
    /// Reverse posted vouchers and movements.
    Reverse,
}

impl Capability {
    /// Returns the string representation of the capability.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Approve => "approve",
            Self::Post => "post",
            Self::Reverse => "reverse",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an actor wants to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    /// Chart of accounts, vendors and stock item master data.
    MasterData,
    /// Vouchers and their lines.
    Voucher,
    /// Stock movements and balances.
    Stock,
    /// Vendor open items and allocations.
    Payables,
}

impl Resource {
    /// Returns the string representation of the resource.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MasterData => "master_data",
            Self::Voucher => "voucher",
            Self::Stock => "stock",
            Self::Payables => "payables",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decides whether a role may exercise a capability on a resource.
pub trait AccessPolicy: Send + Sync {
    /// Returns true if `role` may perform `capability` on `resource`.
    fn can(&self, role: Role, resource: Resource, capability: Capability) -> bool;
}

/// The default role matrix.
///
/// | Role       | Read | Write | Approve | Post | Reverse |
/// |------------|------|-------|---------|------|---------|
/// | Viewer     | yes  |       |         |      |         |
/// | Submitter  | yes  | yes   |         |      |         |
/// | Approver   | yes  | yes   | yes     |      |         |
/// | Accountant | yes  | yes   |         | yes  | yes     |
/// | Admin      | yes  | yes   | yes     | yes  | yes     |
/// | Owner      | yes  | yes   | yes     | yes  | yes     |
///
/// Master data writes are limited to accountants and above.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleMatrix;

impl AccessPolicy for RoleMatrix {
    fn can(&self, role: Role, resource: Resource, capability: Capability) -> bool {
        match (capability, resource) {
            (Capability::Read, _) => true,
            (Capability::Write, Resource::MasterData) => role >= Role::Accountant,
            (Capability::Write, _) => role >= Role::Submitter,
            (Capability::Approve, _) => {
                matches!(role, Role::Approver | Role::Admin | Role::Owner)
            }
            (Capability::Post | Capability::Reverse, _) => role >= Role::Accountant,
        }
    }
}

/// The authenticated caller of an engine operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    /// Calling user.
    pub user_id: UserId,
    /// Company the call is scoped to.
    pub company_id: CompanyId,
    /// The user's role in that company.
    pub role: Role,
}

impl Actor {
    /// Creates an actor.
    #[must_use]
    pub fn new(user_id: UserId, company_id: CompanyId, role: Role) -> Self {
        Self {
            user_id,
            company_id,
            role,
        }
    }

    /// Fails with `PermissionDenied` unless `policy` grants the capability.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::PermissionDenied` when the policy refuses.
    pub fn require(
        &self,
        policy: &dyn AccessPolicy,
        resource: Resource,
        capability: Capability,
    ) -> Result<(), WorkflowError> {
        if policy.can(self.role, resource, capability) {
            Ok(())
        } else {
            Err(WorkflowError::PermissionDenied {
                role: self.role,
                resource,
                capability,
            })
        }
    }
}
