//! Authorization policy.
//!
//! Pure decisions over a user's roles. The `authorize_*` functions return
//! grant values that only this module can construct; mutating data access
//! operations take a grant as their first argument, so a call site that skips
//! the check does not compile.

use pizza_core::{FranchiseId, Role, UserId};
use thiserror::Error;

use crate::models::{Franchise, User};

/// The requester lacks permission for the target operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("unauthorized")]
    Unauthorized,
}

/// Permission to perform admin-only operations.
#[derive(Debug)]
pub struct AdminGrant {
    _sealed: (),
}

/// Permission to manage the stores of one franchise.
#[derive(Debug)]
pub struct FranchiseGrant {
    franchise_id: FranchiseId,
}

impl FranchiseGrant {
    /// The franchise this grant applies to.
    #[must_use]
    pub const fn franchise_id(&self) -> FranchiseId {
        self.franchise_id
    }
}

/// Permission to read or modify one user's account data.
#[derive(Debug)]
pub struct UserGrant {
    user_id: UserId,
}

impl UserGrant {
    /// The user this grant applies to.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }
}

// =============================================================================
// Decisions
// =============================================================================

fn holds_admin(user: &User) -> bool {
    user.roles.iter().any(|role| match role {
        Role::Admin => true,
        Role::Diner | Role::FranchiseAdmin { .. } => false,
    })
}

/// Whether the user may see admins and revenue of every franchise.
#[must_use]
pub fn can_view_all_franchise_detail(user: &User) -> bool {
    holds_admin(user)
}

/// Whether the user may manage the stores of `franchise`.
///
/// Membership is decided by the franchise's loaded admin list; a franchisee
/// of another franchise is denied.
#[must_use]
pub fn can_manage_franchise(user: &User, franchise: &Franchise) -> bool {
    holds_admin(user) || franchise.has_admin(user.id)
}

/// Whether `requester` may list the franchises administered by `target`.
#[must_use]
pub fn can_access_user_franchises(requester: &User, target: UserId) -> bool {
    requester.id == target || holds_admin(requester)
}

/// Check that `requester` may update the account of `target`.
///
/// # Errors
///
/// Returns `PolicyError::Unauthorized` unless the requester is the target or
/// an admin.
pub fn can_update_user(requester: &User, target: UserId) -> Result<(), PolicyError> {
    if requester.id == target || holds_admin(requester) {
        Ok(())
    } else {
        Err(PolicyError::Unauthorized)
    }
}

// =============================================================================
// Grants
// =============================================================================

/// Authorize an admin-only operation.
///
/// # Errors
///
/// Returns `PolicyError::Unauthorized` if the user is not an admin.
pub fn authorize_admin(user: &User) -> Result<AdminGrant, PolicyError> {
    if holds_admin(user) {
        Ok(AdminGrant { _sealed: () })
    } else {
        Err(PolicyError::Unauthorized)
    }
}

/// Authorize store management for `franchise`.
///
/// # Errors
///
/// Returns `PolicyError::Unauthorized` unless [`can_manage_franchise`] holds.
pub fn authorize_franchise(
    user: &User,
    franchise: &Franchise,
) -> Result<FranchiseGrant, PolicyError> {
    if can_manage_franchise(user, franchise) {
        Ok(FranchiseGrant {
            franchise_id: franchise.id,
        })
    } else {
        Err(PolicyError::Unauthorized)
    }
}

/// Authorize access to the account of `target`.
///
/// # Errors
///
/// Returns `PolicyError::Unauthorized` unless [`can_update_user`] holds.
pub fn authorize_user(requester: &User, target: UserId) -> Result<UserGrant, PolicyError> {
    can_update_user(requester, target)?;
    Ok(UserGrant { user_id: target })
}
