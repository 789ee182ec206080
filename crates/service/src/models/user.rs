//! User models.

use pizza_core::{Email, Role, RoleKind, UserId};
use serde::{Deserialize, Serialize};

/// A registered user with the roles attached to the account.
///
/// The password hash never leaves the data access layer, so this type has no
/// field for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub roles: Vec<Role>,
}

impl User {
    /// Whether the user holds a role of the given kind.
    #[must_use]
    pub fn is_role(&self, kind: RoleKind) -> bool {
        self.roles.iter().any(|role| role.kind() == kind)
    }

    /// Whether the user holds the unscoped admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|role| matches!(role, Role::Admin))
    }
}

/// Input for creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: Email,
    pub password: String,
    /// Roles to attach; an empty list means [`Role::Diner`].
    pub roles: Vec<Role>,
}

/// A partial profile update. Only the supplied fields are written.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<Email>,
    pub password: Option<String>,
}

impl UserUpdate {
    /// Whether the update touches no column.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.password.is_none()
    }
}
