//! User roles.
//!
//! A role assignment is persisted as a `(role, object_id)` pair in the
//! `user_role` table. In memory it is a closed enum so that authorization
//! code matches exhaustively instead of comparing strings.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use super::id::FranchiseId;

/// The tag stored in the `user_role.role` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleKind {
    /// Places orders, manages own profile.
    Diner,
    /// Manages menus, franchises, stores and users.
    Admin,
    /// Manages the stores of one franchise.
    Franchisee,
}

impl RoleKind {
    /// The database/wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Diner => "diner",
            Self::Admin => "admin",
            Self::Franchisee => "franchisee",
        }
    }
}

impl fmt::Display for RoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a role from its stored representation.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RoleError {
    /// The role tag is not one of `diner`, `admin`, `franchisee`.
    #[error("unknown role: {0}")]
    UnknownKind(String),
    /// A franchisee row without the franchise it is scoped to.
    #[error("franchisee role requires a franchise id")]
    MissingScope,
}

impl FromStr for RoleKind {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "diner" => Ok(Self::Diner),
            "admin" => Ok(Self::Admin),
            "franchisee" => Ok(Self::Franchisee),
            other => Err(RoleError::UnknownKind(other.to_owned())),
        }
    }
}

/// A role held by a user.
///
/// Serializes the way clients expect: `{"role":"diner"}`, `{"role":"admin"}`,
/// `{"role":"franchisee","objectId":7}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "role")]
pub enum Role {
    /// Default role of every registered user.
    #[serde(rename = "diner")]
    Diner,
    /// Unscoped administrator.
    #[serde(rename = "admin")]
    Admin,
    /// Administrator of a single franchise.
    #[serde(rename = "franchisee")]
    FranchiseAdmin {
        /// The franchise this role is scoped to.
        #[serde(rename = "objectId")]
        franchise_id: FranchiseId,
    },
}

impl Role {
    /// Rebuild a role from a `user_role` row.
    ///
    /// The object id of unscoped roles is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`RoleError::MissingScope`] for a franchisee row without an
    /// object id.
    pub fn from_parts(kind: RoleKind, object_id: Option<FranchiseId>) -> Result<Self, RoleError> {
        match kind {
            RoleKind::Diner => Ok(Self::Diner),
            RoleKind::Admin => Ok(Self::Admin),
            RoleKind::Franchisee => object_id
                .map(|franchise_id| Self::FranchiseAdmin { franchise_id })
                .ok_or(RoleError::MissingScope),
        }
    }

    /// The tag of this role.
    #[must_use]
    pub const fn kind(&self) -> RoleKind {
        match self {
            Self::Diner => RoleKind::Diner,
            Self::Admin => RoleKind::Admin,
            Self::FranchiseAdmin { .. } => RoleKind::Franchisee,
        }
    }

    /// The franchise a scoped role applies to.
    #[must_use]
    pub const fn object_id(&self) -> Option<FranchiseId> {
        match self {
            Self::Diner | Self::Admin => None,
            Self::FranchiseAdmin { franchise_id } => Some(*franchise_id),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape() {
        assert_eq!(
            serde_json::to_string(&Role::Diner).unwrap(),
            r#"{"role":"diner"}"#
        );
        assert_eq!(
            serde_json::to_string(&Role::Admin).unwrap(),
            r#"{"role":"admin"}"#
        );
        assert_eq!(
            serde_json::to_string(&Role::FranchiseAdmin {
                franchise_id: FranchiseId::new(7)
            })
            .unwrap(),
            r#"{"role":"franchisee","objectId":7}"#
        );
    }

    #[test]
    fn test_json_parse() {
        let role: Role = serde_json::from_str(r#"{"role":"franchisee","objectId":3}"#).unwrap();
        assert_eq!(
            role,
            Role::FranchiseAdmin {
                franchise_id: FranchiseId::new(3)
            }
        );
        assert!(serde_json::from_str::<Role>(r#"{"role":"franchisee"}"#).is_err());
        assert!(serde_json::from_str::<Role>(r#"{"role":"owner"}"#).is_err());
    }

    #[test]
    fn test_from_parts() {
        assert_eq!(Role::from_parts(RoleKind::Diner, None).unwrap(), Role::Diner);
        assert_eq!(
            Role::from_parts(RoleKind::Admin, Some(FranchiseId::new(1))).unwrap(),
            Role::Admin
        );
        assert_eq!(
            Role::from_parts(RoleKind::Franchisee, None),
            Err(RoleError::MissingScope)
        );

        let scoped = Role::from_parts(RoleKind::Franchisee, Some(FranchiseId::new(9))).unwrap();
        assert_eq!(scoped.kind(), RoleKind::Franchisee);
        assert_eq!(scoped.object_id(), Some(FranchiseId::new(9)));
    }

    #[test]
    fn test_kind_round_trips_through_str() {
        for kind in [RoleKind::Diner, RoleKind::Admin, RoleKind::Franchisee] {
            assert_eq!(kind.as_str().parse::<RoleKind>().unwrap(), kind);
        }
        assert!("chef".parse::<RoleKind>().is_err());
    }
}
