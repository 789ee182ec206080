//! Franchise and store models.

use pizza_core::{Email, FranchiseId, Price, StoreId, UserId};
use serde::{Deserialize, Serialize};

/// A franchise with its admins and stores.
///
/// `admins` is only loaded for callers allowed to see the full detail and is
/// omitted from the JSON otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Franchise {
    pub id: FranchiseId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admins: Option<Vec<FranchiseAdmin>>,
    #[serde(default)]
    pub stores: Vec<Store>,
}

impl Franchise {
    /// Whether `user_id` is listed as an admin of this franchise.
    ///
    /// Always false when the admin list was not loaded.
    #[must_use]
    pub fn has_admin(&self, user_id: UserId) -> bool {
        self.admins
            .as_deref()
            .is_some_and(|admins| admins.iter().any(|admin| admin.id == user_id))
    }
}

/// A user holding the franchisee role for a franchise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FranchiseAdmin {
    pub id: UserId,
    pub name: String,
    pub email: Email,
}

/// A store of a franchise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: StoreId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub franchise_id: Option<FranchiseId>,
    pub name: String,
    /// Sum of the prices of every item ordered at this store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_revenue: Option<Price>,
}

/// Reference to a franchise admin by email.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminRef {
    pub email: Email,
}

/// Input for creating a franchise.
#[derive(Debug, Clone, Deserialize)]
pub struct NewFranchise {
    pub name: String,
    #[serde(default)]
    pub admins: Vec<AdminRef>,
}

/// Input for creating a store.
#[derive(Debug, Clone, Deserialize)]
pub struct NewStore {
    pub name: String,
}

/// One page of franchises.
#[derive(Debug, Clone, Serialize)]
pub struct FranchisePage {
    pub franchises: Vec<Franchise>,
    /// Whether a further page exists.
    pub more: bool,
}
