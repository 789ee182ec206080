//! Order models.

use chrono::{DateTime, Utc};
use pizza_core::{FranchiseId, MenuItemId, OrderId, OrderItemId, Price, StoreId, UserId};
use serde::{Deserialize, Serialize};

/// A placed order. Orders are immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    /// Cleared when the franchise is deleted.
    pub franchise_id: Option<FranchiseId>,
    /// Cleared when the franchise is deleted.
    pub store_id: Option<StoreId>,
    pub date: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Total price of the order.
    #[must_use]
    pub fn total(&self) -> Price {
        self.items.iter().map(|item| item.price).sum()
    }
}

/// A line of an order.
///
/// `description` and `price` are snapshots taken when the order was placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: OrderItemId,
    pub menu_id: MenuItemId,
    pub description: String,
    pub price: Price,
}

/// Input for placing an order.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub franchise_id: FranchiseId,
    pub store_id: StoreId,
    pub items: Vec<NewOrderItem>,
}

/// Input line of an order.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderItem {
    pub menu_id: MenuItemId,
    pub description: String,
    pub price: Price,
}

/// One page of a diner's orders.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderHistory {
    pub diner_id: UserId,
    pub orders: Vec<Order>,
    pub page: i64,
}
