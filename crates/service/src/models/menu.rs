//! Menu models.

use pizza_core::{MenuItemId, Price};
use serde::{Deserialize, Serialize};

/// A pizza on the menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: MenuItemId,
    pub title: String,
    pub description: String,
    pub image: String,
    pub price: Price,
}

/// Input for adding a menu item.
#[derive(Debug, Clone, Deserialize)]
pub struct NewMenuItem {
    pub title: String,
    pub description: String,
    pub image: String,
    pub price: Price,
}
