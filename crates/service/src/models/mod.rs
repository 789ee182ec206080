//! Domain models for the pizza service.

pub mod franchise;
pub mod menu;
pub mod order;
pub mod user;

pub use franchise::{AdminRef, Franchise, FranchiseAdmin, FranchisePage, NewFranchise, NewStore, Store};
pub use menu::{MenuItem, NewMenuItem};
pub use order::{NewOrder, NewOrderItem, Order, OrderHistory, OrderItem};
pub use user::{NewUser, User, UserUpdate};
