//! # Store backends
//!
//! This module defines the interface contracts that a storage backend must honour to be used by the order engine.
//!
//! ## Inventory
//! The [`InventoryLedger`] is the only component that may change a product's `stock` or `sold_count`. It exposes
//! atomic conditional operations only: a debit is a single "decrement if enough stock" statement, never a read
//! followed by a write.
//!
//! ## Orders
//! [`OrderManagement`] persists orders. Placing an order is one atomic unit of work: the address check, the price
//! snapshot, the order and item rows, every ledger debit and the cart reconciliation either all commit, or none do.
//! Status changes are compare-and-swap updates on the current status, carried out in the same transaction as any
//! stock credits they imply.
//!
//! ## Traits
//! * [`ShopDatabase`] is the umbrella trait for a complete backend.
//! * [`InventoryLedger`] manages product stock counts.
//! * [`OrderManagement`] stores and transitions orders.
//! * [`CartManagement`] manages shopping cart rows.
//! * [`AuthManagement`] resolves users, roles and address ownership.
//! * [`NotificationLog`] records notifications that could not be delivered.
mod auth_management;
mod cart_management;
mod data_objects;
mod inventory_ledger;
mod notification_log;
mod order_management;
mod shop_database;

pub use auth_management::{AuthApiError, AuthManagement};
pub use cart_management::{CartApiError, CartManagement};
pub use data_objects::{OrderPage, PageRequest, Pagination};
pub use inventory_ledger::{InventoryLedger, LedgerError};
pub use notification_log::NotificationLog;
pub use order_management::OrderManagement;
pub use shop_database::{OrderFlowError, ShopDatabase};
