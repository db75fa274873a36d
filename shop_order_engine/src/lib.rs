//! Shop Order Engine
//!
//! The order-processing and inventory-consistency core of the shop backend. Shoppers place multi-item orders
//! against a shared, finite inventory, and administrators drive those orders through fulfilment. Stock levels, order
//! totals and carts stay consistent under concurrent checkouts and partial failures.
//!
//! The library is divided into these main sections:
//! 1. Database management and control ([`mod@traits`] and [`mod@sqlite`]). The traits define what a backend must
//!    provide; SQLite is the supported backend. You should never need to access the database directly. Instead, use
//!    the public API provided by the engine. The exception is the data types used in the database. These are defined
//!    in the [`mod@db_types`] module and are public.
//! 2. The public API ([`mod@soe_api`]). This provides the order flow for shoppers, the admin gateway and cart
//!    management.
//! 3. Pure helpers: [`mod@pricing`] computes order totals and [`soe_api::status_machine`] decides which status changes
//!    are allowed.
//!
//! The engine also provides a set of events that can be subscribed to. These events are emitted after the action
//! that caused them has been committed. For example, when a new order is created, an `OrderCreatedEvent` is emitted.
//! A simple Actor framework is used so that you can easily hook into these events and perform custom actions, such as
//! sending shipment notifications (see [`mod@notifications`]).
pub mod config;
pub mod db_types;
pub mod events;
pub mod helpers;
pub mod notifications;
pub mod pricing;
pub mod soe_api;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use config::EngineConfig;
pub use soe_api::{admin_api::AdminApi, cart_api::CartApi, order_flow_api::OrderFlowApi, order_objects};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{
    AuthApiError,
    AuthManagement,
    CartApiError,
    CartManagement,
    InventoryLedger,
    LedgerError,
    NotificationLog,
    OrderFlowError,
    OrderManagement,
    ShopDatabase,
};
