//! # Shop order engine public API
//!
//! The `soe_api` module exposes the programmatic API for the order engine.
//! The API is modular, so that clients of the API can pick and choose the functionality they want.
//!
//! * [`order_flow_api`] is the shopper-facing API for placing, viewing and cancelling orders.
//! * [`admin_api`] lets administrators list orders, move them through fulfilment and record payment outcomes.
//! * [`cart_api`] manages shopping carts.
//! * [`status_machine`] decides which status changes are allowed and what side effects they have.
//!
//! # API usage
//!
//! The pattern for using all the APIs is the same. An API instance is created by supplying a database backend that
//! implements the specific backend traits required by the API.
//!
//! ```rust,ignore
//! use shop_order_engine::{events::EventProducers, OrderFlowApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let api = OrderFlowApi::new(db, EventProducers::default());
//! let order = api.create_order(new_order).await?;
//! ```
pub mod admin_api;
pub mod cart_api;
pub mod order_flow_api;
pub mod order_objects;
pub mod status_machine;
pub mod validation;
