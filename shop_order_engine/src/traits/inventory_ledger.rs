use thiserror::Error;

use crate::db_types::{Availability, NewProduct, Product};

/// The authoritative record of per-product stock.
///
/// Every mutation is a single conditional statement against one product row, so concurrent debits against the same
/// product serialise in the store and can never drive stock below zero.
#[allow(async_fn_in_trait)]
pub trait InventoryLedger {
    /// Fetches the current product row, or `None` if the product does not exist.
    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, LedgerError>;

    /// Adds a new product to the catalogue with its opening stock.
    async fn insert_product(&self, product: NewProduct) -> Result<Product, LedgerError>;

    /// Activates or deactivates a product. Inactive products cannot be debited.
    async fn set_product_active(&self, product_id: i64, active: bool) -> Result<Product, LedgerError>;

    /// Reports whether `quantity` units of the product could be debited right now. This is advisory only; the
    /// authoritative check is the conditional [`debit`](Self::debit) itself.
    async fn check_availability(&self, product_id: i64, quantity: i64) -> Result<Availability, LedgerError>;

    /// Atomically decrements stock by `quantity` and increments the sold count, if and only if the product is active
    /// and has at least `quantity` units in stock.
    ///
    /// A [`LedgerError::InsufficientStock`] here means the stock changed underneath the caller. It is safe to retry,
    /// but the engine never waits for stock to appear.
    async fn debit(&self, product_id: i64, quantity: i64) -> Result<Product, LedgerError>;

    /// Reverses a prior debit: increments stock and decrements the sold count (never below zero).
    async fn credit(&self, product_id: i64, quantity: i64) -> Result<Product, LedgerError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Product {0} does not exist")]
    ProductNotFound(i64),
    #[error("Product {0} is not available for sale")]
    ProductInactive(i64),
    #[error("Insufficient stock for product {product_id}. Requested {requested}, but only {available} available")]
    InsufficientStock { product_id: i64, requested: i64, available: i64 },
    #[error("Quantities must be positive, but {0} was given")]
    InvalidQuantity(i64),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::DatabaseError(e.to_string())
    }
}
