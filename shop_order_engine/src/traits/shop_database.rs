use thiserror::Error;

use crate::{
    pricing::PricingError,
    soe_api::status_machine::InvalidTransition,
    traits::{
        AuthApiError,
        AuthManagement,
        CartApiError,
        CartManagement,
        InventoryLedger,
        LedgerError,
        NotificationLog,
        OrderManagement,
    },
};

/// This trait defines the highest level of behaviour for backends supporting the order engine.
///
/// A backend is cheap to clone (it is a handle to a connection pool), so that API objects and event handlers can
/// each hold their own copy.
#[allow(async_fn_in_trait)]
pub trait ShopDatabase:
    Clone + InventoryLedger + OrderManagement + CartManagement + AuthManagement + NotificationLog
{
    /// The URL of the database
    fn url(&self) -> &str;

    /// Closes the underlying connection pool. Outstanding connections are allowed to finish.
    async fn close(&mut self) -> Result<(), OrderFlowError> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderFlowError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The request is invalid. {0}")]
    ValidationFailed(String),
    #[error("Address {0} does not exist or does not belong to this user")]
    AddressNotFound(i64),
    #[error("Product {0} does not exist or is not for sale")]
    ProductNotFound(i64),
    #[error("Insufficient stock for product {product_id}. Requested {requested}, but only {available} available")]
    InsufficientStock { product_id: i64, requested: i64, available: i64 },
    #[error("Order {0} does not exist")]
    OrderNotFound(i64),
    #[error("{0}")]
    InvalidTransition(#[from] InvalidTransition),
    #[error("The user is not allowed to perform this action")]
    Forbidden,
    #[error("Could not generate a unique order number after {0} attempts")]
    OrderNumberExhausted(usize),
    #[error("The payment status for order {order_id} was changed by another request")]
    PaymentStatusConflict { order_id: i64 },
    #[error("Could not price the order. {0}")]
    PricingError(#[from] PricingError),
}

impl From<sqlx::Error> for OrderFlowError {
    fn from(e: sqlx::Error) -> Self {
        OrderFlowError::DatabaseError(e.to_string())
    }
}

impl From<LedgerError> for OrderFlowError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::DatabaseError(s) => OrderFlowError::DatabaseError(s),
            LedgerError::ProductNotFound(id) | LedgerError::ProductInactive(id) => OrderFlowError::ProductNotFound(id),
            LedgerError::InsufficientStock { product_id, requested, available } => {
                OrderFlowError::InsufficientStock { product_id, requested, available }
            },
            LedgerError::InvalidQuantity(q) => {
                OrderFlowError::ValidationFailed(format!("Quantities must be positive, but {q} was given"))
            },
        }
    }
}

impl From<AuthApiError> for OrderFlowError {
    fn from(e: AuthApiError) -> Self {
        match e {
            AuthApiError::DatabaseError(s) => OrderFlowError::DatabaseError(s),
            AuthApiError::RoleNotAllowed(_) | AuthApiError::UserNotFound(_) => OrderFlowError::Forbidden,
            AuthApiError::DuplicateEmail(email) => {
                OrderFlowError::ValidationFailed(format!("A user with email {email} already exists"))
            },
        }
    }
}

impl From<CartApiError> for OrderFlowError {
    fn from(e: CartApiError) -> Self {
        match e {
            CartApiError::DatabaseError(s) => OrderFlowError::DatabaseError(s),
            CartApiError::ProductNotFound(id) => OrderFlowError::ProductNotFound(id),
            CartApiError::OrderNotFound(id) => OrderFlowError::OrderNotFound(id),
            e @ CartApiError::InvalidQuantity { .. } => OrderFlowError::ValidationFailed(e.to_string()),
        }
    }
}
