use thiserror::Error;

use crate::db_types::CartItem;

#[allow(async_fn_in_trait)]
pub trait CartManagement {
    /// All cart rows for the user, oldest first.
    async fn fetch_cart(&self, user_id: i64) -> Result<Vec<CartItem>, CartApiError>;

    /// Adds `quantity` units of the product to the cart. If the product is already in the cart, the quantities are
    /// added together. If the combined quantity would exceed the per-line limit, [`CartApiError::InvalidQuantity`] is
    /// returned and the cart is left as it was.
    async fn add_to_cart(&self, user_id: i64, product_id: i64, quantity: i64) -> Result<CartItem, CartApiError>;

    /// Sets the quantity of a cart row. Returns `None` if the product is not in the cart.
    async fn set_cart_quantity(
        &self,
        user_id: i64,
        product_id: i64,
        quantity: i64,
    ) -> Result<Option<CartItem>, CartApiError>;

    /// Removes a single product from the cart. Returns whether a row was deleted.
    async fn remove_cart_item(&self, user_id: i64, product_id: i64) -> Result<bool, CartApiError>;

    /// Empties the cart, returning the number of rows removed.
    async fn clear_cart(&self, user_id: i64) -> Result<u64, CartApiError>;

    /// Removes exactly the user's cart rows for the given products, leaving everything else in the cart alone.
    /// Running it twice is harmless: the second call finds nothing to delete.
    async fn remove_purchased_items(&self, user_id: i64, product_ids: &[i64]) -> Result<u64, CartApiError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Product {0} does not exist or is not for sale")]
    ProductNotFound(i64),
    #[error("Cart quantities must be between 1 and {max}, but {quantity} was given")]
    InvalidQuantity { quantity: i64, max: i64 },
    #[error("Order {0} does not exist")]
    OrderNotFound(i64),
}

impl From<sqlx::Error> for CartApiError {
    fn from(e: sqlx::Error) -> Self {
        CartApiError::DatabaseError(e.to_string())
    }
}
