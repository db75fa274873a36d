use std::fmt::Debug;

use log::*;

use crate::{
    db_types::CartItem,
    soe_api::validation::MAX_LINE_QUANTITY,
    traits::{CartApiError, CartManagement},
};

/// `CartApi` manages a shopper's cart.
///
/// The cart is advisory: adding an item reserves no stock. Stock is only checked and debited when an order is placed.
#[derive(Clone)]
pub struct CartApi<B> {
    db: B,
}

impl<B> Debug for CartApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CartApi")
    }
}

impl<B> CartApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

fn check_quantity(quantity: i64) -> Result<(), CartApiError> {
    if (1..=MAX_LINE_QUANTITY).contains(&quantity) {
        Ok(())
    } else {
        Err(CartApiError::InvalidQuantity { quantity, max: MAX_LINE_QUANTITY })
    }
}

impl<B> CartApi<B>
where B: CartManagement
{
    pub async fn cart(&self, user_id: i64) -> Result<Vec<CartItem>, CartApiError> {
        self.db.fetch_cart(user_id).await
    }

    /// Adds the product to the cart, increasing the quantity if it is already there. The combined quantity may not
    /// exceed [`MAX_LINE_QUANTITY`]; the store enforces this as part of the write.
    pub async fn add_to_cart(&self, user_id: i64, product_id: i64, quantity: i64) -> Result<CartItem, CartApiError> {
        check_quantity(quantity)?;
        let item = self.db.add_to_cart(user_id, product_id, quantity).await?;
        debug!("🛒️ User #{user_id} added {quantity} of product #{product_id} to their cart");
        Ok(item)
    }

    /// Sets the quantity of a product already in the cart. Returns `None` if it is not in the cart.
    pub async fn set_quantity(
        &self,
        user_id: i64,
        product_id: i64,
        quantity: i64,
    ) -> Result<Option<CartItem>, CartApiError> {
        check_quantity(quantity)?;
        self.db.set_cart_quantity(user_id, product_id, quantity).await
    }

    pub async fn remove_item(&self, user_id: i64, product_id: i64) -> Result<bool, CartApiError> {
        let removed = self.db.remove_cart_item(user_id, product_id).await?;
        if removed {
            debug!("🛒️ User #{user_id} removed product #{product_id} from their cart");
        }
        Ok(removed)
    }

    pub async fn clear_cart(&self, user_id: i64) -> Result<u64, CartApiError> {
        let removed = self.db.clear_cart(user_id).await?;
        debug!("🛒️ Cleared {removed} items from the cart of user #{user_id}");
        Ok(removed)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn cart_quantities_are_bounded() {
        assert!(check_quantity(1).is_ok());
        assert!(check_quantity(MAX_LINE_QUANTITY).is_ok());
        assert_eq!(check_quantity(0), Err(CartApiError::InvalidQuantity { quantity: 0, max: MAX_LINE_QUANTITY }));
        assert!(check_quantity(MAX_LINE_QUANTITY + 1).is_err());
    }
}
