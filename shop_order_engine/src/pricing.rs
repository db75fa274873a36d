//! # Pricing and totals
//!
//! Pure computation of order totals from the *current* product prices. Nothing in here touches the database, and
//! client-supplied prices are never an input.
//!
//! All arithmetic is done in integer [`Cents`]. The subtotal is exact; tax is the only quantity that can produce a
//! fractional cent, and it is rounded half-up exactly once. The total is then the plain sum of the three parts, so
//! `total == subtotal + tax + shipping` holds for every stored order.
use serde::{Deserialize, Serialize};
use shop_common::Cents;
use thiserror::Error;

use crate::db_types::Product;

pub const DEFAULT_TAX_RATE_BPS: i64 = 1_000;
pub const DEFAULT_FREE_SHIPPING_THRESHOLD: Cents = Cents::new(10_000);
pub const DEFAULT_FLAT_SHIPPING_FEE: Cents = Cents::new(1_000);

const BPS_DENOMINATOR: i64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("Order totals overflowed while pricing product {0}")]
    Overflow(i64),
    #[error("Product {0} has a negative price")]
    NegativePrice(i64),
    #[error("Invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: i64, quantity: i64 },
}

/// The shop-wide pricing constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingPolicy {
    /// Tax rate in basis points. 1000 bps = 10%.
    pub tax_rate_bps: i64,
    /// Orders with a subtotal at or above this value ship for free.
    pub free_shipping_threshold: Cents,
    /// Shipping fee charged below the threshold.
    pub flat_shipping_fee: Cents,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            tax_rate_bps: DEFAULT_TAX_RATE_BPS,
            free_shipping_threshold: DEFAULT_FREE_SHIPPING_THRESHOLD,
            flat_shipping_fee: DEFAULT_FLAT_SHIPPING_FEE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Cents,
    pub tax: Cents,
    pub shipping: Cents,
    pub total: Cents,
}

/// Calculates the totals for a set of (product snapshot, quantity) lines under the given policy.
pub fn calculate_totals<'a, I>(lines: I, policy: &PricingPolicy) -> Result<OrderTotals, PricingError>
where I: IntoIterator<Item = (&'a Product, i64)> {
    let mut subtotal = Cents::default();
    for (product, quantity) in lines {
        if quantity < 1 {
            return Err(PricingError::InvalidQuantity { product_id: product.id, quantity });
        }
        if product.price.is_negative() {
            return Err(PricingError::NegativePrice(product.id));
        }
        subtotal = product
            .price
            .checked_mul_qty(quantity)
            .and_then(|line| subtotal.checked_add(line))
            .ok_or(PricingError::Overflow(product.id))?;
    }
    let tax = tax_for(subtotal, policy.tax_rate_bps).ok_or(PricingError::Overflow(0))?;
    let shipping = shipping_for(subtotal, policy);
    let total = subtotal.checked_add(tax).and_then(|t| t.checked_add(shipping)).ok_or(PricingError::Overflow(0))?;
    Ok(OrderTotals { subtotal, tax, shipping, total })
}

/// Tax on a non-negative subtotal, rounded half-up to the nearest cent.
fn tax_for(subtotal: Cents, rate_bps: i64) -> Option<Cents> {
    let scaled = subtotal.value().checked_mul(rate_bps)?;
    let rounded = scaled.checked_add(BPS_DENOMINATOR / 2)? / BPS_DENOMINATOR;
    Some(Cents::from(rounded))
}

fn shipping_for(subtotal: Cents, policy: &PricingPolicy) -> Cents {
    if subtotal >= policy.free_shipping_threshold {
        Cents::default()
    } else {
        policy.flat_shipping_fee
    }
}
