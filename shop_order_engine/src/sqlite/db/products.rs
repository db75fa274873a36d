//! Inventory ledger primitives.
//!
//! Stock is only ever changed by the single conditional statements in [`debit`] and [`credit`]. There is no
//! read-modify-write path, so two connections debiting the same product can never both succeed on the last unit.
use log::*;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Availability, NewProduct, Product},
    traits::LedgerError,
};

pub async fn fetch_product(id: i64, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product = sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(product)
}

pub async fn insert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<Product, LedgerError> {
    if product.stock < 0 {
        return Err(LedgerError::InvalidQuantity(product.stock));
    }
    let product: Product = sqlx::query_as(
        r#"
            INSERT INTO products (name, image, price, stock, is_active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(product.name)
    .bind(product.image)
    .bind(product.price)
    .bind(product.stock)
    .bind(product.is_active)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Product #{} ({}) added with {} units in stock", product.id, product.name, product.stock);
    Ok(product)
}

pub async fn set_active(id: i64, active: bool, conn: &mut SqliteConnection) -> Result<Product, LedgerError> {
    let product: Option<Product> = sqlx::query_as(
        "UPDATE products SET is_active = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *",
    )
    .bind(active)
    .bind(id)
    .fetch_optional(conn)
    .await?;
    product.ok_or(LedgerError::ProductNotFound(id))
}

pub async fn check_availability(
    id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<Availability, LedgerError> {
    if quantity < 1 {
        return Err(LedgerError::InvalidQuantity(quantity));
    }
    let availability = match fetch_product(id, conn).await? {
        None => Availability::NotFound,
        Some(p) if !p.is_active => Availability::Inactive,
        Some(p) if p.stock < quantity => Availability::Insufficient { available: p.stock },
        Some(_) => Availability::Available,
    };
    Ok(availability)
}

/// Decrements the stock of the product by `quantity` if, and only if, the product is active and has enough stock.
///
/// When the conditional update matches nothing, the product is re-read on the same connection purely to report
/// *why* the debit failed.
pub async fn debit(id: i64, quantity: i64, conn: &mut SqliteConnection) -> Result<Product, LedgerError> {
    if quantity < 1 {
        return Err(LedgerError::InvalidQuantity(quantity));
    }
    let updated: Option<Product> = sqlx::query_as(
        r#"
            UPDATE products
            SET stock = stock - $1, sold_count = sold_count + $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND is_active = 1 AND stock >= $1
            RETURNING *;
        "#,
    )
    .bind(quantity)
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    if let Some(product) = updated {
        trace!("🗃️ Debited {quantity} units of product #{id}. {} left", product.stock);
        return Ok(product);
    }
    let err = match fetch_product(id, conn).await? {
        None => LedgerError::ProductNotFound(id),
        Some(p) if !p.is_active => LedgerError::ProductInactive(id),
        Some(p) => LedgerError::InsufficientStock { product_id: id, requested: quantity, available: p.stock },
    };
    debug!("🗃️ Could not debit {quantity} units of product #{id}. {err}");
    Err(err)
}

/// Returns `quantity` units of the product to stock. The sold count is floored at zero.
///
/// Credits are allowed on inactive products, since they reverse an earlier sale.
pub async fn credit(id: i64, quantity: i64, conn: &mut SqliteConnection) -> Result<Product, LedgerError> {
    if quantity < 1 {
        return Err(LedgerError::InvalidQuantity(quantity));
    }
    let updated: Option<Product> = sqlx::query_as(
        r#"
            UPDATE products
            SET stock = stock + $1, sold_count = MAX(sold_count - $1, 0), updated_at = CURRENT_TIMESTAMP
            WHERE id = $2
            RETURNING *;
        "#,
    )
    .bind(quantity)
    .bind(id)
    .fetch_optional(conn)
    .await?;
    let product = updated.ok_or(LedgerError::ProductNotFound(id))?;
    trace!("🗃️ Credited {quantity} units to product #{id}. {} in stock", product.stock);
    Ok(product)
}
