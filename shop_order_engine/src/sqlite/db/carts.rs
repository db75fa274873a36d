use log::*;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::db_types::CartItem;

pub async fn fetch_cart(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<CartItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM cart_items WHERE user_id = $1 ORDER BY id ASC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}

/// Adds the product to the user's cart, or increases the quantity if it is already there.
///
/// The combined quantity is capped at `max_quantity` by the upsert itself. Returns `None`, and changes nothing, if
/// adding `quantity` would take the row past the cap.
pub async fn upsert_item(
    user_id: i64,
    product_id: i64,
    quantity: i64,
    max_quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<CartItem>, sqlx::Error> {
    let item: Option<CartItem> = sqlx::query_as(
        r#"
            INSERT INTO cart_items (user_id, product_id, quantity) VALUES ($1, $2, $3)
            ON CONFLICT (user_id, product_id) DO UPDATE SET
                quantity = cart_items.quantity + excluded.quantity,
                updated_at = CURRENT_TIMESTAMP
            WHERE cart_items.quantity + excluded.quantity <= $4
            RETURNING *;
        "#,
    )
    .bind(user_id)
    .bind(product_id)
    .bind(quantity)
    .bind(max_quantity)
    .fetch_optional(conn)
    .await?;
    match &item {
        Some(item) => trace!("🛒️ User #{user_id} has {} of product #{product_id} in their cart", item.quantity),
        None => debug!("🛒️ Adding {quantity} of product #{product_id} would exceed the cart limit of {max_quantity}"),
    }
    Ok(item)
}

pub async fn set_quantity(
    user_id: i64,
    product_id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<CartItem>, sqlx::Error> {
    let item = sqlx::query_as(
        r#"
            UPDATE cart_items SET quantity = $1, updated_at = CURRENT_TIMESTAMP
            WHERE user_id = $2 AND product_id = $3
            RETURNING *;
        "#,
    )
    .bind(quantity)
    .bind(user_id)
    .bind(product_id)
    .fetch_optional(conn)
    .await?;
    Ok(item)
}

pub async fn remove_item(user_id: i64, product_id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let res = sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND product_id = $2")
        .bind(user_id)
        .bind(product_id)
        .execute(conn)
        .await?;
    Ok(res.rows_affected() > 0)
}

pub async fn clear_cart(user_id: i64, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let res = sqlx::query("DELETE FROM cart_items WHERE user_id = $1").bind(user_id).execute(conn).await?;
    Ok(res.rows_affected())
}

/// Deletes the user's cart rows for exactly the given products.
pub async fn remove_products(
    user_id: i64,
    product_ids: &[i64],
    conn: &mut SqliteConnection,
) -> Result<u64, sqlx::Error> {
    if product_ids.is_empty() {
        return Ok(0);
    }
    let mut builder = QueryBuilder::new("DELETE FROM cart_items WHERE user_id = ");
    builder.push_bind(user_id);
    builder.push(" AND product_id IN (");
    let mut ids = builder.separated(", ");
    for id in product_ids {
        ids.push_bind(*id);
    }
    builder.push(")");
    trace!("🛒️ Executing query: {}", builder.sql());
    let res = builder.build().execute(conn).await?;
    debug!("🛒️ Removed {} purchased items from the cart of user #{user_id}", res.rows_affected());
    Ok(res.rows_affected())
}
