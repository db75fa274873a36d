use log::*;
use sqlx::SqliteConnection;

use crate::db_types::{NewOrderItem, OrderItem, Product};

/// Inserts a line item, snapshotting the product's current name, image and price.
pub async fn insert_item(
    order_id: i64,
    item: &NewOrderItem,
    product: &Product,
    conn: &mut SqliteConnection,
) -> Result<OrderItem, sqlx::Error> {
    let total = product.price.value() * item.quantity;
    let item: OrderItem = sqlx::query_as(
        r#"
            INSERT INTO order_items (
                order_id,
                product_id,
                product_name,
                product_image,
                quantity,
                price,
                total,
                color,
                size,
                note
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(product.id)
    .bind(&product.name)
    .bind(&product.image)
    .bind(item.quantity)
    .bind(product.price)
    .bind(total)
    .bind(&item.color)
    .bind(&item.size)
    .bind(&item.note)
    .fetch_one(conn)
    .await?;
    trace!("🗃️ Item #{} ({} x product #{}) added to order #{order_id}", item.id, item.quantity, item.product_id);
    Ok(item)
}

pub async fn fetch_items_for_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}
