use log::*;
use sqlx::SqliteConnection;

use crate::db_types::{Address, NewAddress};

pub async fn insert_address(address: NewAddress, conn: &mut SqliteConnection) -> Result<Address, sqlx::Error> {
    let address: Address = sqlx::query_as(
        r#"
            INSERT INTO addresses (user_id, recipient, line1, line2, city, region, postal_code, country)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *;
        "#,
    )
    .bind(address.user_id)
    .bind(address.recipient)
    .bind(address.line1)
    .bind(address.line2)
    .bind(address.city)
    .bind(address.region)
    .bind(address.postal_code)
    .bind(address.country)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Address #{} added for user #{}", address.id, address.user_id);
    Ok(address)
}

/// Fetches the address only if it belongs to `user_id`. Someone else's address is indistinguishable from a missing
/// one.
pub async fn fetch_address_for_user(
    user_id: i64,
    address_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Address>, sqlx::Error> {
    let address = sqlx::query_as("SELECT * FROM addresses WHERE id = $1 AND user_id = $2")
        .bind(address_id)
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    Ok(address)
}
