use log::*;
use sqlx::SqliteConnection;

use crate::db_types::{NewNotificationFailure, NotificationFailure};

pub async fn insert_failure(
    failure: NewNotificationFailure,
    conn: &mut SqliteConnection,
) -> Result<NotificationFailure, sqlx::Error> {
    let failure: NotificationFailure = sqlx::query_as(
        r#"
            INSERT INTO notification_failures (order_id, recipient, subject, error)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(failure.order_id)
    .bind(failure.recipient)
    .bind(failure.subject)
    .bind(failure.error)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Notification failure #{} recorded for order #{}", failure.id, failure.order_id);
    Ok(failure)
}

pub async fn failures_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<NotificationFailure>, sqlx::Error> {
    let failures = sqlx::query_as("SELECT * FROM notification_failures WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(failures)
}
