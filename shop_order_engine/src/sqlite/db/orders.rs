use log::*;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{Order, OrderNumber, OrderStatusType, PaymentStatus},
    pricing::OrderTotals,
    soe_api::order_objects::OrderQueryFilter,
    traits::PageRequest,
};

/// The columns of a new order row, apart from the generated ones.
#[derive(Debug, Clone)]
pub struct OrderRow<'a> {
    pub order_number: &'a OrderNumber,
    pub user_id: i64,
    pub address_id: i64,
    pub totals: OrderTotals,
    pub payment_method: &'a str,
    pub notes: Option<&'a str>,
}

/// Inserts a new `Pending` order.
///
/// Returns `None` if the order number is already taken, in which case nothing was written and the caller should try
/// again with a fresh number. This is not atomic on its own; run it inside a transaction along with the order items.
pub async fn insert_order(row: OrderRow<'_>, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order: Option<Order> = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_number,
                user_id,
                address_id,
                subtotal,
                tax,
                shipping,
                total,
                payment_method,
                notes
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (order_number) DO NOTHING
            RETURNING *;
        "#,
    )
    .bind(row.order_number.as_str())
    .bind(row.user_id)
    .bind(row.address_id)
    .bind(row.totals.subtotal)
    .bind(row.totals.tax)
    .bind(row.totals.shipping)
    .bind(row.totals.total)
    .bind(row.payment_method)
    .bind(row.notes)
    .fetch_optional(conn)
    .await?;
    match &order {
        Some(o) => debug!("🗃️ Order {} inserted with id {}", o.order_number, o.id),
        None => debug!("🗃️ Order number {} is already taken", row.order_number),
    }
    Ok(order)
}

pub async fn fetch_order(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_by_number(
    number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE order_number = $1")
        .bind(number.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, query: &OrderQueryFilter) {
    if query.is_empty() {
        return;
    }
    builder.push(" WHERE ");
    let mut where_clause = builder.separated(" AND ");
    if let Some(user_id) = query.user_id {
        where_clause.push("user_id = ");
        where_clause.push_bind_unseparated(user_id);
    }
    if let Some(statuses) = query.status.as_ref().filter(|s| !s.is_empty()) {
        where_clause.push("status IN (");
        for (i, status) in statuses.iter().enumerate() {
            if i > 0 {
                where_clause.push_unseparated(", ");
            }
            where_clause.push_bind_unseparated(*status);
        }
        where_clause.push_unseparated(")");
    }
    if let Some(since) = query.since {
        where_clause.push("datetime(created_at) >= datetime(");
        where_clause.push_bind_unseparated(since);
        where_clause.push_unseparated(")");
    }
    if let Some(until) = query.until {
        where_clause.push("datetime(created_at) <= datetime(");
        where_clause.push_bind_unseparated(until);
        where_clause.push_unseparated(")");
    }
}

/// Counts the orders matching the filter.
pub async fn count_orders(query: &OrderQueryFilter, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM orders");
    push_filter(&mut builder, query);
    trace!("🗃️ Executing query: {}", builder.sql());
    let count: i64 = builder.build_query_scalar().fetch_one(conn).await?;
    Ok(count)
}

/// Fetches one page of orders matching the filter, newest first.
pub async fn search_orders(
    query: &OrderQueryFilter,
    page: PageRequest,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders");
    push_filter(&mut builder, query);
    builder.push(" ORDER BY created_at DESC, id DESC LIMIT ");
    builder.push_bind(i64::from(page.page_size));
    builder.push(" OFFSET ");
    builder.push_bind(page.offset());
    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("🗃️ Result of search_orders: {} orders", orders.len());
    Ok(orders)
}

/// All orders for the user, newest first.
pub async fn orders_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

/// Moves the order from `from` to `to` as a single compare-and-swap.
///
/// Returns `None` if the order does not exist or is no longer in status `from`. A tracking number, if given,
/// replaces the current one; a payment status, if given, is recorded alongside the status change.
pub async fn compare_and_set_status(
    id: i64,
    from: OrderStatusType,
    to: OrderStatusType,
    tracking_number: Option<&str>,
    payment_status: Option<PaymentStatus>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders SET
                status = $1,
                tracking_number = COALESCE($2, tracking_number),
                payment_status = COALESCE($3, payment_status),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $4 AND status = $5
            RETURNING *;
        "#,
    )
    .bind(to)
    .bind(tracking_number)
    .bind(payment_status)
    .bind(id)
    .bind(from)
    .fetch_optional(conn)
    .await?;
    if order.is_none() {
        trace!("🗃️ Order #{id} is not in status {from}. Status update to {to} skipped");
    }
    Ok(order)
}

/// Changes the payment status of an order, if it is still `expected`.
pub async fn compare_and_set_payment_status(
    id: i64,
    expected: PaymentStatus,
    new_status: PaymentStatus,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET payment_status = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND payment_status = $3
            RETURNING *;
        "#,
    )
    .bind(new_status)
    .bind(id)
    .bind(expected)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}
