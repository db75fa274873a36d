//! `SqliteDatabase` is a concrete implementation of an order engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`traits`] module.
//!
//! Every write that has to be atomic runs in a transaction opened with `BEGIN IMMEDIATE`. That takes SQLite's write
//! lock up front, so two checkouts cannot both read the same stock level and then race to write it; the second one
//! waits (up to the busy timeout) and then sees the first one's debit.
//!
//! [`traits`]: crate::traits
use std::{collections::HashMap, fmt::Debug};

use chrono::Utc;
use log::*;
use sqlx::{migrate::MigrateError, Sqlite, SqlitePool, Transaction};

use super::db::{addresses, auth, carts, db_url, new_pool, notifications, order_items, orders, products};
use crate::{
    db_types::{
        Address,
        Availability,
        CartItem,
        FullOrder,
        NewAddress,
        NewNotificationFailure,
        NewOrder,
        NewProduct,
        NewUser,
        NotificationFailure,
        Order,
        OrderItem,
        OrderNumber,
        PaymentStatus,
        Product,
        Role,
        User,
    },
    helpers::generate_order_number,
    pricing::{calculate_totals, PricingPolicy},
    soe_api::{
        order_objects::OrderQueryFilter,
        status_machine::{InvalidTransition, TransitionPlan},
        validation::MAX_LINE_QUANTITY,
    },
    sqlite::db::orders::OrderRow,
    traits::{
        AuthApiError,
        AuthManagement,
        CartApiError,
        CartManagement,
        InventoryLedger,
        LedgerError,
        NotificationLog,
        OrderFlowError,
        OrderManagement,
        OrderPage,
        PageRequest,
        Pagination,
        ShopDatabase,
    },
};

/// How many fresh order numbers are tried before giving up on an insert.
pub const MAX_ORDER_NUMBER_ATTEMPTS: usize = 5;

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date.
    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Migrations complete");
        Ok(())
    }

    /// Starts a transaction that holds the database write lock from the start.
    async fn begin_write(&self) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
        self.pool.begin_with("BEGIN IMMEDIATE").await
    }
}

impl ShopDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn close(&mut self) -> Result<(), OrderFlowError> {
        self.pool.close().await;
        Ok(())
    }
}

impl InventoryLedger for SqliteDatabase {
    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product(product_id, &mut conn).await?;
        Ok(product)
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        products::insert_product(product, &mut conn).await
    }

    async fn set_product_active(&self, product_id: i64, active: bool) -> Result<Product, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        products::set_active(product_id, active, &mut conn).await
    }

    async fn check_availability(&self, product_id: i64, quantity: i64) -> Result<Availability, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        products::check_availability(product_id, quantity, &mut conn).await
    }

    async fn debit(&self, product_id: i64, quantity: i64) -> Result<Product, LedgerError> {
        let mut tx = self.begin_write().await?;
        let product = products::debit(product_id, quantity, &mut tx).await?;
        tx.commit().await?;
        Ok(product)
    }

    async fn credit(&self, product_id: i64, quantity: i64) -> Result<Product, LedgerError> {
        let mut tx = self.begin_write().await?;
        let product = products::credit(product_id, quantity, &mut tx).await?;
        tx.commit().await?;
        Ok(product)
    }
}

impl OrderManagement for SqliteDatabase {
    /// Takes a validated order request, and in a single atomic transaction,
    /// * checks that the shipping address belongs to the user,
    /// * loads each product in request order and checks that the (cumulative) quantity can be covered,
    /// * prices the order from the product rows just read,
    /// * inserts the order under a fresh order number, retrying on the rare number collision,
    /// * inserts the line items with their price snapshots and debits the ledger for each one,
    /// * removes the purchased products from the user's cart.
    ///
    /// Returning early on any error drops the transaction, which rolls back every debit made so far.
    async fn place_order(&self, order: NewOrder, pricing: &PricingPolicy) -> Result<FullOrder, OrderFlowError> {
        let mut tx = self.begin_write().await?;
        addresses::fetch_address_for_user(order.user_id, order.address_id, &mut tx)
            .await?
            .ok_or(OrderFlowError::AddressNotFound(order.address_id))?;

        let mut snapshots = Vec::with_capacity(order.items.len());
        let mut requested = HashMap::<i64, i64>::with_capacity(order.items.len());
        for item in &order.items {
            let product = products::fetch_product(item.product_id, &mut tx)
                .await?
                .filter(|p| p.is_active)
                .ok_or(OrderFlowError::ProductNotFound(item.product_id))?;
            let wanted = requested.entry(product.id).or_insert(0);
            *wanted = wanted.saturating_add(item.quantity);
            if product.stock < *wanted {
                debug!("📦️ Product #{} has {} in stock, but {} were requested", product.id, product.stock, *wanted);
                return Err(OrderFlowError::InsufficientStock {
                    product_id: product.id,
                    requested: *wanted,
                    available: product.stock,
                });
            }
            snapshots.push(product);
        }
        let totals = calculate_totals(snapshots.iter().zip(order.items.iter().map(|i| i.quantity)), pricing)?;

        let mut inserted = None;
        for attempt in 1..=MAX_ORDER_NUMBER_ATTEMPTS {
            let order_number = generate_order_number(Utc::now());
            let row = OrderRow {
                order_number: &order_number,
                user_id: order.user_id,
                address_id: order.address_id,
                totals,
                payment_method: order.payment_method.as_str(),
                notes: order.notes.as_deref(),
            };
            if let Some(o) = orders::insert_order(row, &mut tx).await? {
                inserted = Some(o);
                break;
            }
            warn!("📦️ Order number {order_number} collided with an existing order (attempt {attempt})");
        }
        let new_order = inserted.ok_or(OrderFlowError::OrderNumberExhausted(MAX_ORDER_NUMBER_ATTEMPTS))?;

        let mut items = Vec::with_capacity(order.items.len());
        for (item, product) in order.items.iter().zip(&snapshots) {
            items.push(order_items::insert_item(new_order.id, item, product, &mut tx).await?);
            products::debit(product.id, item.quantity, &mut tx).await?;
        }
        let full_order = FullOrder { order: new_order, items };
        carts::remove_products(order.user_id, &full_order.product_ids(), &mut tx).await?;
        tx.commit().await?;
        debug!(
            "🗃️ Order {} committed with {} items for {}",
            full_order.order.order_number,
            full_order.items.len(),
            full_order.order.total
        );
        Ok(full_order)
    }

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_number(number, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let items = order_items::fetch_items_for_order(order_id, &mut conn).await?;
        Ok(items)
    }

    async fn fetch_full_order(&self, order_id: i64) -> Result<Option<FullOrder>, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let Some(order) = orders::fetch_order(order_id, &mut tx).await? else {
            return Ok(None);
        };
        let items = order_items::fetch_items_for_order(order_id, &mut tx).await?;
        tx.commit().await?;
        Ok(Some(FullOrder { order, items }))
    }

    async fn search_orders(&self, query: OrderQueryFilter, page: PageRequest) -> Result<OrderPage, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let total_items = orders::count_orders(&query, &mut tx).await?;
        let orders = orders::search_orders(&query, page, &mut tx).await?;
        tx.commit().await?;
        trace!("🗃️ {total_items} orders match [{query}]. Returning page {} ({} orders)", page.page, orders.len());
        Ok(OrderPage { orders, pagination: Pagination::new(page, total_items) })
    }

    async fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::orders_for_user(user_id, &mut conn).await?;
        Ok(orders)
    }

    /// The status change and any stock credits commit together. Since the update is conditional on the status the
    /// plan was made for, a second request racing on the same order finds no matching row and changes nothing.
    async fn apply_transition(
        &self,
        order_id: i64,
        plan: &TransitionPlan,
        tracking_number: Option<String>,
    ) -> Result<Order, OrderFlowError> {
        let mut tx = self.begin_write().await?;
        let updated = orders::compare_and_set_status(
            order_id,
            plan.from,
            plan.to,
            tracking_number.as_deref(),
            plan.payment_status,
            &mut tx,
        )
        .await?;
        let Some(order) = updated else {
            let current = orders::fetch_order(order_id, &mut tx).await?;
            return match current {
                None => Err(OrderFlowError::OrderNotFound(order_id)),
                Some(o) => {
                    debug!("🗃️ Order #{order_id} is {} and no longer {}. Transition rejected", o.status, plan.from);
                    Err(InvalidTransition { from: o.status, to: plan.to }.into())
                },
            };
        };
        if plan.restock {
            let items = order_items::fetch_items_for_order(order_id, &mut tx).await?;
            for item in &items {
                match products::credit(item.product_id, item.quantity, &mut tx).await {
                    Ok(_) => {},
                    Err(LedgerError::ProductNotFound(id)) => {
                        warn!("🗃️ Product #{id} from order {} no longer exists. It cannot be restocked", order.id);
                    },
                    Err(e) => return Err(e.into()),
                }
            }
            debug!("🗃️ Restocked {} lines of order {}", items.len(), order.order_number);
        }
        tx.commit().await?;
        Ok(order)
    }

    async fn update_payment_status(
        &self,
        order_id: i64,
        expected: PaymentStatus,
        new_status: PaymentStatus,
    ) -> Result<Order, OrderFlowError> {
        let mut tx = self.begin_write().await?;
        let updated = orders::compare_and_set_payment_status(order_id, expected, new_status, &mut tx).await?;
        let Some(order) = updated else {
            return match orders::fetch_order(order_id, &mut tx).await? {
                None => Err(OrderFlowError::OrderNotFound(order_id)),
                Some(_) => Err(OrderFlowError::PaymentStatusConflict { order_id }),
            };
        };
        tx.commit().await?;
        Ok(order)
    }
}

impl CartManagement for SqliteDatabase {
    async fn fetch_cart(&self, user_id: i64) -> Result<Vec<CartItem>, CartApiError> {
        let mut conn = self.pool.acquire().await?;
        let items = carts::fetch_cart(user_id, &mut conn).await?;
        Ok(items)
    }

    async fn add_to_cart(&self, user_id: i64, product_id: i64, quantity: i64) -> Result<CartItem, CartApiError> {
        let mut tx = self.begin_write().await?;
        let product = products::fetch_product(product_id, &mut tx).await?;
        if !product.is_some_and(|p| p.is_active) {
            return Err(CartApiError::ProductNotFound(product_id));
        }
        if !(1..=MAX_LINE_QUANTITY).contains(&quantity) {
            return Err(CartApiError::InvalidQuantity { quantity, max: MAX_LINE_QUANTITY });
        }
        let Some(item) = carts::upsert_item(user_id, product_id, quantity, MAX_LINE_QUANTITY, &mut tx).await? else {
            let in_cart = carts::fetch_cart(user_id, &mut tx)
                .await?
                .into_iter()
                .find(|i| i.product_id == product_id)
                .map_or(0, |i| i.quantity);
            return Err(CartApiError::InvalidQuantity { quantity: in_cart + quantity, max: MAX_LINE_QUANTITY });
        };
        tx.commit().await?;
        Ok(item)
    }

    async fn set_cart_quantity(
        &self,
        user_id: i64,
        product_id: i64,
        quantity: i64,
    ) -> Result<Option<CartItem>, CartApiError> {
        let mut conn = self.pool.acquire().await?;
        let item = carts::set_quantity(user_id, product_id, quantity, &mut conn).await?;
        Ok(item)
    }

    async fn remove_cart_item(&self, user_id: i64, product_id: i64) -> Result<bool, CartApiError> {
        let mut conn = self.pool.acquire().await?;
        let removed = carts::remove_item(user_id, product_id, &mut conn).await?;
        Ok(removed)
    }

    async fn clear_cart(&self, user_id: i64) -> Result<u64, CartApiError> {
        let mut conn = self.pool.acquire().await?;
        let removed = carts::clear_cart(user_id, &mut conn).await?;
        Ok(removed)
    }

    async fn remove_purchased_items(&self, user_id: i64, product_ids: &[i64]) -> Result<u64, CartApiError> {
        let mut conn = self.pool.acquire().await?;
        let removed = carts::remove_products(user_id, product_ids, &mut conn).await?;
        Ok(removed)
    }
}

impl AuthManagement for SqliteDatabase {
    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        let user = auth::fetch_user(user_id, &mut conn).await?;
        Ok(user)
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        auth::insert_user(user, &mut conn).await
    }

    async fn check_user_has_roles(&self, user_id: i64, roles: &[Role]) -> Result<(), AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        auth::user_has_roles(user_id, roles, &mut conn).await
    }

    async fn fetch_roles_for_user(&self, user_id: i64) -> Result<Vec<Role>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        auth::roles_for_user(user_id, &mut conn).await
    }

    async fn assign_roles(&self, user_id: i64, roles: &[Role]) -> Result<(), AuthApiError> {
        let mut tx = self.pool.begin().await?;
        if auth::fetch_user(user_id, &mut tx).await?.is_none() {
            return Err(AuthApiError::UserNotFound(user_id));
        }
        auth::assign_roles(user_id, roles, &mut tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn remove_roles(&self, user_id: i64, roles: &[Role]) -> Result<u64, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        auth::remove_roles(user_id, roles, &mut conn).await
    }

    async fn fetch_address_for_user(&self, user_id: i64, address_id: i64) -> Result<Option<Address>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        let address = addresses::fetch_address_for_user(user_id, address_id, &mut conn).await?;
        Ok(address)
    }

    async fn insert_address(&self, address: NewAddress) -> Result<Address, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        let user_id = address.user_id;
        if auth::fetch_user(user_id, &mut conn).await?.is_none() {
            return Err(AuthApiError::UserNotFound(user_id));
        }
        let address = addresses::insert_address(address, &mut conn).await?;
        Ok(address)
    }
}

impl NotificationLog for SqliteDatabase {
    async fn record_notification_failure(
        &self,
        failure: NewNotificationFailure,
    ) -> Result<NotificationFailure, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let failure = notifications::insert_failure(failure, &mut conn).await?;
        Ok(failure)
    }

    async fn fetch_notification_failures(&self, order_id: i64) -> Result<Vec<NotificationFailure>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let failures = notifications::failures_for_order(order_id, &mut conn).await?;
        Ok(failures)
    }
}
