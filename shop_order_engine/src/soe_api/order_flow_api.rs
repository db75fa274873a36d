use std::fmt::Debug;

use log::*;

use crate::{
    config::EngineConfig,
    db_types::{FullOrder, NewOrder, Order, OrderStatusType},
    events::{EventProducers, OrderCreatedEvent, OrderStatusChangedEvent},
    pricing::PricingPolicy,
    soe_api::{
        status_machine::{plan_transition, RestockPolicy, TransitionActor},
        validation::validate_new_order,
    },
    traits::{OrderFlowError, ShopDatabase},
};

/// `OrderFlowApi` is the shopper-facing API for placing, viewing and cancelling orders.
///
/// Events are only published once the corresponding database transaction has committed.
#[derive(Clone)]
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
    pricing: PricingPolicy,
    restock: RestockPolicy,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi ({:?}, {:?})", self.pricing, self.restock)
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers, pricing: PricingPolicy::default(), restock: RestockPolicy::default() }
    }

    pub fn with_pricing(mut self, pricing: PricingPolicy) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn with_restock_policy(mut self, restock: RestockPolicy) -> Self {
        self.restock = restock;
        self
    }

    pub fn with_config(self, config: &EngineConfig) -> Self {
        self.with_pricing(config.pricing).with_restock_policy(config.restock)
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn pricing(&self) -> &PricingPolicy {
        &self.pricing
    }
}

impl<B> OrderFlowApi<B>
where B: ShopDatabase
{
    /// Places a new order for `order.user_id`.
    ///
    /// The request is validated first, without touching the database. Then the address check, stock checks, pricing,
    /// order insert, ledger debits and cart reconciliation all happen in one transaction. Either the whole order is
    /// placed, or nothing changes.
    ///
    /// On success, an [`OrderCreatedEvent`] is published.
    pub async fn create_order(&self, order: NewOrder) -> Result<FullOrder, OrderFlowError> {
        validate_new_order(&order)?;
        let user_id = order.user_id;
        trace!("📦️ Placing order for user #{user_id} with {} lines", order.items.len());
        let full_order = self.db.place_order(order, &self.pricing).await.map_err(|e| {
            debug!("📦️ Order for user #{user_id} was not placed. {e}");
            e
        })?;
        info!(
            "📦️ Order {} placed by user #{user_id}. Total: {}",
            full_order.order.order_number, full_order.order.total
        );
        self.producers.publish_order_created(OrderCreatedEvent::new(full_order.clone()));
        Ok(full_order)
    }

    /// Cancels one of the user's own orders, returning its stock to the inventory ledger.
    ///
    /// Only `Pending` orders can be cancelled by a shopper. Someone else's order is reported as not found. Cancelling
    /// an order twice fails with [`OrderFlowError::InvalidTransition`] and leaves stock untouched.
    pub async fn cancel_order(&self, user_id: i64, order_id: i64) -> Result<Order, OrderFlowError> {
        let order = self.owned_order(user_id, order_id).await?;
        let plan = plan_transition(
            order.status,
            OrderStatusType::Cancelled,
            TransitionActor::Customer,
            order.payment_status,
            &self.restock,
        )?;
        let cancelled = self.db.apply_transition(order_id, &plan, None).await?;
        info!("📦️ Order {} was cancelled by user #{user_id}", cancelled.order_number);
        let event = OrderStatusChangedEvent::new(plan.from, cancelled.clone(), plan.restock);
        self.producers.publish_status_changed(event);
        Ok(cancelled)
    }

    /// Fetches one of the user's own orders, with its items.
    pub async fn fetch_order(&self, user_id: i64, order_id: i64) -> Result<FullOrder, OrderFlowError> {
        self.db
            .fetch_full_order(order_id)
            .await?
            .filter(|o| o.order.user_id == user_id)
            .ok_or(OrderFlowError::OrderNotFound(order_id))
    }

    /// All of the user's orders, newest first.
    pub async fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderFlowError> {
        self.db.orders_for_user(user_id).await
    }

    /// Removes the products of the given order from its owner's cart.
    ///
    /// [`create_order`](Self::create_order) already does this as part of placing the order; calling it again
    /// removes nothing unless the products were added back to the cart since.
    pub async fn reconcile_cart(&self, order_id: i64) -> Result<u64, OrderFlowError> {
        let order =
            self.db.fetch_full_order(order_id).await?.ok_or(OrderFlowError::OrderNotFound(order_id))?;
        let removed = self.db.remove_purchased_items(order.order.user_id, &order.product_ids()).await?;
        debug!("🛒️ Reconciled the cart for order {}. {removed} rows removed", order.order.order_number);
        Ok(removed)
    }

    async fn owned_order(&self, user_id: i64, order_id: i64) -> Result<Order, OrderFlowError> {
        self.db
            .fetch_order(order_id)
            .await?
            .filter(|o| o.user_id == user_id)
            .ok_or(OrderFlowError::OrderNotFound(order_id))
    }
}
