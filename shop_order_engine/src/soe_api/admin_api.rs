use std::fmt::Debug;

use log::*;

use crate::{
    config::{EngineConfig, DEFAULT_MAX_PAGE_SIZE},
    db_types::{Order, OrderStatusType, PaymentStatus, Role},
    events::{EventProducers, OrderShippedEvent, OrderStatusChangedEvent},
    soe_api::{
        order_objects::OrderQueryFilter,
        status_machine::{plan_transition, RestockPolicy, TransitionActor},
        validation::normalize_tracking_number,
    },
    traits::{OrderFlowError, OrderPage, PageRequest, ShopDatabase},
};

/// `AdminApi` lets administrators list orders and drive them through fulfilment.
///
/// Every method checks that the caller holds the [`Role::Admin`] role before doing anything else, and fails with
/// [`OrderFlowError::Forbidden`] if they do not. None of these methods can change an order's financial totals.
#[derive(Clone)]
pub struct AdminApi<B> {
    db: B,
    producers: EventProducers,
    restock: RestockPolicy,
    max_page_size: u32,
}

impl<B> Debug for AdminApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AdminApi (max page size {}, {:?})", self.max_page_size, self.restock)
    }
}

impl<B> AdminApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers, restock: RestockPolicy::default(), max_page_size: DEFAULT_MAX_PAGE_SIZE }
    }

    pub fn with_restock_policy(mut self, restock: RestockPolicy) -> Self {
        self.restock = restock;
        self
    }

    pub fn with_max_page_size(mut self, max_page_size: u32) -> Self {
        self.max_page_size = max_page_size;
        self
    }

    pub fn with_config(self, config: &EngineConfig) -> Self {
        self.with_restock_policy(config.restock).with_max_page_size(config.max_page_size)
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> AdminApi<B>
where B: ShopDatabase
{
    async fn require_admin(&self, admin_id: i64) -> Result<(), OrderFlowError> {
        self.db.check_user_has_roles(admin_id, &[Role::Admin]).await.map_err(|e| {
            warn!("📦️ User #{admin_id} attempted an admin action without the Admin role. {e}");
            OrderFlowError::from(e)
        })
    }

    /// Returns one page of orders, newest first. Page numbers start at 1 and the page size is clamped to the
    /// configured maximum.
    pub async fn list_orders(
        &self,
        admin_id: i64,
        filter: OrderQueryFilter,
        page: PageRequest,
    ) -> Result<OrderPage, OrderFlowError> {
        self.require_admin(admin_id).await?;
        let page = page.clamped(self.max_page_size);
        trace!("📦️ Admin #{admin_id} is listing orders. {filter} Page {} of size {}", page.page, page.page_size);
        self.db.search_orders(filter, page).await
    }

    /// Moves an order to a new status on behalf of an admin.
    ///
    /// The move must be allowed by the status machine, otherwise [`OrderFlowError::InvalidTransition`] is returned and
    /// nothing changes. Stock is credited back when the restock policy calls for it. When the new status is
    /// `Shipped`, the tracking number (if any) is recorded and an [`OrderShippedEvent`] is published so that the
    /// customer can be notified. Delivery of that notification never affects the result of this call.
    pub async fn update_order_status(
        &self,
        admin_id: i64,
        order_id: i64,
        new_status: OrderStatusType,
        tracking_number: Option<String>,
    ) -> Result<Order, OrderFlowError> {
        self.require_admin(admin_id).await?;
        let tracking_number = normalize_tracking_number(tracking_number)?;
        let order = self.db.fetch_order(order_id).await?.ok_or(OrderFlowError::OrderNotFound(order_id))?;
        let plan =
            plan_transition(order.status, new_status, TransitionActor::Admin, order.payment_status, &self.restock)?;
        let updated = self.db.apply_transition(order_id, &plan, tracking_number).await?;
        info!("📦️ Admin #{admin_id} moved order {} from {} to {}", updated.order_number, plan.from, plan.to);
        let event = OrderStatusChangedEvent::new(plan.from, updated.clone(), plan.restock);
        self.producers.publish_status_changed(event);
        if plan.notify_shipment {
            self.publish_shipment(&updated).await;
        }
        Ok(updated)
    }

    async fn publish_shipment(&self, order: &Order) {
        match self.db.fetch_user(order.user_id).await {
            Ok(Some(user)) => {
                self.producers.publish_order_shipped(OrderShippedEvent::new(order.clone(), user.email));
            },
            Ok(None) => {
                warn!("📦️ User #{} for order {} does not exist. No shipment notice sent", order.user_id, order.id);
            },
            Err(e) => {
                error!("📦️ Could not look up the recipient for order {}. No shipment notice sent. {e}", order.id);
            },
        }
    }

    /// Records the payment outcome reported by the external payment provider.
    ///
    /// Only `Paid` and `Failed` can be recorded, and only for an order whose payment is still `Pending`. Refunds are
    /// recorded automatically when a paid order is moved to `Refunded`.
    pub async fn record_payment_outcome(
        &self,
        admin_id: i64,
        order_id: i64,
        outcome: PaymentStatus,
    ) -> Result<Order, OrderFlowError> {
        self.require_admin(admin_id).await?;
        if !matches!(outcome, PaymentStatus::Paid | PaymentStatus::Failed) {
            return Err(OrderFlowError::ValidationFailed(format!(
                "{outcome} is not a payment outcome that can be recorded directly"
            )));
        }
        let order = self.db.update_payment_status(order_id, PaymentStatus::Pending, outcome).await?;
        info!("📦️ Payment for order {} recorded as {outcome} by admin #{admin_id}", order.order_number);
        Ok(order)
    }
}
