use crate::{
    db_types::{FullOrder, NewOrder, Order, OrderItem, OrderNumber, PaymentStatus},
    pricing::PricingPolicy,
    soe_api::{order_objects::OrderQueryFilter, status_machine::TransitionPlan},
    traits::{OrderFlowError, OrderPage, PageRequest},
};

/// Persistence and lifecycle operations for orders.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Places a new order as a single atomic unit of work:
    ///
    /// * The address must belong to the user, otherwise [`OrderFlowError::AddressNotFound`].
    /// * Each line is checked in request order. The first product that is missing or inactive gives
    ///   [`OrderFlowError::ProductNotFound`]; the first line that cannot be covered gives
    ///   [`OrderFlowError::InsufficientStock`].
    /// * Totals are computed from the current product prices under `pricing`.
    /// * The order and its items are inserted, each line is debited from the ledger and the purchased products are
    ///   removed from the user's cart.
    ///
    /// If anything fails, nothing is persisted and no debit survives.
    async fn place_order(&self, order: NewOrder, pricing: &PricingPolicy) -> Result<FullOrder, OrderFlowError>;

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, OrderFlowError>;

    async fn fetch_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, OrderFlowError>;

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, OrderFlowError>;

    async fn fetch_full_order(&self, order_id: i64) -> Result<Option<FullOrder>, OrderFlowError> {
        let Some(order) = self.fetch_order(order_id).await? else {
            return Ok(None);
        };
        let items = self.fetch_order_items(order_id).await?;
        Ok(Some(FullOrder { order, items }))
    }

    /// All orders placed by the user, newest first.
    async fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderFlowError>;

    /// Returns one page of orders matching the filter, newest first.
    async fn search_orders(&self, query: OrderQueryFilter, page: PageRequest) -> Result<OrderPage, OrderFlowError>;

    /// Applies a planned status transition.
    ///
    /// The status update only succeeds if the order's status is still `plan.from`; if another request changed it in
    /// the meantime, [`OrderFlowError::InvalidTransition`] is returned and nothing changes. When `plan.restock` is
    /// set, every line is credited back to the ledger in the same transaction, which is what makes restoration happen
    /// exactly once.
    async fn apply_transition(
        &self,
        order_id: i64,
        plan: &TransitionPlan,
        tracking_number: Option<String>,
    ) -> Result<Order, OrderFlowError>;

    /// Records an externally reported payment outcome. The update only succeeds if the payment status is still
    /// `expected`.
    async fn update_payment_status(
        &self,
        order_id: i64,
        expected: PaymentStatus,
        new_status: PaymentStatus,
    ) -> Result<Order, OrderFlowError>;
}
