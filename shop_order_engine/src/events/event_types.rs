use serde::{Deserialize, Serialize};

use crate::db_types::{FullOrder, Order, OrderStatusType};

/// Published after a new order, its items and all its stock debits have been committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreatedEvent {
    pub order: FullOrder,
}

impl OrderCreatedEvent {
    pub fn new(order: FullOrder) -> Self {
        Self { order }
    }
}

/// Published after any committed status change, including cancellations and refunds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusChangedEvent {
    pub old_status: OrderStatusType,
    pub order: Order,
    /// Whether the order's stock was credited back to the inventory ledger as part of this change
    pub restocked: bool,
}

impl OrderStatusChangedEvent {
    pub fn new(old_status: OrderStatusType, order: Order, restocked: bool) -> Self {
        Self { old_status, order, restocked }
    }

    pub fn new_status(&self) -> OrderStatusType {
        self.order.status
    }
}

/// Published after an order has been committed as `Shipped`. This is what drives the shipment notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderShippedEvent {
    pub order: Order,
    /// Where the shipment notice should be sent, i.e. the email address of the user who placed the order
    pub recipient: String,
    pub tracking_number: Option<String>,
}

impl OrderShippedEvent {
    pub fn new(order: Order, recipient: String) -> Self {
        let tracking_number = order.tracking_number.clone();
        Self { order, recipient, tracking_number }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    OrderCreated(OrderCreatedEvent),
    OrderStatusChanged(OrderStatusChangedEvent),
    OrderShipped(OrderShippedEvent),
}
