//! Shipment notifications.
//!
//! Notifications are delivered from an [`OrderShippedEvent`](crate::events::OrderShippedEvent) handler, i.e. after the
//! status change has committed. Delivery is best-effort: a failed send is logged and recorded through the
//! [`NotificationLog`], it is never retried and it never affects the order itself.
use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{db_types::NewNotificationFailure, events::OrderShippedEvent, traits::NotificationLog};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotificationError {
    #[error("The recipient address is invalid: {0}")]
    InvalidRecipient(String),
    #[error("The notification could not be delivered: {0}")]
    DeliveryFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

impl Notification {
    /// Builds the shipment notice for the given event.
    pub fn shipment_notice(event: &OrderShippedEvent) -> Self {
        let order = &event.order;
        let subject = format!("Your order {} has shipped", order.order_number);
        let tracking = match &event.tracking_number {
            Some(t) => format!("Tracking number: {t}"),
            None => "A tracking number will follow once the carrier provides one.".to_string(),
        };
        let body = format!("Good news! Order {} ({}) is on its way.\n{tracking}", order.order_number, order.total);
        Self { recipient: event.recipient.clone(), subject, body }
    }
}

/// The outbound notification channel, e.g. an email gateway.
pub trait Notifier {
    fn send(&self, notification: &Notification) -> impl Future<Output = Result<(), NotificationError>> + Send;
}

/// A notifier that only writes notifications to the log. Useful when no delivery channel is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotificationError> {
        if notification.recipient.trim().is_empty() {
            return Err(NotificationError::InvalidRecipient(notification.recipient.clone()));
        }
        info!("✉️ To: {}. Subject: {}", notification.recipient, notification.subject);
        Ok(())
    }
}

/// Creates an `on_order_shipped` hook that sends a shipment notice for every shipped order.
///
/// Each event results in exactly one send attempt. If it fails, the error is logged and a failure record is written
/// to `log`.
pub fn shipment_notification_hook<N, L>(
    notifier: Arc<N>,
    log: L,
) -> impl Fn(OrderShippedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync + 'static
where
    N: Notifier + Send + Sync + 'static,
    L: NotificationLog + Clone + Send + Sync + 'static,
{
    move |event: OrderShippedEvent| {
        let notifier = Arc::clone(&notifier);
        let log = log.clone();
        Box::pin(async move {
            let notice = Notification::shipment_notice(&event);
            let order_id = event.order.id;
            match notifier.send(&notice).await {
                Ok(()) => debug!("✉️ Shipment notice for order {} sent to {}", event.order.order_number, notice.recipient),
                Err(e) => {
                    error!("✉️ Could not send the shipment notice for order {}: {e}", event.order.order_number);
                    let failure = NewNotificationFailure {
                        order_id,
                        recipient: notice.recipient,
                        subject: notice.subject,
                        error: e.to_string(),
                    };
                    if let Err(e) = log.record_notification_failure(failure).await {
                        error!("✉️ Could not record the notification failure for order {order_id}: {e}");
                    }
                },
            }
        })
    }
}

#[cfg(test)]
mod test {
    use chrono::Utc;

    use super::*;
    use crate::db_types::{Cents, Order, OrderNumber, OrderStatusType, PaymentStatus};

    fn shipped_order() -> Order {
        Order {
            id: 1,
            order_number: OrderNumber("ORD-20240101000000-ABC123".into()),
            user_id: 1,
            address_id: 1,
            subtotal: Cents::new(6000),
            tax: Cents::new(600),
            shipping: Cents::new(1000),
            total: Cents::new(7600),
            status: OrderStatusType::Shipped,
            payment_method: "card".into(),
            payment_status: PaymentStatus::Paid,
            tracking_number: Some("TRK-1".into()),
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn shipment_notice_mentions_tracking_number() {
        let event = OrderShippedEvent::new(shipped_order(), "alice@example.com".into());
        let notice = Notification::shipment_notice(&event);
        assert_eq!(notice.recipient, "alice@example.com");
        assert!(notice.subject.contains("ORD-20240101000000-ABC123"));
        assert!(notice.body.contains("TRK-1"));
        assert!(notice.body.contains("76.00"));
    }

    #[tokio::test]
    async fn log_notifier_rejects_blank_recipients() {
        let event = OrderShippedEvent::new(shipped_order(), " ".into());
        let notice = Notification::shipment_notice(&event);
        assert!(matches!(LogNotifier.send(&notice).await, Err(NotificationError::InvalidRecipient(_))));
    }
}
