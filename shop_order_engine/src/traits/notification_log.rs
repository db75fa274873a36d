use std::future::Future;

use crate::{
    db_types::{NewNotificationFailure, NotificationFailure},
    traits::OrderFlowError,
};

/// Durable record of notifications that could not be delivered.
///
/// The futures are `Send` because these methods are called from inside event handlers running on spawned tasks.
pub trait NotificationLog {
    fn record_notification_failure(
        &self,
        failure: NewNotificationFailure,
    ) -> impl Future<Output = Result<NotificationFailure, OrderFlowError>> + Send;

    fn fetch_notification_failures(
        &self,
        order_id: i64,
    ) -> impl Future<Output = Result<Vec<NotificationFailure>, OrderFlowError>> + Send;
}
