use std::future::Future;

use crate::db_types::{NewNotification, NotificationEvent};

/// The notification sink. Notifications are created by this crate but read and acknowledged elsewhere.
///
/// The futures returned here must be `Send`, because notifications are created from detached event-hook tasks.
pub trait NotificationManagement {
    type Error: std::error::Error + Send;

    fn create_notification(
        &self,
        notification: NewNotification,
    ) -> impl Future<Output = Result<NotificationEvent, Self::Error>> + Send;

    /// Notifications for the given user, newest first.
    fn fetch_notifications_for_user(
        &self,
        user_id: i64,
    ) -> impl Future<Output = Result<Vec<NotificationEvent>, Self::Error>> + Send;
}
