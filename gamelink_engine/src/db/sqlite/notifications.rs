use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{NewNotification, NotificationEvent},
};

const NOTIFICATION_COLUMNS: &str =
    "id, user_id, title, message, channel, priority, reference_type, reference_id, read_at, created_at";

pub async fn insert_notification(
    notification: NewNotification,
    conn: &mut SqliteConnection,
) -> Result<NotificationEvent, SqliteDatabaseError> {
    let sql = format!(
        "INSERT INTO notification_events (user_id, title, message, channel, priority, reference_type, \
         reference_id, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {NOTIFICATION_COLUMNS}"
    );
    let event = sqlx::query_as::<_, NotificationEvent>(&sql)
        .bind(notification.user_id)
        .bind(notification.title)
        .bind(notification.message)
        .bind(notification.channel)
        .bind(notification.priority)
        .bind(notification.reference_type)
        .bind(notification.reference_id)
        .bind(notification.created_at)
.fetch_all(conn)
        .await?
        .into_iter()
        .next()
        .ok_or(sqlx::Error::RowNotFound)?;
    debug!("🗃️ Notification #{} queued for user #{}", event.id, event.user_id);
    Ok(event)
}

pub async fn fetch_notifications_for_user(
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<NotificationEvent>, SqliteDatabaseError> {
    let sql = format!("SELECT {NOTIFICATION_COLUMNS} FROM notification_events WHERE user_id = $1 ORDER BY id DESC");
    let events = sqlx::query_as::<_, NotificationEvent>(&sql).bind(user_id).fetch_all(conn).await?;
    Ok(events)
}
