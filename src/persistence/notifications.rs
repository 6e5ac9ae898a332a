use sqlx::{Row, SqliteConnection};

use crate::domain::notification::{NewNotification, Notification, ReadState};
use super::decode_error;

/// Append a notification and return its generated id.
pub async fn insert_notification(
    conn: &mut SqliteConnection,
    notification: &NewNotification,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO notifications (recipient_email, category, message, created_at, is_read)
         VALUES (?, ?, ?, ?, 0)",
    )
    .bind(&notification.recipient_email)
    .bind(notification.category.label())
    .bind(&notification.message)
    .bind(notification.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Inbox of a recipient, newest first.
pub async fn list_for_recipient(
    conn: &mut SqliteConnection,
    recipient_email: &str,
) -> Result<Vec<Notification>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT notification_id, recipient_email, category, message, created_at, is_read
         FROM notifications WHERE recipient_email = ?
         ORDER BY created_at DESC, notification_id DESC",
    )
    .bind(recipient_email)
    .fetch_all(&mut *conn)
    .await?;

    rows.iter()
        .map(|row| {
            let read_state = if row.try_get::<i64, _>("is_read")? != 0 {
                ReadState::Read
            } else {
                ReadState::Unread
            };

            Ok(Notification {
                id: row.try_get("notification_id")?,
                recipient_email: row.try_get("recipient_email")?,
                category: row.try_get::<String, _>("category")?.parse().map_err(decode_error)?,
                message: row.try_get("message")?,
                created_at: row.try_get("created_at")?,
                read_state,
            })
        })
        .collect()
}

/// Returns false if no such notification exists.
pub async fn mark_read(conn: &mut SqliteConnection, notification_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE notification_id = ?")
        .bind(notification_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() == 1)
}
