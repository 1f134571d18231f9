//! Notification repository.
//!
//! Notifications are keyed by `(notification_type, user_id, topic_id,
//! post_number)`; the unique index turns a repeated create into a replace.

use super::models::NotificationRecord;
use crate::db::DbError;
use sqlx::{SqliteConnection, SqlitePool};

type NotificationRow = (i64, String, i64, i64, i64, String, i64);

fn from_row(
    (id, notification_type, user_id, topic_id, post_number, data, created_at): NotificationRow,
) -> Result<NotificationRecord, DbError> {
    Ok(NotificationRecord {
        id,
        notification_type,
        user_id,
        topic_id,
        post_number,
        data: serde_json::from_str(&data)?,
        created_at,
    })
}

/// Repository for notification reads.
pub struct NotificationRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> NotificationRepository<'a> {
    /// Create a new notification repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Find the notification of `notification_type` for a recipient and post.
    pub async fn find_by(
        &self,
        notification_type: &str,
        user_id: i64,
        topic_id: i64,
        post_number: i64,
    ) -> Result<Option<NotificationRecord>, DbError> {
        let row = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, notification_type, user_id, topic_id, post_number, data, created_at
            FROM notifications
            WHERE notification_type = ? AND user_id = ? AND topic_id = ? AND post_number = ?
            "#,
        )
        .bind(notification_type)
        .bind(user_id)
        .bind(topic_id)
        .bind(post_number)
        .fetch_optional(self.pool)
        .await?;

        row.map(from_row).transpose()
    }

    /// All notifications of `notification_type` attached to a topic.
    pub async fn list_for_topic(
        &self,
        notification_type: &str,
        topic_id: i64,
    ) -> Result<Vec<NotificationRecord>, DbError> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, notification_type, user_id, topic_id, post_number, data, created_at
            FROM notifications
            WHERE notification_type = ? AND topic_id = ?
            ORDER BY id
            "#,
        )
        .bind(notification_type)
        .bind(topic_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(from_row).collect()
    }
}

/// Create a notification, replacing any existing one with the same key.
pub async fn upsert(
    conn: &mut SqliteConnection,
    notification_type: &str,
    user_id: i64,
    topic_id: i64,
    post_number: i64,
    data: &serde_json::Value,
) -> Result<(), DbError> {
    let now = chrono::Utc::now().timestamp();
    sqlx::query(
        r#"
        INSERT INTO notifications (notification_type, user_id, topic_id, post_number, data, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT (notification_type, user_id, topic_id, post_number)
        DO UPDATE SET data = excluded.data, created_at = excluded.created_at
        "#,
    )
    .bind(notification_type)
    .bind(user_id)
    .bind(topic_id)
    .bind(post_number)
    .bind(data.to_string())
    .bind(now)
    .execute(conn)
    .await?;
    Ok(())
}

/// Delete the notification with this key whose payload carries `message`.
/// Returns whether one existed.
pub async fn delete_by_key(
    conn: &mut SqliteConnection,
    notification_type: &str,
    message: &str,
    user_id: i64,
    topic_id: i64,
    post_number: i64,
) -> Result<bool, DbError> {
    let result = sqlx::query(
        r#"
        DELETE FROM notifications
        WHERE notification_type = ? AND user_id = ? AND topic_id = ? AND post_number = ?
          AND json_extract(data, '$.message') = ?
        "#,
    )
    .bind(notification_type)
    .bind(user_id)
    .bind(topic_id)
    .bind(post_number)
    .bind(message)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Delete every notification of `notification_type` on a topic whose
/// payload carries `message`. Returns how many rows were removed.
pub async fn delete_for_topic(
    conn: &mut SqliteConnection,
    notification_type: &str,
    message: &str,
    topic_id: i64,
) -> Result<u64, DbError> {
    let result = sqlx::query(
        r#"
        DELETE FROM notifications
        WHERE notification_type = ? AND topic_id = ?
          AND json_extract(data, '$.message') = ?
        "#,
    )
    .bind(notification_type)
    .bind(topic_id)
    .bind(message)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}
