//! "Your answer was accepted" notifications.
//!
//! A notification exists exactly while its post is accepted, unless the
//! acceptor wrote the post. Identity is derived from the post, so repeated
//! calls converge on the same row.

use crate::db::{self, DbError, PostRecord, TopicRecord};
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use tracing::debug;

use super::actor::Actor;

/// Notification type of acceptance notifications. Kept apart from the
/// forum's generic `custom` type so the unique key cannot collide.
pub const NOTIFICATION_TYPE: &str = "accepted_answer";

/// Translation key the client renders.
pub const ACCEPTED_MESSAGE: &str = "solved.accepted_notification";

/// Identity of an acceptance notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NotificationKey {
    pub recipient_user_id: i64,
    pub topic_id: i64,
    pub post_number: i64,
}

impl NotificationKey {
    pub fn for_post(post: &PostRecord) -> Self {
        Self {
            recipient_user_id: post.author_user_id,
            topic_id: post.topic_id,
            post_number: post.post_number,
        }
    }
}

/// Stored payload of an acceptance notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptedNotificationData {
    pub message: String,
    pub display_username: String,
    pub topic_title: String,
}

/// Creates and removes acceptance notifications inside a transition's
/// transaction.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotificationEmitter;

impl NotificationEmitter {
    /// Notify the author of a newly accepted post.
    ///
    /// Returns `false` without writing when the actor is the author.
    pub async fn on_accepted(
        &self,
        conn: &mut SqliteConnection,
        post: &PostRecord,
        topic: &TopicRecord,
        actor: &Actor,
    ) -> Result<bool, DbError> {
        if actor.current_user_id() == Some(post.author_user_id) {
            debug!(post_id = post.id, "Self-accepted answer, no notification");
            return Ok(false);
        }

        let key = NotificationKey::for_post(post);
        let data = serde_json::to_value(AcceptedNotificationData {
            message: ACCEPTED_MESSAGE.to_string(),
            display_username: actor.username().unwrap_or_default().to_string(),
            topic_title: topic.title.clone(),
        })?;

        db::tx::upsert(
            conn,
            NOTIFICATION_TYPE,
            key.recipient_user_id,
            key.topic_id,
            key.post_number,
            &data,
        )
        .await?;
        debug!(
            user_id = key.recipient_user_id,
            topic_id = key.topic_id,
            post_number = key.post_number,
            "Accepted-answer notification created"
        );
        Ok(true)
    }

    /// Remove the notification for a post that is no longer accepted.
    ///
    /// Absence is not an error; returns whether a row was removed.
    pub async fn on_unaccepted(
        &self,
        conn: &mut SqliteConnection,
        post: &PostRecord,
    ) -> Result<bool, DbError> {
        let key = NotificationKey::for_post(post);
        let removed = db::tx::delete_by_key(
            conn,
            NOTIFICATION_TYPE,
            ACCEPTED_MESSAGE,
            key.recipient_user_id,
            key.topic_id,
            key.post_number,
        )
        .await?;
        if removed {
            debug!(
                user_id = key.recipient_user_id,
                topic_id = key.topic_id,
                post_number = key.post_number,
                "Accepted-answer notification removed"
            );
        }
        Ok(removed)
    }

    /// Remove the topic's acceptance notification, whoever it was for.
    ///
    /// Works from the topic alone, so a notification whose post has since
    /// been deleted is removed too. Returns how many rows were removed.
    pub async fn on_cleared(
        &self,
        conn: &mut SqliteConnection,
        topic_id: i64,
    ) -> Result<u64, DbError> {
        let removed =
            db::tx::delete_for_topic(conn, NOTIFICATION_TYPE, ACCEPTED_MESSAGE, topic_id).await?;
        if removed > 0 {
            debug!(topic_id, removed, "Accepted-answer notification removed");
        }
        Ok(removed)
    }
}
