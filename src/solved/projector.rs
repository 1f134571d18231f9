//! Accepted-answer summary for the topic detail view.

use crate::db::{Database, DbError, TopicRecord};
use serde::Serialize;
use tracing::warn;

/// What the detail view shows about a topic's accepted answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AcceptedAnswer {
    pub post_number: i64,
    pub username: String,
}

/// Resolves a topic's accepted post to its number and author.
#[derive(Debug, Clone)]
pub struct AnswerInfoProjector {
    db: Database,
}

impl AnswerInfoProjector {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// `None` when nothing is accepted or the accepted post is gone.
    pub async fn project(&self, topic: &TopicRecord) -> Result<Option<AcceptedAnswer>, DbError> {
        let Some(post_id) = topic.accepted_post_id else {
            return Ok(None);
        };

        let info = self.db.topics().accepted_answer_info(topic.id, post_id).await?;
        if info.is_none() {
            warn!(topic_id = topic.id, post_id, "Accepted post not found, hiding answer");
        }
        Ok(info.map(|(post_number, username)| AcceptedAnswer {
            post_number,
            username,
        }))
    }
}
