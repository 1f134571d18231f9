//! Topic repository.

use super::models::TopicRecord;
use crate::db::{Database, DbError};
use crate::solved::AcceptedTopicSource;
use async_trait::async_trait;
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashSet;

type TopicRow = (i64, String, i64, Option<i64>, bool, Option<i64>);

fn from_row(
    (id, title, owner_user_id, category_id, is_closed, accepted_post_id): TopicRow,
) -> TopicRecord {
    TopicRecord {
        id,
        title,
        owner_user_id,
        category_id,
        is_closed,
        accepted_post_id,
    }
}

/// Repository for topic operations.
pub struct TopicRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> TopicRepository<'a> {
    /// Create a new topic repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new, unaccepted topic.
    pub async fn insert(
        &self,
        title: &str,
        owner_user_id: i64,
        category_id: Option<i64>,
    ) -> Result<TopicRecord, DbError> {
        let result = sqlx::query(
            "INSERT INTO topics (title, owner_user_id, category_id) VALUES (?, ?, ?)",
        )
        .bind(title)
        .bind(owner_user_id)
        .bind(category_id)
        .execute(self.pool)
        .await?;

        Ok(TopicRecord {
            id: result.last_insert_rowid(),
            title: title.to_string(),
            owner_user_id,
            category_id,
            is_closed: false,
            accepted_post_id: None,
        })
    }

    /// Find topic by id.
    pub async fn find(&self, id: i64) -> Result<Option<TopicRecord>, DbError> {
        let row = sqlx::query_as::<_, TopicRow>(
            r#"
            SELECT id, title, owner_user_id, category_id, is_closed, accepted_post_id
            FROM topics
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(from_row))
    }

    /// Open or close a topic.
    pub async fn set_closed(&self, id: i64, closed: bool) -> Result<bool, DbError> {
        let result = sqlx::query("UPDATE topics SET is_closed = ? WHERE id = ?")
            .bind(closed)
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Ids among `topic_ids` whose accepted-answer pointer is set.
    ///
    /// One statement regardless of how many ids are passed: the ids travel
    /// as a single JSON array parameter.
    pub async fn with_accepted_answer(&self, topic_ids: &[i64]) -> Result<HashSet<i64>, DbError> {
        if topic_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let ids = serde_json::to_string(topic_ids)?;
        let rows = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT id FROM topics
            WHERE id IN (SELECT value FROM json_each(?))
              AND accepted_post_id IS NOT NULL
            "#,
        )
        .bind(ids)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }

    /// Post number and author username of a topic's accepted post.
    ///
    /// `None` when the post no longer exists or has moved to another topic.
    pub async fn accepted_answer_info(
        &self,
        topic_id: i64,
        post_id: i64,
    ) -> Result<Option<(i64, String)>, DbError> {
        let row = sqlx::query_as::<_, (i64, String)>(
            r#"
            SELECT p.post_number, u.username
            FROM posts p
            JOIN users u ON u.id = p.author_user_id
            WHERE p.id = ? AND p.topic_id = ?
            "#,
        )
        .bind(post_id)
        .bind(topic_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }
}

/// Point a topic at its accepted post, or clear the pointer.
pub async fn set_accepted_post(
    conn: &mut SqliteConnection,
    topic_id: i64,
    post_id: Option<i64>,
) -> Result<(), DbError> {
    sqlx::query("UPDATE topics SET accepted_post_id = ? WHERE id = ?")
        .bind(post_id)
        .bind(topic_id)
        .execute(conn)
        .await?;
    Ok(())
}

#[async_trait]
impl AcceptedTopicSource for Database {
    async fn topics_with_accepted_answer(&self, topic_ids: &[i64]) -> Result<HashSet<i64>, DbError> {
        self.topics().with_accepted_answer(topic_ids).await
    }
}
