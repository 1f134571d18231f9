//! Post repository.

use super::models::PostRecord;
use crate::db::DbError;
use sqlx::{SqliteConnection, SqlitePool};

type PostRow = (i64, i64, i64, i64, bool);

fn from_row((id, topic_id, author_user_id, post_number, is_accepted_answer): PostRow) -> PostRecord {
    PostRecord {
        id,
        topic_id,
        author_user_id,
        post_number,
        is_accepted_answer,
    }
}

/// Repository for post operations.
pub struct PostRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> PostRepository<'a> {
    /// Create a new post repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a post at `post_number` in a topic.
    pub async fn insert(
        &self,
        topic_id: i64,
        author_user_id: i64,
        post_number: i64,
    ) -> Result<PostRecord, DbError> {
        let result = sqlx::query(
            "INSERT INTO posts (topic_id, author_user_id, post_number) VALUES (?, ?, ?)",
        )
        .bind(topic_id)
        .bind(author_user_id)
        .bind(post_number)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return DbError::PostNumberTaken {
                    topic_id,
                    post_number,
                };
            }
            DbError::from(e)
        })?;

        Ok(PostRecord {
            id: result.last_insert_rowid(),
            topic_id,
            author_user_id,
            post_number,
            is_accepted_answer: false,
        })
    }

    /// Find post by id.
    pub async fn find(&self, id: i64) -> Result<Option<PostRecord>, DbError> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT id, topic_id, author_user_id, post_number, is_accepted_answer
            FROM posts
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(from_row))
    }

    /// All posts of a topic in post-number order.
    pub async fn list_for_topic(&self, topic_id: i64) -> Result<Vec<PostRecord>, DbError> {
        let rows = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT id, topic_id, author_user_id, post_number, is_accepted_answer
            FROM posts
            WHERE topic_id = ?
            ORDER BY post_number
            "#,
        )
        .bind(topic_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(from_row).collect())
    }

    /// Delete a post. The topic pointer is left alone on purpose; readers
    /// treat a dangling pointer as "no accepted answer".
    pub async fn delete(&self, id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Set or clear a post's derived accepted flag.
pub async fn set_accepted_flag(
    conn: &mut SqliteConnection,
    post_id: i64,
    accepted: bool,
) -> Result<(), DbError> {
    sqlx::query("UPDATE posts SET is_accepted_answer = ? WHERE id = ?")
        .bind(accepted)
        .bind(post_id)
        .execute(conn)
        .await?;
    Ok(())
}
