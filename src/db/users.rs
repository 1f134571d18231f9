//! User repository.
//!
//! Users are created by the forum proper; the insert here exists for
//! seeding and tests.

use super::models::UserRecord;
use crate::db::DbError;
use sqlx::SqlitePool;

/// Repository for user lookups.
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a user.
    pub async fn insert(&self, username: &str, is_staff: bool) -> Result<UserRecord, DbError> {
        let result = sqlx::query("INSERT INTO users (username, is_staff) VALUES (?, ?)")
            .bind(username)
            .bind(is_staff)
            .execute(self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_unique_violation()
                {
                    return DbError::UserExists(username.to_string());
                }
                DbError::from(e)
            })?;

        Ok(UserRecord {
            id: result.last_insert_rowid(),
            username: username.to_string(),
            is_staff,
        })
    }

    /// Find user by id.
    pub async fn find(&self, id: i64) -> Result<Option<UserRecord>, DbError> {
        let row = sqlx::query_as::<_, (i64, String, bool)>(
            "SELECT id, username, is_staff FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|(id, username, is_staff)| UserRecord {
            id,
            username,
            is_staff,
        }))
    }
}
