//! Category repository.

use super::models::CategoryRecord;
use crate::db::{Database, DbError};
use crate::solved::CategorySource;
use async_trait::async_trait;
use sqlx::SqlitePool;

/// Repository for category operations.
pub struct CategoryRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new category.
    pub async fn insert(&self, name: &str, accepts_answers: bool) -> Result<CategoryRecord, DbError> {
        let result = sqlx::query("INSERT INTO categories (name, accepts_answers) VALUES (?, ?)")
            .bind(name)
            .bind(accepts_answers)
            .execute(self.pool)
            .await?;

        Ok(CategoryRecord {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            accepts_answers,
        })
    }

    /// Find category by id.
    pub async fn find(&self, id: i64) -> Result<Option<CategoryRecord>, DbError> {
        let row = sqlx::query_as::<_, (i64, String, bool)>(
            "SELECT id, name, accepts_answers FROM categories WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|(id, name, accepts_answers)| CategoryRecord {
            id,
            name,
            accepts_answers,
        }))
    }

    /// Persist a category's configuration.
    ///
    /// Returns `false` if no such category exists. Callers that hold a
    /// permission cache must invalidate it after this returns.
    pub async fn save(&self, category: &CategoryRecord) -> Result<bool, DbError> {
        let result = sqlx::query("UPDATE categories SET name = ?, accepts_answers = ? WHERE id = ?")
            .bind(&category.name)
            .bind(category.accepts_answers)
            .bind(category.id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Ids of every category with accepted answers enabled.
    pub async fn enabled_ids(&self) -> Result<Vec<i64>, DbError> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM categories WHERE accepts_answers = 1",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(ids)
    }
}

#[async_trait]
impl CategorySource for Database {
    async fn enabled_category_ids(&self) -> Result<Vec<i64>, DbError> {
        self.categories().enabled_ids().await
    }
}
