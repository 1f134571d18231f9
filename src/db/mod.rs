//! SQLite storage for the forum rows this daemon reads and writes.
//!
//! Repositories borrow the pool; writes that belong to a transition live in
//! [`tx`] and take the transaction's connection instead. Tables:
//! - Users (display name and staff flag, nothing authentication-related)
//! - Categories and their accepted-answer flag
//! - Topics with their accepted-answer pointer
//! - Posts with the derived accepted flag
//! - Accepted-answer notifications

mod categories;
mod models;
mod notifications;
mod posts;
mod topics;
mod users;

pub use categories::CategoryRepository;
pub use models::{CategoryRecord, NotificationRecord, PostRecord, TopicRecord, UserRecord};
pub use notifications::NotificationRepository;
pub use posts::PostRepository;
pub use topics::TopicRepository;
pub use users::UserRepository;

/// Writes that must run inside a caller-owned transaction.
pub mod tx {
    pub use super::notifications::{delete_by_key, delete_for_topic, upsert};
    pub use super::posts::set_accepted_flag;
    pub use super::topics::set_accepted_post;
}

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

static MEMDB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(sqlx::Error),
    #[error("migration error: {0}")]
    Migration(sqlx::migrate::MigrateError),
    #[error("username already exists: {0}")]
    UserExists(String),
    #[error("post number {post_number} already exists in topic {topic_id}")]
    PostNumberTaken { topic_id: i64, post_number: i64 },
    #[error("invalid notification payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Database handle with connection pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Bounds how long a request waits for a pooled connection.
    const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

    /// Idle file-backed connections are closed after this long.
    const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

    /// Open `path` (or a private in-memory database) and apply migrations.
    pub async fn new(path: &str) -> Result<Self, DbError> {
        let pool = if path == ":memory:" {
            // `file::memory:` would be shared by every pool in the process, so
            // each call gets its own uniquely named shared-cache database.
            let id = MEMDB_COUNTER.fetch_add(1, Ordering::Relaxed);
            let memdb_uri = format!(
                "file:solvedd-memdb-{}-{}?mode=memory&cache=shared",
                std::process::id(),
                id
            );

            let options = SqliteConnectOptions::new()
                .filename(&memdb_uri)
                .shared_cache(true)
                .create_if_missing(true)
                .foreign_keys(true);

            SqlitePoolOptions::new()
                .max_connections(1)
                .acquire_timeout(Self::ACQUIRE_TIMEOUT)
                .idle_timeout(None)
                .test_before_acquire(true)
                .connect_with(options)
                .await?
        } else {
            if let Some(parent) = Path::new(path).parent()
                && !parent.as_os_str().is_empty()
                && let Err(e) = std::fs::create_dir_all(parent)
            {
                tracing::warn!(path = %parent.display(), error = %e, "Failed to create database directory");
            }

            let options = SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .foreign_keys(true);

            SqlitePoolOptions::new()
                .max_connections(5)
                .acquire_timeout(Self::ACQUIRE_TIMEOUT)
                .idle_timeout(Some(Self::IDLE_TIMEOUT))
                .test_before_acquire(true)
                .connect_with(options)
                .await?
        };

        info!(path = %path, "Database connected");

        Self::run_migrations(&pool).await?;

        // WAL lets list/detail reads proceed while a transition commits.
        sqlx::query("PRAGMA journal_mode=WAL")
            .execute(&pool)
            .await?;

        sqlx::query("PRAGMA synchronous=NORMAL")
            .execute(&pool)
            .await?;

        Ok(Self { pool })
    }

    /// The pool, for callers that open their own transaction.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run embedded migrations.
    async fn run_migrations(pool: &SqlitePool) -> Result<(), DbError> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(DbError::Migration)?;

        info!("Schema up to date");
        Ok(())
    }

    /// Get user repository.
    pub fn users(&self) -> UserRepository<'_> {
        UserRepository::new(&self.pool)
    }

    /// Get category repository.
    pub fn categories(&self) -> CategoryRepository<'_> {
        CategoryRepository::new(&self.pool)
    }

    /// Get topic repository.
    pub fn topics(&self) -> TopicRepository<'_> {
        TopicRepository::new(&self.pool)
    }

    /// Get post repository.
    pub fn posts(&self) -> PostRepository<'_> {
        PostRepository::new(&self.pool)
    }

    /// Get notification repository.
    pub fn notifications(&self) -> NotificationRepository<'_> {
        NotificationRepository::new(&self.pool)
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        DbError::Sqlx(err)
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::Migration(err)
    }
}
