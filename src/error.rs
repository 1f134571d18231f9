//! Unified error handling for solvedd.
//!
//! `SolvedError` is the taxonomy every accept/unaccept caller sees. Each
//! variant carries a static code for metrics labels and JSON bodies, and an
//! HTTP status for the glue layer.

use crate::db::DbError;
use axum::http::StatusCode;
use thiserror::Error;

/// Errors returned by the accepted-answer entry points.
///
/// Every variant except `StorageFailure` is raised before any write, so
/// none of them leaves state behind. `StorageFailure` is raised after the
/// transaction has been rolled back.
#[derive(Debug, Error)]
pub enum SolvedError {
    #[error("not permitted to change the accepted answer of topic {topic_id}")]
    NotAuthorized { topic_id: i64 },

    #[error("post {post_id} cannot be accepted or unaccepted on topic {topic_id} in its current state")]
    PreconditionFailed { topic_id: i64, post_id: i64 },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("storage failure: {0}")]
    StorageFailure(#[from] DbError),
}

impl SolvedError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotAuthorized { .. } => "not_authorized",
            Self::PreconditionFailed { .. } => "precondition_failed",
            Self::NotFound(_) => "not_found",
            Self::StorageFailure(_) => "storage_failure",
        }
    }

    /// HTTP status the glue layer answers with.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotAuthorized { .. } => StatusCode::FORBIDDEN,
            Self::PreconditionFailed { .. } => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::StorageFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub(crate) fn topic_not_found(topic_id: i64) -> Self {
        Self::NotFound(format!("topic {topic_id}"))
    }

    pub(crate) fn post_not_found(post_id: i64) -> Self {
        Self::NotFound(format!("post {post_id}"))
    }
}

/// Result type for the accepted-answer entry points.
pub type SolvedResult<T> = Result<T, SolvedError>;
