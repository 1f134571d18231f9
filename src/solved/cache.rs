//! In-memory cache of categories that allow accepted answers.
//!
//! Consulted on every permission check, so it is a single shared set rather
//! than a per-category map.
//!
//! # Architecture
//!
//! - Empty at startup; filled on the first read (cache-fill-on-miss)
//! - Cleared unconditionally whenever a category is saved
//! - The set is never edited in place: a rebuild installs a fresh
//!   `Arc<HashSet>` and readers keep whatever snapshot they cloned
//! - Concurrent rebuilds after a miss are redundant but harmless
//!
//! A rebuild that began before an invalidation does not install its set,
//! so a save is always visible to the first read that starts after it.

use crate::db::DbError;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Source of truth the cache is rebuilt from.
#[async_trait]
pub trait CategorySource: Send + Sync {
    /// Ids of every category whose configuration enables accepted answers.
    async fn enabled_category_ids(&self) -> Result<Vec<i64>, DbError>;
}

/// Shared cache of accepted-answer-enabled category ids.
pub struct PermissionCache {
    source: Arc<dyn CategorySource>,
    /// Global override: every category allows accepted answers.
    allow_all: bool,
    enabled: RwLock<Option<Arc<HashSet<i64>>>>,
    /// Bumped on every invalidation, under the `enabled` write lock.
    generation: AtomicU64,
}

impl PermissionCache {
    /// Create an empty cache backed by `source`.
    pub fn new(source: Arc<dyn CategorySource>, allow_all: bool) -> Self {
        Self {
            source,
            allow_all,
            enabled: RwLock::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Whether the global override is on.
    pub fn allows_all(&self) -> bool {
        self.allow_all
    }

    /// Check whether topics in `category_id` may have an accepted answer.
    ///
    /// Uncategorized topics (`None`) are only allowed under the override.
    pub async fn is_category_enabled(&self, category_id: Option<i64>) -> Result<bool, DbError> {
        if self.allow_all {
            return Ok(true);
        }
        let Some(category_id) = category_id else {
            return Ok(false);
        };
        Ok(self.get_or_build().await?.contains(&category_id))
    }

    /// Current snapshot of the enabled set, rebuilding it on a miss.
    pub async fn get_or_build(&self) -> Result<Arc<HashSet<i64>>, DbError> {
        let cached = self.enabled.read().clone();
        if let Some(set) = cached {
            return Ok(set);
        }

        let generation = self.generation.load(Ordering::Acquire);
        let set: Arc<HashSet<i64>> =
            Arc::new(self.source.enabled_category_ids().await?.into_iter().collect());

        let mut slot = self.enabled.write();
        if self.generation.load(Ordering::Acquire) == generation {
            *slot = Some(Arc::clone(&set));
            debug!(categories = set.len(), "Accepted-answer category cache rebuilt");
            crate::metrics::record_cache_rebuild();
        } else {
            debug!("Category cache invalidated during rebuild, discarding result");
        }

        Ok(set)
    }

    /// Drop the cached set; the next read rebuilds it.
    pub fn invalidate(&self) {
        let mut slot = self.enabled.write();
        self.generation.fetch_add(1, Ordering::AcqRel);
        *slot = None;
        drop(slot);
        debug!("Accepted-answer category cache invalidated");
        crate::metrics::record_cache_invalidation();
    }

    /// Whether a set is currently materialized.
    pub fn is_built(&self) -> bool {
        self.enabled.read().is_some()
    }
}

impl std::fmt::Debug for PermissionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionCache")
            .field("allow_all", &self.allow_all)
            .field("built", &self.is_built())
            .finish()
    }
}
