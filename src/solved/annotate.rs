//! Topic-list annotation: which topics have an accepted answer.

use crate::db::DbError;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Bulk lookup of topics whose accepted-answer pointer is set.
#[async_trait]
pub trait AcceptedTopicSource: Send + Sync {
    /// Subset of `topic_ids` with an accepted answer, in one round trip.
    async fn topics_with_accepted_answer(&self, topic_ids: &[i64]) -> Result<HashSet<i64>, DbError>;
}

/// Marks list-view topics that have an accepted answer.
///
/// The flag is computed per request and never persisted.
#[derive(Clone)]
pub struct TopicAnnotationBatch {
    source: Arc<dyn AcceptedTopicSource>,
}

impl TopicAnnotationBatch {
    pub fn new(source: Arc<dyn AcceptedTopicSource>) -> Self {
        Self { source }
    }

    /// Map every id in `topic_ids` to whether it has an accepted answer.
    pub async fn annotate(&self, topic_ids: &[i64]) -> Result<HashMap<i64, bool>, DbError> {
        if topic_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let with_accepted = self.source.topics_with_accepted_answer(topic_ids).await?;
        Ok(topic_ids
            .iter()
            .map(|id| (*id, with_accepted.contains(id)))
            .collect())
    }
}

impl std::fmt::Debug for TopicAnnotationBatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicAnnotationBatch").finish_non_exhaustive()
    }
}
