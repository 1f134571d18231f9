//! Accepted answers for forum topics.
//!
//! A topic's author (while the topic is open) or any staff member can mark
//! one reply as the accepted answer, in categories that enable it.
//!
//! # Architecture
//!
//! - [`PermissionCache`]: shared set of enabled categories, lazily rebuilt
//! - [`AcceptancePolicy`]: category check plus actor/topic rules
//! - [`AcceptanceStateMachine`]: serialized, all-or-nothing transitions
//! - [`NotificationEmitter`]: keeps the author's notification in step
//! - [`TopicAnnotationBatch`] and [`AnswerInfoProjector`]: read paths for
//!   list and detail views
//!
//! [`SolvedService`] wires them together and is the only mutating surface.

mod actions;
mod actor;
mod annotate;
mod cache;
mod locks;
mod machine;
mod notify;
mod policy;
mod projector;

pub use actions::{PostActions, post_actions};
pub use actor::Actor;
pub use annotate::{AcceptedTopicSource, TopicAnnotationBatch};
pub use cache::{CategorySource, PermissionCache};
pub use locks::TopicLocks;
pub use machine::{
    AcceptanceState, AcceptanceStateMachine, Outcome, Transition, plan_accept, plan_unaccept,
};
pub use notify::{
    ACCEPTED_MESSAGE, AcceptedNotificationData, NOTIFICATION_TYPE, NotificationEmitter,
    NotificationKey,
};
pub use policy::AcceptancePolicy;
pub use projector::{AcceptedAnswer, AnswerInfoProjector};

use crate::config::SolvedConfig;
use crate::db::{CategoryRecord, Database, DbError};
use crate::error::{SolvedError, SolvedResult};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{Instrument, info};

/// Accepted-answer service: the composition root for this module.
#[derive(Debug, Clone)]
pub struct SolvedService {
    db: Database,
    cache: Arc<PermissionCache>,
    policy: AcceptancePolicy,
    machine: AcceptanceStateMachine,
    annotations: TopicAnnotationBatch,
    projector: AnswerInfoProjector,
    min_post_number: i64,
}

impl SolvedService {
    pub fn new(db: Database, config: &SolvedConfig) -> Self {
        let cache = Arc::new(PermissionCache::new(
            Arc::new(db.clone()),
            config.allow_solved_on_all_topics,
        ));
        let policy = AcceptancePolicy::new(Arc::clone(&cache));
        Self {
            machine: AcceptanceStateMachine::new(
                db.clone(),
                policy.clone(),
                config.min_post_number,
            ),
            annotations: TopicAnnotationBatch::new(Arc::new(db.clone())),
            projector: AnswerInfoProjector::new(db.clone()),
            db,
            cache,
            policy,
            min_post_number: config.min_post_number,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn permission_cache(&self) -> &Arc<PermissionCache> {
        &self.cache
    }

    /// Accept `post_id` as the answer of `topic_id`.
    pub async fn accept(&self, topic_id: i64, post_id: i64, actor: &Actor) -> SolvedResult<Outcome> {
        let _timer = crate::telemetry::RequestTimer::new("accept");
        self.machine
            .accept(topic_id, post_id, actor)
            .instrument(crate::telemetry::spans::transition("accept", topic_id, post_id))
            .await
            .inspect_err(|e| crate::metrics::record_rejection(e.error_code()))
    }

    /// Remove `post_id` as the answer of `topic_id`.
    pub async fn unaccept(&self, topic_id: i64, post_id: i64, actor: &Actor) -> SolvedResult<Outcome> {
        let _timer = crate::telemetry::RequestTimer::new("unaccept");
        self.machine
            .unaccept(topic_id, post_id, actor)
            .instrument(crate::telemetry::spans::transition("unaccept", topic_id, post_id))
            .await
            .inspect_err(|e| crate::metrics::record_rejection(e.error_code()))
    }

    /// Topic a post belongs to, for callers that only know the post.
    pub async fn topic_of_post(&self, post_id: i64) -> SolvedResult<i64> {
        self.db
            .posts()
            .find(post_id)
            .await?
            .map(|p| p.topic_id)
            .ok_or_else(|| SolvedError::post_not_found(post_id))
    }

    /// Persist a category edit, then drop the permission cache.
    pub async fn save_category(&self, category: &CategoryRecord) -> SolvedResult<()> {
        let saved = self.db.categories().save(category).await;
        // Invalidate even on failure: the row may or may not have changed.
        self.cache.invalidate();
        if !saved? {
            return Err(SolvedError::NotFound(format!("category {}", category.id)));
        }
        info!(
            category_id = category.id,
            accepts_answers = category.accepts_answers,
            "Category saved"
        );
        Ok(())
    }

    /// Whether topics in `category_id` may have an accepted answer.
    pub async fn is_category_enabled(&self, category_id: Option<i64>) -> Result<bool, DbError> {
        self.cache.is_category_enabled(category_id).await
    }

    /// Whether `actor` may change the accepted answer of `topic_id`.
    pub async fn can_modify_acceptance(&self, actor: &Actor, topic_id: i64) -> SolvedResult<bool> {
        let topic = self
            .db
            .topics()
            .find(topic_id)
            .await?
            .ok_or_else(|| SolvedError::topic_not_found(topic_id))?;
        Ok(self.policy.can_modify_acceptance(actor, &topic).await?)
    }

    /// List-view flags for a batch of topics.
    pub async fn annotate_topics(&self, topic_ids: &[i64]) -> Result<HashMap<i64, bool>, DbError> {
        self.annotations.annotate(topic_ids).await
    }

    /// Detail-view accepted answer of `topic_id`.
    pub async fn accepted_answer(&self, topic_id: i64) -> SolvedResult<Option<AcceptedAnswer>> {
        let topic = self
            .db
            .topics()
            .find(topic_id)
            .await?
            .ok_or_else(|| SolvedError::topic_not_found(topic_id))?;
        Ok(self.projector.project(&topic).await?)
    }

    /// Post-stream actions for every post of `topic_id`, keyed by post id.
    pub async fn post_actions(
        &self,
        actor: &Actor,
        topic_id: i64,
    ) -> SolvedResult<HashMap<i64, PostActions>> {
        let topic = self
            .db
            .topics()
            .find(topic_id)
            .await?
            .ok_or_else(|| SolvedError::topic_not_found(topic_id))?;
        let posts = self.db.posts().list_for_topic(topic_id).await?;
        let mut actions = HashMap::with_capacity(posts.len());
        for post in &posts {
            let entry =
                post_actions(&self.policy, actor, &topic, post, self.min_post_number).await?;
            actions.insert(post.id, entry);
        }
        Ok(actions)
    }
}
