//! Who may accept or unaccept an answer on a topic.
//!
//! The rule has two halves, both required:
//! - the topic's category allows accepted answers (or the global override
//!   is on); staff get no bypass here
//! - the actor is staff, or is the signed-in owner of an open topic

use super::actor::Actor;
use super::cache::PermissionCache;
use crate::db::{DbError, TopicRecord};
use crate::error::{SolvedError, SolvedResult};
use std::sync::Arc;
use tracing::warn;

/// Authorization predicate for acceptance changes.
#[derive(Debug, Clone)]
pub struct AcceptancePolicy {
    cache: Arc<PermissionCache>,
}

impl AcceptancePolicy {
    pub fn new(cache: Arc<PermissionCache>) -> Self {
        Self { cache }
    }

    /// Whether `actor` may change the accepted answer of `topic`.
    pub async fn can_modify_acceptance(
        &self,
        actor: &Actor,
        topic: &TopicRecord,
    ) -> Result<bool, DbError> {
        let category_allowed = self.cache.is_category_enabled(topic.category_id).await?;
        Ok(category_allowed && actor_may_modify(actor, topic))
    }

    /// Like [`Self::can_modify_acceptance`], failing with `NotAuthorized`.
    pub async fn ensure_can_modify(&self, actor: &Actor, topic: &TopicRecord) -> SolvedResult<()> {
        if self.can_modify_acceptance(actor, topic).await? {
            return Ok(());
        }
        warn!(
            topic_id = topic.id,
            user_id = ?actor.current_user_id(),
            "Acceptance change rejected by policy"
        );
        Err(SolvedError::NotAuthorized { topic_id: topic.id })
    }
}

/// The actor half of the rule. Closed topics lock out the owner, not staff.
fn actor_may_modify(actor: &Actor, topic: &TopicRecord) -> bool {
    if actor.is_staff() {
        return true;
    }
    actor.is_authenticated()
        && actor.current_user_id() == Some(topic.owner_user_id)
        && !topic.is_closed
}
