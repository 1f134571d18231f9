//! Per-topic acceptance state machine.
//!
//! States are `Unaccepted` and `Accepted(post_id)`, read from the topic's
//! pointer. Each transition runs under the topic's lock and commits the
//! topic pointer, the posts' derived flags and the notification change in
//! one transaction, or nothing at all.

use super::actor::Actor;
use super::locks::TopicLocks;
use super::notify::NotificationEmitter;
use super::policy::AcceptancePolicy;
use crate::db::{self, Database, DbError, PostRecord, TopicRecord};
use crate::error::{SolvedError, SolvedResult};
use sqlx::SqliteConnection;
use tracing::{debug, info, warn};

/// Acceptance state of one topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptanceState {
    Unaccepted,
    Accepted(i64),
}

impl AcceptanceState {
    pub fn of(topic: &TopicRecord) -> Self {
        match topic.accepted_post_id {
            Some(post_id) => Self::Accepted(post_id),
            None => Self::Unaccepted,
        }
    }
}

/// The writes a request resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Already in the requested state.
    Unchanged,
    Accept { post_id: i64 },
    /// Swap the accepted post in place: one notification out, one in.
    Replace { previous: i64, post_id: i64 },
    /// The pointer already names the post but its flag was never written;
    /// rewrite the flag and notification.
    Repair { post_id: i64 },
    Clear { post_id: i64 },
}

/// What an accept/unaccept call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub topic_id: i64,
    pub transition: Transition,
    pub state: AcceptanceState,
}

/// Plan an accept of `post_id` from `state`.
pub fn plan_accept(state: AcceptanceState, post_id: i64) -> Transition {
    match state {
        AcceptanceState::Accepted(current) if current == post_id => Transition::Unchanged,
        AcceptanceState::Accepted(previous) => Transition::Replace { previous, post_id },
        AcceptanceState::Unaccepted => Transition::Accept { post_id },
    }
}

/// Plan an unaccept of `post_id` from `state`.
///
/// Naming a post other than the accepted one is refused rather than
/// clearing somebody else's acceptance.
pub fn plan_unaccept(
    state: AcceptanceState,
    topic_id: i64,
    post_id: i64,
) -> SolvedResult<Transition> {
    match state {
        AcceptanceState::Unaccepted => Ok(Transition::Unchanged),
        AcceptanceState::Accepted(current) if current == post_id => {
            Ok(Transition::Clear { post_id })
        }
        AcceptanceState::Accepted(_) => Err(SolvedError::PreconditionFailed { topic_id, post_id }),
    }
}

impl Transition {
    /// State after applying this transition to `before`.
    pub fn apply(self, before: AcceptanceState) -> AcceptanceState {
        match self {
            Self::Unchanged => before,
            Self::Accept { post_id } | Self::Replace { post_id, .. } | Self::Repair { post_id } => {
                AcceptanceState::Accepted(post_id)
            }
            Self::Clear { .. } => AcceptanceState::Unaccepted,
        }
    }
}

/// The post losing its acceptance. Its row may have been deleted.
#[derive(Debug)]
struct Retired {
    post_id: i64,
    post: Option<PostRecord>,
}

/// Executes transitions against the store.
#[derive(Debug, Clone)]
pub struct AcceptanceStateMachine {
    db: Database,
    policy: AcceptancePolicy,
    emitter: NotificationEmitter,
    locks: TopicLocks,
    min_post_number: i64,
}

impl AcceptanceStateMachine {
    pub fn new(db: Database, policy: AcceptancePolicy, min_post_number: i64) -> Self {
        Self {
            db,
            policy,
            emitter: NotificationEmitter,
            locks: TopicLocks::new(),
            min_post_number,
        }
    }

    /// Make `post_id` the accepted answer of `topic_id`.
    ///
    /// Posts numbered below `min_post_number` fail with `PreconditionFailed`.
    pub async fn accept(&self, topic_id: i64, post_id: i64, actor: &Actor) -> SolvedResult<Outcome> {
        let _lock = self.locks.acquire(topic_id).await;
        let topic = self.load_topic(topic_id).await?;
        let post = self
            .load_post(topic_id, post_id)
            .await?
            .ok_or_else(|| SolvedError::post_not_found(post_id))?;
        self.policy.ensure_can_modify(actor, &topic).await?;

        if post.post_number < self.min_post_number {
            warn!(
                topic_id,
                post_id,
                post_number = post.post_number,
                "Post is below the minimum acceptable post number"
            );
            return Err(SolvedError::PreconditionFailed { topic_id, post_id });
        }

        let state = AcceptanceState::of(&topic);
        let transition = match plan_accept(state, post_id) {
            Transition::Unchanged if !post.is_accepted_answer => Transition::Repair { post_id },
            planned => planned,
        };

        let previous = match transition {
            Transition::Unchanged => {
                debug!(topic_id, post_id, "Post already accepted");
                return Ok(Outcome { topic_id, transition, state });
            }
            Transition::Replace { previous, .. } => {
                let found = self.load_post(topic_id, previous).await?;
                if found.is_none() {
                    warn!(topic_id, previous, "Previously accepted post no longer exists");
                }
                Some(Retired { post_id: previous, post: found })
            }
            Transition::Repair { .. } => {
                warn!(topic_id, post_id, "Accepted post is missing its flag, repairing");
                // Whatever notification exists may belong to an earlier holder
                // of the pointer; drop them all and write the right one.
                Some(Retired { post_id, post: None })
            }
            _ => None,
        };

        self.commit_accept(&topic, &post, previous.as_ref(), actor).await?;

        info!(
            topic_id,
            post_id,
            previous = ?previous.as_ref().map(|r| r.post_id),
            user_id = ?actor.current_user_id(),
            "Answer accepted"
        );
        crate::metrics::record_accept();
        Ok(Outcome {
            topic_id,
            transition,
            state: transition.apply(state),
        })
    }

    /// Clear the accepted answer of `topic_id`, which must be `post_id`.
    ///
    /// A pointer to a post that no longer exists can still be cleared by
    /// naming it.
    pub async fn unaccept(&self, topic_id: i64, post_id: i64, actor: &Actor) -> SolvedResult<Outcome> {
        let _lock = self.locks.acquire(topic_id).await;
        let topic = self.load_topic(topic_id).await?;
        let post = self.load_post(topic_id, post_id).await?;
        if post.is_none() {
            if topic.accepted_post_id != Some(post_id) {
                return Err(SolvedError::post_not_found(post_id));
            }
            warn!(topic_id, post_id, "Clearing acceptance of a deleted post");
        }
        self.policy.ensure_can_modify(actor, &topic).await?;

        let state = AcceptanceState::of(&topic);
        let transition = plan_unaccept(state, topic_id, post_id).inspect_err(|_| {
            warn!(
                topic_id,
                post_id,
                accepted = ?topic.accepted_post_id,
                "Unaccept target is not the accepted answer"
            );
        })?;

        if transition == Transition::Unchanged {
            debug!(topic_id, post_id, "Nothing accepted, unaccept is a no-op");
            return Ok(Outcome { topic_id, transition, state });
        }

        self.commit_unaccept(topic_id, &Retired { post_id, post }).await?;

        info!(topic_id, post_id, user_id = ?actor.current_user_id(), "Answer unaccepted");
        crate::metrics::record_unaccept();
        Ok(Outcome {
            topic_id,
            transition,
            state: transition.apply(state),
        })
    }

    async fn load_topic(&self, topic_id: i64) -> SolvedResult<TopicRecord> {
        self.db
            .topics()
            .find(topic_id)
            .await?
            .ok_or_else(|| SolvedError::topic_not_found(topic_id))
    }

    /// The post, if it exists and belongs to `topic_id`.
    async fn load_post(&self, topic_id: i64, post_id: i64) -> Result<Option<PostRecord>, DbError> {
        Ok(self
            .db
            .posts()
            .find(post_id)
            .await?
            .filter(|p| p.topic_id == topic_id))
    }

    async fn commit_accept(
        &self,
        topic: &TopicRecord,
        post: &PostRecord,
        previous: Option<&Retired>,
        actor: &Actor,
    ) -> Result<(), DbError> {
        let mut tx = self.db.pool().begin().await?;

        if let Some(previous) = previous {
            self.retire(&mut *tx, topic.id, previous).await?;
        }
        db::tx::set_accepted_post(&mut *tx, topic.id, Some(post.id)).await?;
        db::tx::set_accepted_flag(&mut *tx, post.id, true).await?;
        self.emitter.on_accepted(&mut *tx, post, topic, actor).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn commit_unaccept(&self, topic_id: i64, retired: &Retired) -> Result<(), DbError> {
        let mut tx = self.db.pool().begin().await?;

        db::tx::set_accepted_post(&mut *tx, topic_id, None).await?;
        self.retire(&mut *tx, topic_id, retired).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Drop the outgoing post's flag and notification. Without the post row
    /// the notification key is unknown, so every acceptance notification on
    /// the topic goes instead.
    async fn retire(
        &self,
        conn: &mut SqliteConnection,
        topic_id: i64,
        retired: &Retired,
    ) -> Result<(), DbError> {
        db::tx::set_accepted_flag(&mut *conn, retired.post_id, false).await?;
        match &retired.post {
            Some(post) => {
                self.emitter.on_unaccepted(&mut *conn, post).await?;
            }
            None => {
                self.emitter.on_cleared(&mut *conn, topic_id).await?;
            }
        }
        Ok(())
    }
}
