//! Per-post accept/unaccept affordances for the post stream.

use super::actor::Actor;
use super::policy::AcceptancePolicy;
use crate::db::{DbError, PostRecord, TopicRecord};
use serde::Serialize;

/// Buttons the post stream offers on one post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PostActions {
    pub can_accept_answer: bool,
    pub can_unaccept_answer: bool,
    pub accepted_answer: bool,
}

impl PostActions {
    /// Actions on `post` given the policy verdict for its topic.
    ///
    /// Posts numbered below `min_post_number` (the opening post by default)
    /// are never offered for acceptance.
    pub fn for_post(permitted: bool, post: &PostRecord, min_post_number: i64) -> Self {
        let accepted = post.is_accepted_answer;
        Self {
            can_accept_answer: permitted && post.post_number >= min_post_number && !accepted,
            can_unaccept_answer: permitted && accepted,
            accepted_answer: accepted,
        }
    }
}

/// Compute the actions `actor` has on `post` of `topic`.
pub async fn post_actions(
    policy: &AcceptancePolicy,
    actor: &Actor,
    topic: &TopicRecord,
    post: &PostRecord,
    min_post_number: i64,
) -> Result<PostActions, DbError> {
    let permitted = policy.can_modify_acceptance(actor, topic).await?;
    Ok(PostActions::for_post(permitted, post, min_post_number))
}
