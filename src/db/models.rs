//! Database models.

/// A forum user, as far as authorization and display need to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub is_staff: bool,
}

/// A topic category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRecord {
    pub id: i64,
    pub name: String,
    /// Whether topics in this category may have an accepted answer.
    pub accepts_answers: bool,
}

/// A topic. `accepted_post_id` is the authoritative acceptance state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicRecord {
    pub id: i64,
    pub title: String,
    pub owner_user_id: i64,
    pub category_id: Option<i64>,
    pub is_closed: bool,
    pub accepted_post_id: Option<i64>,
}

/// A post within a topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRecord {
    pub id: i64,
    pub topic_id: i64,
    pub author_user_id: i64,
    pub post_number: i64,
    /// Mirror of `topics.accepted_post_id == id`, written in the same transaction.
    pub is_accepted_answer: bool,
}

/// A stored notification row.
#[derive(Debug, Clone)]
pub struct NotificationRecord {
    pub id: i64,
    pub notification_type: String,
    pub user_id: i64,
    pub topic_id: i64,
    pub post_number: i64,
    pub data: serde_json::Value,
    pub created_at: i64,
}
