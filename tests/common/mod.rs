//! Integration test common infrastructure.
//!
//! Seeds an in-memory database with users, categories, topics and posts,
//! and exposes the `SolvedService` under test.

#![allow(dead_code)]

use solvedd::Actor;
use solvedd::SolvedService;
use solvedd::config::SolvedConfig;
use solvedd::db::{CategoryRecord, Database, NotificationRecord, PostRecord, TopicRecord, UserRecord};
use solvedd::solved::NOTIFICATION_TYPE;

/// A seeded forum.
pub struct TestForum {
    pub db: Database,
    pub service: SolvedService,
}

impl TestForum {
    /// Fresh forum with default feature configuration.
    pub async fn new() -> anyhow::Result<Self> {
        Self::with_config(SolvedConfig::default()).await
    }

    pub async fn with_config(config: SolvedConfig) -> anyhow::Result<Self> {
        let db = Database::new(":memory:").await?;
        let service = SolvedService::new(db.clone(), &config);
        Ok(Self { db, service })
    }

    pub async fn user(&self, name: &str) -> anyhow::Result<UserRecord> {
        Ok(self.db.users().insert(name, false).await?)
    }

    pub async fn staff(&self, name: &str) -> anyhow::Result<UserRecord> {
        Ok(self.db.users().insert(name, true).await?)
    }

    pub async fn category(&self, name: &str, accepts_answers: bool) -> anyhow::Result<CategoryRecord> {
        Ok(self.db.categories().insert(name, accepts_answers).await?)
    }

    /// A topic with its opening post (post number 1) by the owner.
    pub async fn topic(
        &self,
        title: &str,
        owner: &UserRecord,
        category: Option<&CategoryRecord>,
    ) -> anyhow::Result<TopicRecord> {
        let topic = self
            .db
            .topics()
            .insert(title, owner.id, category.map(|c| c.id))
            .await?;
        self.db.posts().insert(topic.id, owner.id, 1).await?;
        Ok(topic)
    }

    pub async fn reply(
        &self,
        topic: &TopicRecord,
        author: &UserRecord,
        post_number: i64,
    ) -> anyhow::Result<PostRecord> {
        Ok(self.db.posts().insert(topic.id, author.id, post_number).await?)
    }

    pub async fn reload_topic(&self, topic_id: i64) -> anyhow::Result<TopicRecord> {
        self.db
            .topics()
            .find(topic_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("topic {topic_id} vanished"))
    }

    pub async fn reload_post(&self, post_id: i64) -> anyhow::Result<PostRecord> {
        self.db
            .posts()
            .find(post_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("post {post_id} vanished"))
    }

    pub async fn notifications(&self, topic_id: i64) -> anyhow::Result<Vec<NotificationRecord>> {
        Ok(self
            .db
            .notifications()
            .list_for_topic(NOTIFICATION_TYPE, topic_id)
            .await?)
    }

    /// Number of posts in the topic carrying the accepted flag.
    pub async fn accepted_flag_count(&self, topic_id: i64) -> anyhow::Result<usize> {
        Ok(self
            .db
            .posts()
            .list_for_topic(topic_id)
            .await?
            .iter()
            .filter(|p| p.is_accepted_answer)
            .count())
    }
}

pub fn actor(user: &UserRecord) -> Actor {
    Actor::from(user.clone())
}
