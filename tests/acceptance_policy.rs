mod common;
use common::{TestForum, actor};
use solvedd::config::SolvedConfig;
use solvedd::{Actor, SolvedError};

#[tokio::test]
async fn test_non_owner_rejected_without_state_change() -> anyhow::Result<()> {
    let forum = TestForum::new().await?;
    let owner = forum.user("owner").await?;
    let stranger = forum.user("stranger").await?;
    let category = forum.category("support", true).await?;
    let topic = forum.topic("Q", &owner, Some(&category)).await?;
    let post = forum.reply(&topic, &stranger, 2).await?;

    let err = forum.service.accept(topic.id, post.id, &actor(&stranger)).await.unwrap_err();
    assert!(matches!(err, SolvedError::NotAuthorized { .. }));

    let err = forum.service.accept(topic.id, post.id, &Actor::Anonymous).await.unwrap_err();
    assert!(matches!(err, SolvedError::NotAuthorized { .. }));

    assert_eq!(forum.reload_topic(topic.id).await?.accepted_post_id, None);
    assert!(forum.notifications(topic.id).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_closed_topic_blocks_owner_not_staff() -> anyhow::Result<()> {
    let forum = TestForum::new().await?;
    let owner = forum.user("owner").await?;
    let author = forum.user("author").await?;
    let moderator = forum.staff("moderator").await?;
    let category = forum.category("support", true).await?;
    let topic = forum.topic("Q", &owner, Some(&category)).await?;
    let post = forum.reply(&topic, &author, 2).await?;
    forum.db.topics().set_closed(topic.id, true).await?;

    let err = forum.service.accept(topic.id, post.id, &actor(&owner)).await.unwrap_err();
    assert!(matches!(err, SolvedError::NotAuthorized { .. }));

    forum.service.accept(topic.id, post.id, &actor(&moderator)).await?;
    assert_eq!(forum.reload_topic(topic.id).await?.accepted_post_id, Some(post.id));

    Ok(())
}

#[tokio::test]
async fn test_disabled_category_blocks_staff() -> anyhow::Result<()> {
    let forum = TestForum::new().await?;
    let owner = forum.user("owner").await?;
    let moderator = forum.staff("moderator").await?;
    let category = forum.category("chatter", false).await?;
    let topic = forum.topic("Q", &owner, Some(&category)).await?;
    let post = forum.reply(&topic, &owner, 2).await?;

    let err = forum.service.accept(topic.id, post.id, &actor(&moderator)).await.unwrap_err();
    assert!(matches!(err, SolvedError::NotAuthorized { .. }));
    assert!(!forum.service.can_modify_acceptance(&actor(&owner), topic.id).await?);

    Ok(())
}

#[tokio::test]
async fn test_global_override_allows_uncategorized() -> anyhow::Result<()> {
    let forum = TestForum::with_config(SolvedConfig {
        allow_solved_on_all_topics: true,
        ..SolvedConfig::default()
    })
    .await?;
    let owner = forum.user("owner").await?;
    let author = forum.user("author").await?;
    let topic = forum.topic("Q", &owner, None).await?;
    let post = forum.reply(&topic, &author, 2).await?;

    forum.service.accept(topic.id, post.id, &actor(&owner)).await?;
    assert_eq!(forum.reload_topic(topic.id).await?.accepted_post_id, Some(post.id));
    assert!(forum.service.permission_cache().allows_all());
    assert!(!forum.service.permission_cache().is_built());

    Ok(())
}

#[tokio::test]
async fn test_unaccept_requires_policy_too() -> anyhow::Result<()> {
    let forum = TestForum::new().await?;
    let owner = forum.user("owner").await?;
    let author = forum.user("author").await?;
    let category = forum.category("support", true).await?;
    let topic = forum.topic("Q", &owner, Some(&category)).await?;
    let post = forum.reply(&topic, &author, 2).await?;

    forum.service.accept(topic.id, post.id, &actor(&owner)).await?;

    let err = forum.service.unaccept(topic.id, post.id, &actor(&author)).await.unwrap_err();
    assert!(matches!(err, SolvedError::NotAuthorized { .. }));
    assert_eq!(forum.reload_topic(topic.id).await?.accepted_post_id, Some(post.id));
    assert_eq!(forum.notifications(topic.id).await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_opening_post_cannot_be_accepted() -> anyhow::Result<()> {
    let forum = TestForum::new().await?;
    let owner = forum.user("owner").await?;
    let moderator = forum.staff("moderator").await?;
    let category = forum.category("support", true).await?;
    let topic = forum.topic("Q", &owner, Some(&category)).await?;
    let opening = forum.db.posts().list_for_topic(topic.id).await?[0].clone();
    assert_eq!(opening.post_number, 1);

    let err = forum.service.accept(topic.id, opening.id, &actor(&moderator)).await.unwrap_err();
    assert!(matches!(
        err,
        SolvedError::PreconditionFailed { topic_id, post_id } if topic_id == topic.id && post_id == opening.id
    ));
    assert_eq!(forum.reload_topic(topic.id).await?.accepted_post_id, None);
    assert!(!forum.reload_post(opening.id).await?.is_accepted_answer);

    Ok(())
}

#[tokio::test]
async fn test_lowered_minimum_allows_opening_post() -> anyhow::Result<()> {
    let forum = TestForum::with_config(SolvedConfig {
        min_post_number: 1,
        ..SolvedConfig::default()
    })
    .await?;
    let owner = forum.user("owner").await?;
    let moderator = forum.staff("moderator").await?;
    let category = forum.category("support", true).await?;
    let topic = forum.topic("Q", &owner, Some(&category)).await?;
    let opening = forum.db.posts().list_for_topic(topic.id).await?[0].clone();

    forum.service.accept(topic.id, opening.id, &actor(&moderator)).await?;
    assert_eq!(forum.reload_topic(topic.id).await?.accepted_post_id, Some(opening.id));

    Ok(())
}
