mod common;
use common::{TestForum, actor};
use solvedd::solved::{AcceptedAnswer, Transition, post_actions};
use solvedd::{Actor, SolvedError};

#[tokio::test]
async fn test_annotation_marks_exactly_accepted_topics() -> anyhow::Result<()> {
    let forum = TestForum::new().await?;
    let owner = forum.user("owner").await?;
    let author = forum.user("author").await?;
    let category = forum.category("support", true).await?;

    let mut ids = Vec::new();
    let mut expected = Vec::new();
    for i in 0..12 {
        let topic = forum.topic(&format!("topic {i}"), &owner, Some(&category)).await?;
        let post = forum.reply(&topic, &author, 2).await?;
        if i % 4 == 0 {
            forum.service.accept(topic.id, post.id, &actor(&owner)).await?;
            expected.push(topic.id);
        }
        ids.push(topic.id);
    }

    let marks = forum.service.annotate_topics(&ids).await?;
    assert_eq!(marks.len(), ids.len());
    assert_eq!(marks.values().filter(|m| **m).count(), expected.len());
    for id in expected {
        assert_eq!(marks.get(&id), Some(&true));
    }

    Ok(())
}

#[tokio::test]
async fn test_projector_reports_number_and_author() -> anyhow::Result<()> {
    let forum = TestForum::new().await?;
    let owner = forum.user("owner").await?;
    let author = forum.user("helpful").await?;
    let category = forum.category("support", true).await?;
    let topic = forum.topic("Q", &owner, Some(&category)).await?;
    forum.reply(&topic, &owner, 2).await?;
    let answer = forum.reply(&topic, &author, 3).await?;

    assert_eq!(forum.service.accepted_answer(topic.id).await?, None);

    forum.service.accept(topic.id, answer.id, &actor(&owner)).await?;
    assert_eq!(
        forum.service.accepted_answer(topic.id).await?,
        Some(AcceptedAnswer {
            post_number: 3,
            username: "helpful".to_string(),
        })
    );

    Ok(())
}

#[tokio::test]
async fn test_projector_tolerates_deleted_post() -> anyhow::Result<()> {
    let forum = TestForum::new().await?;
    let owner = forum.user("owner").await?;
    let author = forum.user("author").await?;
    let second = forum.user("second").await?;
    let category = forum.category("support", true).await?;
    let topic = forum.topic("Q", &owner, Some(&category)).await?;
    let answer = forum.reply(&topic, &author, 2).await?;

    forum.service.accept(topic.id, answer.id, &actor(&owner)).await?;
    forum.db.posts().delete(answer.id).await?;

    assert_eq!(forum.reload_topic(topic.id).await?.accepted_post_id, Some(answer.id));
    assert_eq!(forum.service.accepted_answer(topic.id).await?, None);

    // A new acceptance replaces the dangling pointer and its notification.
    let replacement = forum.reply(&topic, &second, 3).await?;
    assert_ne!(replacement.id, answer.id);
    let outcome = forum.service.accept(topic.id, replacement.id, &actor(&owner)).await?;
    assert_eq!(
        outcome.transition,
        Transition::Replace { previous: answer.id, post_id: replacement.id }
    );
    assert!(forum.reload_post(replacement.id).await?.is_accepted_answer);
    assert_eq!(
        forum.service.accepted_answer(topic.id).await?.map(|a| a.post_number),
        Some(3)
    );

    let notes = forum.notifications(topic.id).await?;
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].user_id, second.id);
    assert_eq!(notes[0].post_number, 3);

    Ok(())
}

#[tokio::test]
async fn test_replace_after_deleting_non_last_post() -> anyhow::Result<()> {
    let forum = TestForum::new().await?;
    let owner = forum.user("owner").await?;
    let author = forum.user("author").await?;
    let second = forum.user("second").await?;
    let category = forum.category("support", true).await?;
    let topic = forum.topic("Q", &owner, Some(&category)).await?;
    let answer = forum.reply(&topic, &author, 2).await?;
    let later = forum.reply(&topic, &second, 3).await?;

    forum.service.accept(topic.id, answer.id, &actor(&owner)).await?;
    forum.db.posts().delete(answer.id).await?;

    let outcome = forum.service.accept(topic.id, later.id, &actor(&owner)).await?;
    assert_eq!(
        outcome.transition,
        Transition::Replace { previous: answer.id, post_id: later.id }
    );
    assert_eq!(forum.reload_topic(topic.id).await?.accepted_post_id, Some(later.id));
    assert_eq!(forum.accepted_flag_count(topic.id).await?, 1);

    let notes = forum.notifications(topic.id).await?;
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].user_id, second.id);
    assert_eq!(notes[0].post_number, 3);

    Ok(())
}

#[tokio::test]
async fn test_deleted_post_id_is_not_reused() -> anyhow::Result<()> {
    let forum = TestForum::new().await?;
    let owner = forum.user("owner").await?;
    let author = forum.user("author").await?;
    let second = forum.user("second").await?;
    let category = forum.category("support", true).await?;
    let topic = forum.topic("Q", &owner, Some(&category)).await?;
    let answer = forum.reply(&topic, &author, 2).await?;

    forum.service.accept(topic.id, answer.id, &actor(&owner)).await?;
    forum.db.posts().delete(answer.id).await?;
    let reply = forum.reply(&topic, &second, 3).await?;

    assert!(reply.id > answer.id);
    // The new reply must not show up as the accepted answer.
    assert_eq!(forum.service.accepted_answer(topic.id).await?, None);
    let actions = forum.service.post_actions(&actor(&owner), topic.id).await?;
    assert!(actions[&reply.id].can_accept_answer);
    assert!(!actions[&reply.id].accepted_answer);

    Ok(())
}

#[tokio::test]
async fn test_unaccept_clears_pointer_to_deleted_post() -> anyhow::Result<()> {
    let forum = TestForum::new().await?;
    let owner = forum.user("owner").await?;
    let author = forum.user("author").await?;
    let category = forum.category("support", true).await?;
    let topic = forum.topic("Q", &owner, Some(&category)).await?;
    let answer = forum.reply(&topic, &author, 2).await?;
    let other = forum.reply(&topic, &author, 3).await?;

    forum.service.accept(topic.id, answer.id, &actor(&owner)).await?;
    forum.db.posts().delete(answer.id).await?;
    forum.db.posts().delete(other.id).await?;

    // A deleted post that was never accepted is still unknown.
    let err = forum.service.unaccept(topic.id, other.id, &actor(&owner)).await.unwrap_err();
    assert!(matches!(err, SolvedError::NotFound(_)));

    let outcome = forum.service.unaccept(topic.id, answer.id, &actor(&owner)).await?;
    assert_eq!(outcome.transition, Transition::Clear { post_id: answer.id });
    assert_eq!(forum.reload_topic(topic.id).await?.accepted_post_id, None);
    assert!(forum.notifications(topic.id).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_post_actions_follow_acceptance() -> anyhow::Result<()> {
    let forum = TestForum::new().await?;
    let owner = forum.user("owner").await?;
    let author = forum.user("author").await?;
    let category = forum.category("support", true).await?;
    let topic = forum.topic("Q", &owner, Some(&category)).await?;
    let reply = forum.reply(&topic, &author, 2).await?;
    let opening = forum.db.posts().list_for_topic(topic.id).await?[0].clone();

    let actions = forum.service.post_actions(&actor(&owner), topic.id).await?;
    assert!(!actions[&opening.id].can_accept_answer);
    assert!(actions[&reply.id].can_accept_answer);
    assert!(!actions[&reply.id].can_unaccept_answer);

    forum.service.accept(topic.id, reply.id, &actor(&owner)).await?;

    let actions = forum.service.post_actions(&actor(&owner), topic.id).await?;
    assert!(actions[&reply.id].accepted_answer);
    assert!(actions[&reply.id].can_unaccept_answer);
    assert!(!actions[&reply.id].can_accept_answer);

    let viewer = forum.service.post_actions(&Actor::Anonymous, topic.id).await?;
    assert!(viewer[&reply.id].accepted_answer);
    assert!(!viewer[&reply.id].can_unaccept_answer);

    Ok(())
}

#[tokio::test]
async fn test_single_post_actions_helper() -> anyhow::Result<()> {
    let forum = TestForum::new().await?;
    let owner = forum.user("owner").await?;
    let author = forum.user("author").await?;
    let category = forum.category("support", true).await?;
    let topic = forum.topic("Q", &owner, Some(&category)).await?;
    let reply = forum.reply(&topic, &author, 2).await?;

    let policy = solvedd::solved::AcceptancePolicy::new(forum.service.permission_cache().clone());
    let actions = post_actions(&policy, &actor(&author), &topic, &reply, 2).await?;
    assert!(!actions.can_accept_answer);
    assert!(!actions.accepted_answer);

    Ok(())
}
