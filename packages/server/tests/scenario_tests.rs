//! End-to-end scenarios, driven through the shell.

mod common;

use commons_core::common::Command;
use commons_core::domains::auth::commands::{ChangeUsernamePolicy, SignUpUser};
use commons_core::domains::auth::queries::FindSession;
use commons_core::domains::auth::AuthError;
use commons_core::domains::content::queries::FindComment;
use commons_core::domains::content::{ContentError, TreeId};
use commons_core::domains::notifier::NOTIFICATION_TEMPLATE;
use commons_core::kernel::BaseClock;
use test_context::test_context;

use crate::common::*;

#[test_context(TestHarness)]
#[tokio::test]
async fn test_sign_up_then_log_in_opens_a_session(ctx: &TestHarness) {
    sign_up(ctx, "alice").await.unwrap();
    let session_id = log_in(ctx, "alice").await.unwrap();

    let session = ctx
        .app
        .ask(FindSession { id: session_id })
        .await
        .unwrap()
        .expect("session exists");
    assert_eq!(session.username, "alice");
    assert!(session.is_active(ctx.mocks.clock.now()));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_nested_comments_are_addressable(ctx: &TestHarness) {
    let alice = create_user(ctx, "alice").await.unwrap();

    post_link(ctx, &alice, "post-1", "Example").await.unwrap();
    comment(ctx, &alice, "post-1", "hello").await.unwrap();
    comment(ctx, &alice, "post-1/0", "reply").await.unwrap();

    let reply = ctx
        .app
        .ask(FindComment {
            id: TreeId::new("post-1/0/0"),
        })
        .await
        .unwrap();
    assert_eq!(reply.content, "reply");
    assert_eq!(reply.parent_path(), TreeId::new("post-1/0"));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_second_upvote_is_rejected(ctx: &TestHarness) {
    let alice = create_user(ctx, "alice").await.unwrap();
    let bob = create_user(ctx, "bob").await.unwrap();
    post_link(ctx, &alice, "post-1", "Example").await.unwrap();

    upvote(ctx, &bob, "post-1").await.unwrap();
    let err = upvote(ctx, &bob, "post-1").await.unwrap_err();
    assert_eq!(err.downcast_ref::<ContentError>(), Some(&ContentError::AlreadyVoted));

    let top = frontpage(ctx, 0).await.unwrap();
    assert_eq!(top[0].item_id, "post-1");
    assert_eq!(top[0].vote_count, 1);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_subscriber_is_emailed_about_new_submission(ctx: &TestHarness) {
    let alice = create_user(ctx, "alice").await.unwrap();
    let bob = create_user(ctx, "bob").await.unwrap();
    subscribe(ctx, &alice, &["submissions"]).await.unwrap();
    post_link(ctx, &bob, "post-1", "Example").await.unwrap();

    let mut notifier = ctx.notifier();
    notifier.catch_up().await;
    let scheduled = notifier.consumer().scheduled();
    assert_eq!(scheduled.len(), 1);
    assert_eq!(scheduled[0].recipient, "alice");

    notifier.tick().await;

    let queued: Vec<_> = ctx
        .logged()
        .await
        .into_iter()
        .filter_map(|command| match command {
            Command::QueueEmail(queue) => Some(queue),
            _ => None,
        })
        .collect();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].template, NOTIFICATION_TEMPLATE);
    assert_eq!(queued[0].recipients, email_of("alice"));
    assert_eq!(queued[0].template_data["title"], "Example");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_username_policy_applies_to_later_sign_ups(ctx: &TestHarness) {
    let now = ctx.mocks.clock.now();
    ctx.app
        .handle_command(
            ChangeUsernamePolicy {
                min_length: 5,
                max_length: 20,
                blacklist: vec![],
            }
            .into(),
        )
        .await
        .unwrap();

    let err = ctx
        .app
        .handle_command(
            SignUpUser {
                username: "ab".into(),
                password_hash: "hashed:secret".into(),
                created_at: now,
            }
            .into(),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<AuthError>(),
        Some(&AuthError::UsernameNotAllowed("ab".into()))
    );

    ctx.app
        .handle_command(
            SignUpUser {
                username: "abcdef".into(),
                password_hash: "hashed:secret".into(),
                created_at: now,
            }
            .into(),
        )
        .await
        .unwrap();
}
