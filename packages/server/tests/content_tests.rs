//! Frontpage, comments, moderation and subscription settings.

mod common;

use chrono::Duration;
use commons_core::common::{Command, QueryResult};
use commons_core::domains::content::commands::PostLink;
use commons_core::domains::content::queries::{FindComment, FindSubmission};
use commons_core::domains::content::{ContentError, TreeId};
use commons_core::kernel::{BaseClock, LinkPreview, MockPreviewFetcher, TestDependencies};
use commons_core::shell::{Outcome, Request};
use ledger::CommandLog;
use test_context::test_context;

use crate::common::*;

#[test_context(TestHarness)]
#[tokio::test]
async fn test_frontpage_pages_by_ten(ctx: &TestHarness) {
    let alice = create_user(ctx, "alice").await.unwrap();
    for i in 0..10 {
        post_link(ctx, &alice, &format!("post-{}", i), "Example").await.unwrap();
    }

    assert_eq!(frontpage(ctx, 0).await.unwrap().len(), 10);
    assert_eq!(frontpage(ctx, 5).await.unwrap().len(), 5);
    assert_eq!(frontpage(ctx, 11).await.unwrap().len(), 0);

    for i in 10..20 {
        post_link(ctx, &alice, &format!("post-{}", i), "Example").await.unwrap();
    }
    assert_eq!(frontpage(ctx, 0).await.unwrap().len(), 10);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_frontpage_orders_by_score_then_recency(ctx: &TestHarness) {
    let alice = create_user(ctx, "alice").await.unwrap();
    let bob = create_user(ctx, "bob").await.unwrap();

    post_link(ctx, &alice, "older", "Older").await.unwrap();
    ctx.mocks.clock.advance(Duration::minutes(5));
    post_link(ctx, &alice, "newer", "Newer").await.unwrap();
    ctx.mocks.clock.advance(Duration::minutes(5));
    post_link(ctx, &alice, "voted", "Voted").await.unwrap();
    upvote(ctx, &bob, "voted").await.unwrap();

    let order: Vec<String> = frontpage(ctx, 0)
        .await
        .unwrap()
        .into_iter()
        .map(|submission| submission.item_id)
        .collect();
    assert_eq!(order, vec!["voted", "newer", "older"]);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_hidden_submissions_leave_the_frontpage(ctx: &TestHarness) {
    let alice = create_user(ctx, "alice").await.unwrap();
    post_link(ctx, &alice, "post-1", "First").await.unwrap();
    post_link(ctx, &alice, "post-2", "Second").await.unwrap();

    ctx.request(
        Request::command("HideSubmission")
            .header("session_id", &alice)
            .param("item_id", "post-1"),
    )
    .await
    .unwrap();
    let ids: Vec<String> = frontpage(ctx, 0).await.unwrap().into_iter().map(|s| s.item_id).collect();
    assert_eq!(ids, vec!["post-2"]);

    ctx.request(
        Request::command("UnhideSubmission")
            .header("session_id", &alice)
            .param("item_id", "post-1"),
    )
    .await
    .unwrap();
    assert_eq!(frontpage(ctx, 0).await.unwrap().len(), 2);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_comment_ids_are_stable(ctx: &TestHarness) {
    let alice = create_user(ctx, "alice").await.unwrap();
    post_link(ctx, &alice, "post-1", "Example").await.unwrap();

    comment(ctx, &alice, "post-1", "first").await.unwrap();
    comment(ctx, &alice, "post-1/0", "nested").await.unwrap();
    comment(ctx, &alice, "post-1", "second").await.unwrap();
    comment(ctx, &alice, "post-1", "third").await.unwrap();

    let nested = ctx
        .app
        .ask(FindComment {
            id: TreeId::new("post-1/0/0"),
        })
        .await
        .unwrap();
    assert_eq!(nested.content, "nested");

    let submission = ctx
        .app
        .ask(FindSubmission {
            item_id: "post-1".into(),
            viewer: None,
        })
        .await
        .unwrap();
    let paths: Vec<String> = submission.all_comments().map(|c| c.path.to_string()).collect();
    assert_eq!(paths, vec!["post-1/0", "post-1/0/0", "post-1/1", "post-1/2"]);
    assert_eq!(submission.comment_count, 4);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_comment_validation(ctx: &TestHarness) {
    let alice = create_user(ctx, "alice").await.unwrap();
    post_link(ctx, &alice, "post-1", "Example").await.unwrap();

    let err = comment(ctx, &alice, "post-1", "hi").await.unwrap_err();
    assert_eq!(err.downcast_ref::<ContentError>(), Some(&ContentError::CommentTooShort));

    let err = comment(ctx, &alice, "post-1", &"x".repeat(301)).await.unwrap_err();
    assert_eq!(err.downcast_ref::<ContentError>(), Some(&ContentError::CommentTooLong));

    let err = comment(ctx, &alice, "post-1/7", "orphan").await.unwrap_err();
    assert_eq!(err.downcast_ref::<ContentError>(), Some(&ContentError::UncommentableItem));

    let err = comment(ctx, &alice, "nowhere", "orphan").await.unwrap_err();
    assert_eq!(err.downcast_ref::<ContentError>(), Some(&ContentError::UncommentableItem));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_comments_render_markdown(ctx: &TestHarness) {
    let alice = create_user(ctx, "alice").await.unwrap();
    post_link(ctx, &alice, "post-1", "Example").await.unwrap();
    comment(ctx, &alice, "post-1", "**bold** <script>x</script>").await.unwrap();

    let rendered = ctx
        .app
        .ask(FindComment {
            id: TreeId::new("post-1/0"),
        })
        .await
        .unwrap();
    assert!(rendered.html.contains("<strong>bold</strong>"));
    assert!(!rendered.html.contains("<script>"));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_viewer_sees_own_vote(ctx: &TestHarness) {
    let alice = create_user(ctx, "alice").await.unwrap();
    let bob = create_user(ctx, "bob").await.unwrap();
    post_link(ctx, &alice, "post-1", "Example").await.unwrap();
    upvote(ctx, &bob, "post-1").await.unwrap();

    let as_bob = ctx
        .request(
            Request::query("FindSubmission")
                .header("session_id", &bob)
                .param("item_id", "post-1"),
        )
        .await
        .unwrap();
    match as_bob {
        Outcome::Query(QueryResult::Submission(submission)) => assert!(submission.viewer_has_voted),
        other => panic!("unexpected outcome {:?}", other),
    }

    let anonymous = ctx
        .request(Request::query("FindSubmission").param("item_id", "post-1"))
        .await
        .unwrap();
    match anonymous {
        Outcome::Query(QueryResult::Submission(submission)) => {
            assert!(!submission.viewer_has_voted);
            assert_eq!(submission.vote_count, 1);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_subscription_scopes_are_canonical(ctx: &TestHarness) {
    let alice = create_user(ctx, "alice").await.unwrap();

    subscribe(ctx, &alice, &["submissions", "replies", "submissions"]).await.unwrap();
    let settings = match ctx
        .request(Request::query("MySubscriptionSettings").header("session_id", &alice))
        .await
        .unwrap()
    {
        Outcome::Query(QueryResult::SubscriptionSettings(settings)) => settings,
        other => panic!("unexpected outcome {:?}", other),
    };
    assert!(settings.is_enabled("replies"));
    assert!(settings.is_enabled("submissions"));
    assert!(settings.disabled_for.is_empty());

    let err = subscribe(ctx, &alice, &["everything"]).await.unwrap_err();
    assert_eq!(
        err.downcast_ref::<ContentError>(),
        Some(&ContentError::InvalidSubscriptionScope("everything".into()))
    );

    let logged = ctx.logged().await;
    let canonical = logged.iter().rev().find_map(|command| match command {
        commons_core::common::Command::EnableSubscriptions(enable) => Some(enable.scopes.clone()),
        _ => None,
    });
    assert_eq!(canonical, Some(vec!["replies".to_string(), "submissions".to_string()]));
}

#[tokio::test]
async fn test_preview_generator_attaches_previews() {
    let preview = LinkPreview {
        title: Some("Extracted".into()),
        image_url: Some("https://example.com/cover.png".into()),
        ..LinkPreview::default()
    };
    let ctx = TestHarness::with_mocks(
        TestDependencies::new()
            .mock_previews(MockPreviewFetcher::new().with_preview("https://example.com/post-1", preview)),
    );
    let alice = create_user(&ctx, "alice").await.unwrap();
    post_link(&ctx, &alice, "post-1", "Example").await.unwrap();
    post_link(&ctx, &alice, "post-2", "Unreachable").await.unwrap();

    let mut generator = ctx.preview_generator();
    generator.catch_up().await;
    assert_eq!(generator.consumer().pending(), vec!["post-1", "post-2"]);
    generator.tick().await;
    generator.catch_up().await;
    assert!(generator.consumer().pending().is_empty());

    let with_preview = ctx
        .app
        .ask(FindSubmission {
            item_id: "post-1".into(),
            viewer: None,
        })
        .await
        .unwrap();
    let attached = with_preview.preview.expect("preview attached");
    assert_eq!(attached.title.as_deref(), Some("Extracted"));

    let without = ctx
        .app
        .ask(FindSubmission {
            item_id: "post-2".into(),
            viewer: None,
        })
        .await
        .unwrap();
    assert!(without.preview.is_none());

    // A restarted generator does not fetch again
    let mut restarted = ctx.preview_generator();
    restarted.catch_up().await;
    assert_eq!(restarted.consumer().pending(), vec!["post-2"]);
    assert_eq!(ctx.mocks.preview_fetcher.calls().len(), 2);
}

#[tokio::test]
async fn test_rejected_preview_does_not_drop_the_rest() {
    let preview = LinkPreview {
        title: Some("Extracted".into()),
        ..LinkPreview::default()
    };
    let ctx = TestHarness::with_mocks(
        TestDependencies::new().mock_previews(
            MockPreviewFetcher::new()
                .with_preview("https://example.com/ghost", preview.clone())
                .with_preview("https://example.com/post-1", preview),
        ),
    );

    // Logged without going through the app, so no submission exists for it
    ctx.log
        .append(&Command::from(PostLink {
            item_id: "ghost".into(),
            submitter: "alice".into(),
            url: "https://example.com/ghost".into(),
            title: "Ghost".into(),
            submitted_at: ctx.mocks.clock.now(),
        }))
        .await
        .unwrap();
    let alice = create_user(&ctx, "alice").await.unwrap();
    post_link(&ctx, &alice, "post-1", "Example").await.unwrap();

    let mut generator = ctx.preview_generator();
    generator.catch_up().await;
    assert_eq!(generator.consumer().pending(), vec!["ghost", "post-1"]);
    generator.tick().await;

    let post = ctx
        .app
        .ask(FindSubmission {
            item_id: "post-1".into(),
            viewer: None,
        })
        .await
        .unwrap();
    assert_eq!(post.preview.expect("preview attached").title.as_deref(), Some("Extracted"));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_item_ids_cannot_contain_the_path_separator(ctx: &TestHarness) {
    let alice = create_user(ctx, "alice").await.unwrap();

    let err = post_link(ctx, &alice, "a/b", "Nested").await.unwrap_err();
    assert_eq!(
        err.downcast_ref::<ContentError>(),
        Some(&ContentError::InvalidItemId("a/b".into()))
    );
    assert!(frontpage(ctx, 0).await.unwrap().is_empty());

    // Every accepted id stays addressable by comments
    post_link(ctx, &alice, "a-b", "Flat").await.unwrap();
    comment(ctx, &alice, "a-b", "hello").await.unwrap();
    let found = ctx
        .app
        .ask(FindComment {
            id: TreeId::new("a-b/0"),
        })
        .await
        .unwrap();
    assert_eq!(found.content, "hello");
}
