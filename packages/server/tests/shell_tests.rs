//! Request routing, context building and builder errors.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use commons_core::common::{Query, QueryResult};
use commons_core::domains::auth::queries::GetUserRoles;
use commons_core::domains::auth::AuthError;
use commons_core::shell::{Outcome, Request, Shell, ShellError};
use ledger::DispatchError;
use test_context::test_context;

use crate::common::*;

#[test_context(TestHarness)]
#[tokio::test]
async fn test_unknown_kind(ctx: &TestHarness) {
    let err = ctx
        .request(Request::default().header("kind", "event").header("name", "PostLink"))
        .await
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<ShellError>(),
        Some(&ShellError::UnknownRequestKind("event".into()))
    );
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_unknown_builder(ctx: &TestHarness) {
    let err = ctx.request(Request::command("DeleteEverything")).await.unwrap_err();
    assert_eq!(
        err.downcast_ref::<DispatchError>(),
        Some(&DispatchError::CommandNotAccepted {
            kind: "DeleteEverything".into()
        })
    );

    let err = ctx.request(Request::query("ListUsers")).await.unwrap_err();
    assert_eq!(
        err.downcast_ref::<DispatchError>(),
        Some(&DispatchError::QueryNotAccepted {
            kind: "ListUsers".into()
        })
    );
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_missing_session(ctx: &TestHarness) {
    let err = ctx
        .request(Request::command("Upvote").param("item_id", "post-1"))
        .await
        .unwrap_err();
    assert_eq!(err.downcast_ref::<AuthError>(), Some(&AuthError::SessionNotFound));

    let err = ctx
        .request(
            Request::query("MySubscriptionSettings").header("session_id", "no-such-session"),
        )
        .await
        .unwrap_err();
    assert_eq!(err.downcast_ref::<AuthError>(), Some(&AuthError::SessionNotFound));
    assert!(ctx.logged().await.is_empty());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_session_from_parameter(ctx: &TestHarness) {
    let alice = create_user(ctx, "alice").await.unwrap();

    let outcome = ctx
        .request(Request::query("MySubscriptionSettings").param("session_id", &alice))
        .await
        .unwrap();
    match outcome {
        Outcome::Query(QueryResult::SubscriptionSettings(settings)) => {
            assert_eq!(settings.subscriber, "alice");
            assert!(settings.enabled_for.is_empty());
        }
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_bad_parameters(ctx: &TestHarness) {
    let err = ctx
        .request(Request::query("GetFrontpage").param("after", "ten"))
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ShellError>(),
        Some(ShellError::InvalidParameter { name: "after", .. })
    ));

    let err = ctx.request(Request::command("Signup").param("username", "alice")).await.unwrap_err();
    assert_eq!(
        err.downcast_ref::<ShellError>(),
        Some(&ShellError::MissingParameter("password"))
    );
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_outcomes_serialize(ctx: &TestHarness) {
    let outcome = ctx
        .request(
            Request::command("Signup")
                .param("username", "alice")
                .param("password", "secret"),
        )
        .await
        .unwrap();
    assert_eq!(serde_json::to_value(&outcome).unwrap(), serde_json::json!({"command": {"id": 1}}));

    let outcome = ctx
        .request(Request::query("GetUserRoles").param("username", "alice"))
        .await
        .unwrap();
    assert_eq!(
        serde_json::to_value(&outcome).unwrap(),
        serde_json::json!({"query": {"type": "Roles", "result": ["visitor"]}})
    );
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_custom_builders(ctx: &TestHarness) {
    let mut shell = Shell::new(ctx.app.clone(), ctx.deps.clone());
    shell.register_query("Roles", |_env, request, _context| async move {
        let query = Query::from(GetUserRoles {
            username: request.parameters.get("who").to_string(),
        });
        Ok::<_, anyhow::Error>(query)
    });
    sign_up(ctx, "alice").await.unwrap();

    assert_eq!(shell.query_names(), vec!["Roles"]);
    assert!(shell.command_names().is_empty());
    let outcome = shell
        .do_request(Request::query("Roles").param("who", "alice"))
        .await
        .unwrap();
    assert!(matches!(outcome, Outcome::Query(QueryResult::Roles(_))));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn test_context_is_built_before_the_builder_lookup(ctx: &TestHarness) {
    let runs = Arc::new(AtomicUsize::new(0));
    let mut shell = Shell::new(ctx.app.clone(), ctx.deps.clone());
    let counter = runs.clone();
    shell.use_context(move |_env, _request, context| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, anyhow::Error>(context)
        }
    });

    let err = shell.do_request(Request::command("Unregistered")).await.unwrap_err();
    assert!(err.downcast_ref::<DispatchError>().is_some());
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    // Unknown kinds stop before any context is built
    shell
        .do_request(Request::default().header("kind", "event"))
        .await
        .unwrap_err();
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}
