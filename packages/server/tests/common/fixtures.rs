//! Test fixtures for creating test data.
//!
//! Fixtures go through the shell so the stock builders are exercised along
//! the way.

#![allow(dead_code)]

use anyhow::{bail, Result};
use commons_core::common::QueryResult;
use commons_core::domains::content::Submission;
use commons_core::shell::{Outcome, Request};

use super::TestHarness;

/// Sign up `username` with password `"secret"`.
pub async fn sign_up(ctx: &TestHarness, username: &str) -> Result<u64> {
    command_id(
        ctx.request(
            Request::command("Signup")
                .param("username", username)
                .param("password", "secret"),
        )
        .await?,
    )
}

/// Log `username` in and return the new session id.
pub async fn log_in(ctx: &TestHarness, username: &str) -> Result<String> {
    let session_id = format!("session-{}", username);
    ctx.request(
        Request::command("LogIn")
            .param("username", username)
            .param("password", "secret")
            .param("session_id", &session_id),
    )
    .await?;
    Ok(session_id)
}

/// Sign up, verify `<username>@example.com` and log in.
pub async fn create_user(ctx: &TestHarness, username: &str) -> Result<String> {
    sign_up(ctx, username).await?;
    ctx.request(
        Request::command("LinkVerifiedEmailToUser")
            .param("username", username)
            .param("email", &email_of(username)),
    )
    .await?;
    log_in(ctx, username).await
}

pub fn email_of(username: &str) -> String {
    format!("{}@example.com", username)
}

pub async fn post_link(ctx: &TestHarness, session_id: &str, item_id: &str, title: &str) -> Result<u64> {
    command_id(
        ctx.request(
            Request::command("PostLink")
                .header("session_id", session_id)
                .param("item_id", item_id)
                .param("title", title)
                .param("url", &format!("https://example.com/{}", item_id)),
        )
        .await?,
    )
}

/// Reply to the submission or comment at `parent` (e.g. `post-1/0`).
pub async fn comment(ctx: &TestHarness, session_id: &str, parent: &str, text: &str) -> Result<u64> {
    command_id(
        ctx.request(
            Request::command("Comment")
                .header("session_id", session_id)
                .param("item_id", parent)
                .param("text", text),
        )
        .await?,
    )
}

pub async fn upvote(ctx: &TestHarness, session_id: &str, item_id: &str) -> Result<u64> {
    command_id(
        ctx.request(
            Request::command("Upvote")
                .header("session_id", session_id)
                .param("item_id", item_id),
        )
        .await?,
    )
}

pub async fn subscribe(ctx: &TestHarness, session_id: &str, scopes: &[&str]) -> Result<u64> {
    let mut request = Request::command("EnableSubscriptions").header("session_id", session_id);
    for (i, scope) in scopes.iter().enumerate() {
        request = request.param(&format!("scope[{}]", i), scope);
    }
    command_id(ctx.request(request).await?)
}

pub async fn frontpage(ctx: &TestHarness, after: usize) -> Result<Vec<Submission>> {
    match ctx
        .request(Request::query("GetFrontpage").param("after", &after.to_string()))
        .await?
    {
        Outcome::Query(QueryResult::Submissions(submissions)) => Ok(submissions),
        other => bail!("unexpected outcome {:?}", other),
    }
}

pub fn command_id(outcome: Outcome) -> Result<u64> {
    match outcome {
        Outcome::Command { id } => Ok(id),
        other => bail!("expected a command outcome, got {:?}", other),
    }
}
