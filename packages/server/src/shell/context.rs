use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::domains::auth::queries::FindSession;
use crate::domains::auth::{AuthError, Session};

use super::{Request, ShellEnv, ShellError};

/// What context builders learned about a request before it is built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestContext {
    pub current_time: Option<DateTime<Utc>>,
    /// Only ever an active session
    pub current_session: Option<Session>,
}

impl RequestContext {
    pub fn now(&self) -> Result<DateTime<Utc>, ShellError> {
        self.current_time.ok_or(ShellError::NotInContext("current_time"))
    }

    pub fn session(&self) -> Result<&Session, AuthError> {
        self.current_session.as_ref().ok_or(AuthError::SessionNotFound)
    }

    /// Username of the current session, if any.
    pub fn viewer(&self) -> Option<String> {
        self.current_session.as_ref().map(|session| session.username.clone())
    }
}

/// Stamp the request with the clock's time.
pub async fn current_time(env: ShellEnv, _request: Request, mut context: RequestContext) -> Result<RequestContext> {
    context.current_time = Some(env.deps.clock.now());
    Ok(context)
}

/// Attach the session named by the `session_id` header (or parameter) when
/// it exists and is active.
pub async fn current_session(env: ShellEnv, request: Request, mut context: RequestContext) -> Result<RequestContext> {
    let session_id = match request.headers.get("session_id") {
        "" => request.parameters.get("session_id"),
        header => header,
    };
    if session_id.is_empty() {
        return Ok(context);
    }

    let now = context.current_time.unwrap_or_else(|| env.deps.clock.now());
    let session = env
        .app
        .ask(FindSession {
            id: session_id.to_string(),
        })
        .await?;
    context.current_session = session.filter(|session| session.is_active(now));
    Ok(context)
}
