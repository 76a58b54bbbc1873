//! Stock builders. Each reads string parameters and the request context and
//! produces one typed command or query.

use anyhow::Result;
use serde_json::{json, Map, Value};

use crate::common::{Command, Query};
use crate::domains::auth::commands::{
    ChangeUsernamePolicy, LinkVerifiedEmailToUser, LogInUser, LogInWithMagic, RequestMagicLinkLogin,
    RequestPasswordReset, ResetPassword, SetAdminUsers, SetMagicDomains, SignUpUser,
};
use crate::domains::auth::queries::{FindSession, FindUserByEmail, FindUserPasswordHash, GetUserRoles};
use crate::domains::auth::AuthError;
use crate::domains::content::commands::{
    DisableSubscriptions, EnableSubscriptions, HideComment, HideSubmission, PostComment, PostLink,
    SetNotifierConfig, UnhideComment, UnhideSubmission, UpvoteSubmission,
};
use crate::domains::content::queries::{FindSubmission, GetFrontpage, MySubscriptionSettings};
use crate::domains::content::TreeId;
use crate::domains::email::commands::QueueEmail;

use super::{Parameters, Request, RequestContext, Shell, ShellEnv, ShellError};

/// Policy installed by `SetDefaultUsernamePolicy`.
pub const DEFAULT_USERNAME_POLICY: (usize, usize, &[&str]) = (5, 100, &["guest"]);

pub const WELCOME_TEMPLATE: &str = "welcome";

pub fn register_defaults(shell: &mut Shell) {
    shell
        .register_command("PostLink", post_link)
        .register_command("Signup", sign_up)
        .register_command("LogIn", log_in)
        .register_command("RequestMagicLinkLogin", request_magic_link_login)
        .register_command("LogInWithMagic", log_in_with_magic)
        .register_command("LinkVerifiedEmailToUser", link_verified_email)
        .register_command("SetAdminUsers", set_admin_users)
        .register_command("SetMagicDomains", set_magic_domains)
        .register_command("Upvote", upvote)
        .register_command("HideSubmission", hide_submission)
        .register_command("UnhideSubmission", unhide_submission)
        .register_command("HideComment", hide_comment)
        .register_command("UnhideComment", unhide_comment)
        .register_command("Comment", comment)
        .register_command("RequestPasswordReset", request_password_reset)
        .register_command("ResetPassword", reset_password)
        .register_command("SetDefaultUsernamePolicy", set_default_username_policy)
        .register_command("SetChangeUsernamePolicy", set_username_policy)
        .register_command("EnableSubscriptions", enable_subscriptions)
        .register_command("DisableSubscriptions", disable_subscriptions)
        .register_command("SetNotifierConfig", set_notifier_config)
        .register_command("QueueEmail", queue_email)
        .register_command("SendWelcomeEmail", send_welcome_email);

    shell
        .register_query("GetUserRoles", get_user_roles)
        .register_query("FindSession", find_session)
        .register_query("GetFrontpage", get_frontpage)
        .register_query("FindSubmission", find_submission)
        .register_query("MySubscriptionSettings", my_subscription_settings);
}

// =============================================================================
// Parameter helpers
// =============================================================================

fn required(params: &Parameters, name: &'static str) -> Result<String, ShellError> {
    match params.get(name) {
        "" => Err(ShellError::MissingParameter(name)),
        value => Ok(value.to_string()),
    }
}

fn number(params: &Parameters, name: &'static str, default: usize) -> Result<usize, ShellError> {
    match params.get(name) {
        "" => Ok(default),
        raw => raw.parse().map_err(|e: std::num::ParseIntError| ShellError::InvalidParameter {
            name,
            reason: e.to_string(),
        }),
    }
}

fn flag(params: &Parameters, name: &'static str) -> Result<bool, ShellError> {
    match params.get(name) {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(ShellError::InvalidParameter {
            name,
            reason: format!("expected a boolean, got {:?}", other),
        }),
    }
}

// =============================================================================
// Auth commands
// =============================================================================

async fn sign_up(env: ShellEnv, request: Request, context: RequestContext) -> Result<Command> {
    let params = &request.parameters;
    let password = required(params, "password")?;

    Ok(SignUpUser {
        username: required(params, "username")?,
        password_hash: env.deps.password_hasher.hash(&password)?,
        created_at: context.now()?,
    }
    .into())
}

async fn log_in(env: ShellEnv, request: Request, context: RequestContext) -> Result<Command> {
    let params = &request.parameters;
    let username = required(params, "username")?;
    let password_hash = env
        .app
        .ask(FindUserPasswordHash {
            username: username.clone(),
            password: required(params, "password")?,
        })
        .await?;
    let session_id = match params.get("session_id") {
        "" => env.deps.ids.new_id(),
        id => id.to_string(),
    };

    Ok(LogInUser {
        username,
        password_hash,
        session_id,
        attempted_at: context.now()?,
    }
    .into())
}

async fn request_magic_link_login(env: ShellEnv, request: Request, context: RequestContext) -> Result<Command> {
    Ok(RequestMagicLinkLogin {
        email: required(&request.parameters, "email")?,
        magic: env.deps.ids.new_id(),
        requested_at: context.now()?,
    }
    .into())
}

async fn log_in_with_magic(env: ShellEnv, request: Request, context: RequestContext) -> Result<Command> {
    let session_id = match request.parameters.get("session_id") {
        "" => env.deps.ids.new_id(),
        id => id.to_string(),
    };

    Ok(LogInWithMagic {
        session_id,
        magic: required(&request.parameters, "magic")?,
        attempted_at: context.now()?,
    }
    .into())
}

async fn link_verified_email(_env: ShellEnv, request: Request, context: RequestContext) -> Result<Command> {
    Ok(LinkVerifiedEmailToUser {
        username: required(&request.parameters, "username")?,
        email: required(&request.parameters, "email")?,
        linked_at: context.now()?,
    }
    .into())
}

async fn set_admin_users(_env: ShellEnv, request: Request, _context: RequestContext) -> Result<Command> {
    Ok(SetAdminUsers {
        usernames: request.parameters.get_all("username"),
    }
    .into())
}

async fn set_magic_domains(_env: ShellEnv, request: Request, _context: RequestContext) -> Result<Command> {
    Ok(SetMagicDomains {
        domains: request.parameters.get_all("domain"),
    }
    .into())
}

async fn request_password_reset(env: ShellEnv, request: Request, context: RequestContext) -> Result<Command> {
    let email = required(&request.parameters, "email")?;
    let user = env
        .app
        .ask(FindUserByEmail { email: email.clone() })
        .await?
        .ok_or(AuthError::UserNotFound)?;

    Ok(RequestPasswordReset {
        username: user.username,
        email,
        token: env.deps.ids.new_id(),
        requested_at: context.now()?,
    }
    .into())
}

async fn reset_password(env: ShellEnv, request: Request, context: RequestContext) -> Result<Command> {
    let params = &request.parameters;
    let password = required(params, "password")?;

    Ok(ResetPassword {
        token: required(params, "token")?,
        new_password_hash: env.deps.password_hasher.hash(&password)?,
        attempted_at: context.now()?,
    }
    .into())
}

async fn set_default_username_policy(_env: ShellEnv, _request: Request, _context: RequestContext) -> Result<Command> {
    let (min_length, max_length, blacklist) = DEFAULT_USERNAME_POLICY;
    Ok(ChangeUsernamePolicy {
        min_length,
        max_length,
        blacklist: blacklist.iter().map(|name| name.to_string()).collect(),
    }
    .into())
}

async fn set_username_policy(_env: ShellEnv, request: Request, _context: RequestContext) -> Result<Command> {
    let params = &request.parameters;
    Ok(ChangeUsernamePolicy {
        min_length: number(params, "min_length", 0)?,
        max_length: number(params, "max_length", usize::MAX)?,
        blacklist: params.get_all("blacklist"),
    }
    .into())
}

// =============================================================================
// Content commands
// =============================================================================

async fn post_link(env: ShellEnv, request: Request, context: RequestContext) -> Result<Command> {
    let session = context.session()?;
    let params = &request.parameters;
    let item_id = match params.get("item_id") {
        "" => env.deps.ids.new_id(),
        id => id.to_string(),
    };

    Ok(PostLink {
        item_id,
        submitter: session.username.clone(),
        url: params.get("url").to_string(),
        title: params.get("title").to_string(),
        submitted_at: context.now()?,
    }
    .into())
}

async fn comment(_env: ShellEnv, request: Request, context: RequestContext) -> Result<Command> {
    let session = context.session()?;
    let params = &request.parameters;

    Ok(PostComment {
        parent: TreeId::new(&required(params, "item_id")?),
        author: session.username.clone(),
        content: params.get("text").to_string(),
        posted_at: context.now()?,
    }
    .into())
}

async fn upvote(_env: ShellEnv, request: Request, context: RequestContext) -> Result<Command> {
    let session = context.session()?;
    Ok(UpvoteSubmission {
        item_id: required(&request.parameters, "item_id")?,
        voter: session.username.clone(),
        voted_at: context.now()?,
    }
    .into())
}

async fn hide_submission(_env: ShellEnv, request: Request, context: RequestContext) -> Result<Command> {
    let session = context.session()?;
    Ok(HideSubmission {
        item_id: required(&request.parameters, "item_id")?,
        hidden_by: session.username.clone(),
        hidden_at: context.now()?,
    }
    .into())
}

async fn unhide_submission(_env: ShellEnv, request: Request, context: RequestContext) -> Result<Command> {
    let session = context.session()?;
    Ok(UnhideSubmission {
        item_id: required(&request.parameters, "item_id")?,
        unhidden_by: session.username.clone(),
        unhidden_at: context.now()?,
    }
    .into())
}

async fn hide_comment(_env: ShellEnv, request: Request, context: RequestContext) -> Result<Command> {
    let session = context.session()?;
    Ok(HideComment {
        comment_id: TreeId::new(&required(&request.parameters, "item_id")?),
        hidden_by: session.username.clone(),
        hidden_at: context.now()?,
    }
    .into())
}

async fn unhide_comment(_env: ShellEnv, request: Request, context: RequestContext) -> Result<Command> {
    let session = context.session()?;
    Ok(UnhideComment {
        comment_id: TreeId::new(&required(&request.parameters, "item_id")?),
        unhidden_by: session.username.clone(),
        unhidden_at: context.now()?,
    }
    .into())
}

async fn enable_subscriptions(_env: ShellEnv, request: Request, context: RequestContext) -> Result<Command> {
    let session = context.session()?;
    Ok(EnableSubscriptions {
        username: session.username.clone(),
        scopes: request.parameters.get_all("scope"),
        enabled_at: context.now()?,
    }
    .into())
}

async fn disable_subscriptions(_env: ShellEnv, request: Request, context: RequestContext) -> Result<Command> {
    let session = context.session()?;
    Ok(DisableSubscriptions {
        username: session.username.clone(),
        scopes: request.parameters.get_all("scope"),
        disabled_at: context.now()?,
    }
    .into())
}

async fn set_notifier_config(_env: ShellEnv, request: Request, context: RequestContext) -> Result<Command> {
    Ok(SetNotifierConfig {
        enabled: flag(&request.parameters, "enabled")?,
        changed_at: context.now()?,
    }
    .into())
}

// =============================================================================
// Email commands
// =============================================================================

async fn queue_email(_env: ShellEnv, request: Request, _context: RequestContext) -> Result<Command> {
    let params = &request.parameters;
    let template_data = match params.get("template_data") {
        "" => Map::new(),
        raw => serde_json::from_str(raw).map_err(|e| ShellError::InvalidParameter {
            name: "template_data",
            reason: e.to_string(),
        })?,
    };

    Ok(QueueEmail {
        internal_id: params.get("internal_id").to_string(),
        recipients: params.get("email").to_string(),
        subject: params.get("subject").to_string(),
        template: params.get("template").to_string(),
        template_data,
    }
    .into())
}

async fn send_welcome_email(env: ShellEnv, request: Request, _context: RequestContext) -> Result<Command> {
    let params = &request.parameters;
    let email = required(params, "email")?;
    let username = required(params, "username")?;

    let template_data = match json!({
        "name": username,
        "username": username,
        "login_url": env.deps.link(&["login"], &[]),
    }) {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    Ok(QueueEmail {
        internal_id: env.deps.ids.new_id(),
        recipients: email,
        subject: "Welcome".to_string(),
        template: WELCOME_TEMPLATE.to_string(),
        template_data,
    }
    .into())
}

// =============================================================================
// Queries
// =============================================================================

async fn get_user_roles(_env: ShellEnv, request: Request, _context: RequestContext) -> Result<Query> {
    Ok(GetUserRoles {
        username: required(&request.parameters, "username")?,
    }
    .into())
}

async fn find_session(_env: ShellEnv, request: Request, _context: RequestContext) -> Result<Query> {
    Ok(FindSession {
        id: required(&request.parameters, "session_id")?,
    }
    .into())
}

async fn get_frontpage(_env: ShellEnv, request: Request, context: RequestContext) -> Result<Query> {
    Ok(GetFrontpage {
        viewer: context.viewer(),
        after: number(&request.parameters, "after", 0)?,
    }
    .into())
}

async fn find_submission(_env: ShellEnv, request: Request, context: RequestContext) -> Result<Query> {
    Ok(FindSubmission {
        item_id: required(&request.parameters, "item_id")?,
        viewer: context.viewer(),
    }
    .into())
}

async fn my_subscription_settings(_env: ShellEnv, _request: Request, context: RequestContext) -> Result<Query> {
    Ok(MySubscriptionSettings {
        username: context.session()?.username.clone(),
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_defaults_and_rejects_garbage() {
        let params: Parameters = [("after", "5"), ("bad", "five")].into_iter().collect();

        assert_eq!(number(&params, "after", 0).unwrap(), 5);
        assert_eq!(number(&params, "missing", 7).unwrap(), 7);
        assert!(matches!(
            number(&params, "bad", 0),
            Err(ShellError::InvalidParameter { name: "bad", .. })
        ));
    }

    #[test]
    fn test_required_rejects_empty() {
        let params: Parameters = [("email", "")].into_iter().collect();
        assert_eq!(required(&params, "email"), Err(ShellError::MissingParameter("email")));
    }

    #[test]
    fn test_flag() {
        let params: Parameters = [("on", "true"), ("off", "0")].into_iter().collect();
        assert_eq!(flag(&params, "on"), Ok(true));
        assert_eq!(flag(&params, "off"), Ok(false));
        assert!(flag(&params, "missing").is_err());
    }
}
