use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use chrono::Duration;
use ledger::{Accepted, HandlerError, Module};
use tracing::info;

use crate::common::{Command, Query, QueryResult};
use crate::kernel::BasePasswordHasher;

use super::commands::{
    LogInUser, LogInWithMagic, RequestMagicLinkLogin, RequestPasswordReset, ResetPassword, SignUpUser,
};
use super::models::{Session, User, UserRole, UsernamePolicy};
use super::AuthError;

/// How long a password reset token stays usable, in minutes.
pub const PASSWORD_RESET_MINUTES: i64 = 30;

type Result<T> = std::result::Result<T, AuthError>;

pub struct Auth {
    password_hasher: Arc<dyn BasePasswordHasher>,
    policy: UsernamePolicy,
    users: BTreeMap<String, User>,
    sessions: HashMap<String, Session>,
    admins: BTreeSet<String>,
    magic_domains: BTreeSet<String>,
}

impl Auth {
    pub fn new(password_hasher: Arc<dyn BasePasswordHasher>) -> Self {
        Self {
            password_hasher,
            policy: UsernamePolicy::default(),
            users: BTreeMap::new(),
            sessions: HashMap::new(),
            admins: BTreeSet::new(),
            magic_domains: BTreeSet::new(),
        }
    }

    fn sign_up(&mut self, cmd: &SignUpUser) -> Result<()> {
        if !self.policy.allows(&cmd.username) {
            return Err(AuthError::UsernameNotAllowed(cmd.username.clone()));
        }
        if self.users.contains_key(&cmd.username) {
            return Err(AuthError::UserExists(cmd.username.clone()));
        }

        self.users
            .insert(cmd.username.clone(), User::new(&cmd.username, &cmd.password_hash));
        Ok(())
    }

    fn log_in(&mut self, cmd: &LogInUser) -> Result<()> {
        let user = self.users.get(&cmd.username).ok_or(AuthError::InvalidCredentials)?;
        if user.password_hash != cmd.password_hash {
            return Err(AuthError::InvalidCredentials);
        }

        self.open_session(&cmd.session_id, &cmd.username, cmd.attempted_at);
        Ok(())
    }

    fn open_session(&mut self, id: &str, username: &str, at: chrono::DateTime<chrono::Utc>) {
        self.sessions
            .insert(id.to_string(), Session::open(id, username, at));
    }

    fn user_mut(&mut self, username: &str) -> Result<&mut User> {
        self.users.get_mut(username).ok_or(AuthError::UserNotFound)
    }

    fn user_by_email(&self, email: &str) -> Option<&User> {
        self.users
            .values()
            .find(|user| user.verified_email.as_deref() == Some(email))
    }

    fn request_magic_link(&mut self, cmd: &RequestMagicLinkLogin) -> Result<()> {
        let existing = self.user_by_email(&cmd.email).map(|user| user.username.clone());
        if let Some(username) = existing {
            self.user_mut(&username)?.magic = Some(cmd.magic.clone());
            return Ok(());
        }

        let magic_domain = cmd
            .domain()
            .map_or(false, |domain| self.magic_domains.contains(domain));
        if !magic_domain {
            return Err(AuthError::UserNotFound);
        }

        let username = cmd.username_from_email();
        if self.users.contains_key(username) {
            return Err(AuthError::UserExists(username.to_string()));
        }
        info!(username, "provisioning user from magic domain");
        self.users.insert(
            username.to_string(),
            User {
                verified_email: Some(cmd.email.clone()),
                magic: Some(cmd.magic.clone()),
                ..User::new(username, "")
            },
        );
        Ok(())
    }

    fn log_in_with_magic(&mut self, cmd: &LogInWithMagic) -> Result<()> {
        let user = self
            .users
            .values_mut()
            .find(|user| !cmd.magic.is_empty() && user.magic.as_deref() == Some(cmd.magic.as_str()))
            .ok_or(AuthError::UserNotFound)?;
        // Single use
        user.magic = None;
        let username = user.username.clone();

        self.open_session(&cmd.session_id, &username, cmd.attempted_at);
        Ok(())
    }

    fn request_password_reset(&mut self, cmd: &RequestPasswordReset) -> Result<()> {
        let user = self.user_mut(&cmd.username)?;
        if user.verified_email.as_deref() != Some(cmd.email.as_str()) {
            return Err(AuthError::UserNotFound);
        }

        user.password_reset_token = Some(cmd.token.clone());
        user.password_reset_requested_at = Some(cmd.requested_at);
        Ok(())
    }

    fn reset_password(&mut self, cmd: &ResetPassword) -> Result<()> {
        let user = self
            .users
            .values_mut()
            .find(|user| !cmd.token.is_empty() && user.password_reset_token.as_deref() == Some(cmd.token.as_str()))
            .ok_or(AuthError::UserNotFound)?;

        let requested_at = user.password_reset_requested_at.unwrap_or(cmd.attempted_at);
        if cmd.attempted_at - requested_at >= Duration::minutes(PASSWORD_RESET_MINUTES) {
            return Err(AuthError::PasswordResetExpired);
        }

        user.password_hash = cmd.new_password_hash.clone();
        user.password_reset_token = None;
        user.password_reset_requested_at = None;
        Ok(())
    }

    fn password_hash(&self, username: &str, password: &str) -> std::result::Result<String, HandlerError> {
        let user = self.users.get(username).ok_or(AuthError::InvalidCredentials)?;
        let matches = self
            .password_hasher
            .verify(password, &user.password_hash)
            .map_err(|e| HandlerError::Rejected(e.context(format!("checking password for {}", username))))?;

        if matches {
            Ok(user.password_hash.clone())
        } else {
            Err(AuthError::InvalidCredentials.into())
        }
    }

    fn roles(&self, username: &str) -> Result<Vec<UserRole>> {
        if !self.users.contains_key(username) {
            return Err(AuthError::UserNotFound);
        }

        let mut roles = Vec::with_capacity(2);
        if self.admins.contains(username) {
            roles.push(UserRole::Admin);
        }
        roles.push(UserRole::Visitor);
        Ok(roles)
    }
}

impl Module<Command, Query, QueryResult> for Auth {
    fn name(&self) -> &'static str {
        "auth"
    }

    fn handle_command(&mut self, command: &Command) -> std::result::Result<Accepted<Command>, HandlerError> {
        match command {
            Command::SignUpUser(cmd) => self.sign_up(cmd)?,
            Command::LogInUser(cmd) => self.log_in(cmd)?,
            Command::ChangeUsernamePolicy(cmd) => {
                self.policy = UsernamePolicy {
                    min_length: cmd.min_length,
                    max_length: cmd.max_length,
                    blacklist: cmd.blacklist.clone(),
                };
            }
            Command::LinkVerifiedEmailToUser(cmd) => {
                self.user_mut(&cmd.username)?.verified_email = Some(cmd.email.clone());
            }
            Command::SetAdminUsers(cmd) => self.admins = cmd.usernames.iter().cloned().collect(),
            Command::SetMagicDomains(cmd) => self.magic_domains = cmd.domains.iter().cloned().collect(),
            Command::RequestMagicLinkLogin(cmd) => self.request_magic_link(cmd)?,
            Command::LogInWithMagic(cmd) => self.log_in_with_magic(cmd)?,
            Command::RequestPasswordReset(cmd) => self.request_password_reset(cmd)?,
            Command::ResetPassword(cmd) => self.reset_password(cmd)?,
            _ => return Err(HandlerError::NotAccepted),
        }
        Ok(Accepted::AsIs)
    }

    fn handle_query(&self, query: &Query) -> std::result::Result<QueryResult, HandlerError> {
        let result = match query {
            Query::FindSession(find) => QueryResult::Session(self.sessions.get(&find.id).cloned()),
            Query::FindUserBySessionId(find) => QueryResult::User(
                self.sessions
                    .get(&find.session_id)
                    .and_then(|session| self.users.get(&session.username))
                    .cloned(),
            ),
            Query::FindUserPasswordHash(find) => {
                QueryResult::PasswordHash(self.password_hash(&find.username, &find.password)?)
            }
            Query::FindUserByEmail(find) => QueryResult::User(self.user_by_email(&find.email).cloned()),
            Query::FindUserByName(find) => QueryResult::User(self.users.get(&find.username).cloned()),
            Query::GetUserRoles(get) => QueryResult::Roles(self.roles(&get.username)?),
            _ => return Err(HandlerError::NotAccepted),
        };
        Ok(result)
    }
}
