/// Answers with the session whether or not it is still active.
///
/// An unknown id answers `None` rather than failing; callers that need a
/// session turn that into [`AuthError::SessionNotFound`](super::AuthError::SessionNotFound).
#[derive(Debug, Clone, PartialEq)]
pub struct FindSession {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FindUserBySessionId {
    pub session_id: String,
}

/// Checks `password` against the stored hash and answers with that hash.
#[derive(Clone, PartialEq)]
pub struct FindUserPasswordHash {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for FindUserPasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FindUserPasswordHash")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FindUserByEmail {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FindUserByName {
    pub username: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetUserRoles {
    pub username: String,
}
