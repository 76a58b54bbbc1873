//! The query set and its answers.
//!
//! Each query struct is bound to the [`QueryResult`] variant it is answered
//! with, so `app.ask(FindSession { .. })` returns `Option<Session>` directly.

use ledger::TypedQuery;
use serde::Serialize;

use crate::domains::auth::models::{Session, User, UserRole};
use crate::domains::auth::queries::{
    FindSession, FindUserByEmail, FindUserByName, FindUserBySessionId, FindUserPasswordHash,
    GetUserRoles,
};
use crate::domains::content::models::{Comment, Submission, SubscriptionSettings};
use crate::domains::content::queries::{
    FindComment, FindSubmission, FindSubscribersForNewComment, FindSubscribersForNewSubmission,
    GetFrontpage, MySubscriptionSettings,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "result")]
pub enum QueryResult {
    Session(Option<Session>),
    User(Option<User>),
    PasswordHash(String),
    Roles(Vec<UserRole>),
    Submission(Submission),
    Submissions(Vec<Submission>),
    Comment(Comment),
    Subscribers(Vec<String>),
    SubscriptionSettings(SubscriptionSettings),
}

macro_rules! queries {
    ($($kind:ident => $variant:ident($output:ty)),* $(,)?) => {
        #[derive(Debug, Clone, PartialEq)]
        pub enum Query {
            $($kind($kind),)*
        }

        impl ledger::Query for Query {
            fn kind(&self) -> &'static str {
                match self {
                    $(Query::$kind(_) => stringify!($kind),)*
                }
            }
        }

        $(
            impl From<$kind> for Query {
                fn from(query: $kind) -> Self {
                    Query::$kind(query)
                }
            }

            impl TypedQuery<Query, QueryResult> for $kind {
                type Output = $output;

                fn into_query(self) -> Query {
                    Query::$kind(self)
                }

                fn from_result(result: QueryResult) -> Option<$output> {
                    match result {
                        QueryResult::$variant(answer) => Some(answer),
                        _ => None,
                    }
                }
            }
        )*
    };
}

queries! {
    // auth
    FindSession => Session(Option<Session>),
    FindUserBySessionId => User(Option<User>),
    FindUserPasswordHash => PasswordHash(String),
    FindUserByEmail => User(Option<User>),
    FindUserByName => User(Option<User>),
    GetUserRoles => Roles(Vec<UserRole>),
    // content
    FindSubmission => Submission(Submission),
    GetFrontpage => Submissions(Vec<Submission>),
    FindComment => Comment(Comment),
    FindSubscribersForNewComment => Subscribers(Vec<String>),
    FindSubscribersForNewSubmission => Subscribers(Vec<String>),
    MySubscriptionSettings => SubscriptionSettings(SubscriptionSettings),
}
