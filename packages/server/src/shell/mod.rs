//! Request shell - turns generic string requests into typed commands and queries
//!
//! A transport hands the shell a [`Request`] of string headers and
//! parameters. The shell enriches it with a [`RequestContext`] (current
//! time, current session), looks up the builder named by the `name` header
//! and dispatches whatever the builder produces.
//!
//! ```text
//! Request { kind: command, name: PostLink, item_id=.., title=.. }
//!     │
//!     ├─► context builders ─► RequestContext { now, session }
//!     ├─► command builder  ─► Command::PostLink(..)
//!     └─► App::handle_command ─► Outcome::Command { id }
//! ```

pub mod admin;
pub mod builders;
pub mod context;
pub mod errors;
pub mod handler;
pub mod request;

pub use context::RequestContext;
pub use errors::ShellError;
pub use handler::{Outcome, Shell, ShellEnv};
pub use request::{Parameters, Request, RequestKind};
