//! # Ledger
//!
//! An event-sourcing kernel: every piece of application state is derived by
//! replaying an append-only log of commands through pluggable modules.
//!
//! ## Core Concepts
//!
//! - [`CommandLog`] = the durable, ordered record of accepted commands
//! - [`Module`] = a domain handler that accepts or declines commands and queries
//! - [`App`] = the dispatcher that routes to modules and appends on acceptance
//! - [`Consumer`] = a background reader with its own [`Cursor`] into the log
//!
//! ## Architecture
//!
//! ```text
//! Request Shell
//!     │
//!     ▼ handle_command()                 handle_query()
//! App (exclusive lock) ──────────────    App (shared lock)
//!     │                                      │
//!     ├─► Module A.handle_command() ─► NotAccepted
//!     ├─► Module B.handle_command() ─► Accepted ──┐
//!     │                                           │
//!     │                                           ▼
//!     │                                   CommandLog.append()
//!     │                                           │
//!     ▼                                           │
//! ConsumerRunner (own cursor) ◄── after(cursor) ──┘
//!     │
//!     ├─► Consumer.observe(entry)
//!     └─► Consumer.tick() ─► App.handle_command(follow-up)
//! ```
//!
//! ## Key Invariants
//!
//! 1. **Only accepted commands are logged** - a rejected command never reaches the log
//! 2. **Ids are gap-free** - `after(k)` yields strictly ascending ids with no holes
//! 3. **Revisions mask, never erase** - the original payload stays retrievable
//! 4. **Corruption halts replay** - an undecodable row ends the stream with an error
//! 5. **Consumers rebuild from zero** - their cursors are private and start at 0
//!
//! ## Example
//!
//! ```ignore
//! use ledger::{AppBuilder, CommandRegistry, JsonCodec, MemoryCommandLog};
//!
//! let mut registry = CommandRegistry::new();
//! registry.register::<PostLink>("PostLink", Command::PostLink);
//! let codec = JsonCodec::new(Arc::new(registry));
//! let log = Arc::new(MemoryCommandLog::new(codec));
//!
//! let app = AppBuilder::new(log)
//!     .mount(Content::default())
//!     .mount(Auth::default())
//!     .skip_errors(false)
//!     .build();
//!
//! app.replay().await?;
//! app.handle_command(Command::PostLink(post)).await?;
//! ```

pub mod app;
pub mod command;
pub mod consumer;
pub mod error;
pub mod log;
pub mod registry;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(test)]
mod testing;

pub use app::{Accepted, App, AppBuilder, Module};
pub use command::{Command, PersistedCommand, Query, TypedQuery};
pub use consumer::{Consumer, ConsumerConfig, ConsumerRunner, Cursor};
pub use error::{DispatchError, HandlerError, LedgerError};
pub use log::{CommandLog, CommandStream, LogConfig, MemoryCommandLog};
pub use registry::{CommandRegistry, JsonCodec};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteCommandLog;
