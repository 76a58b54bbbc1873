//! The dispatcher.
//!
//! # Overview
//!
//! An [`App`] owns the command log, an ordered list of mounted [`Module`]s
//! and a version cursor: the highest log id every mounted module has seen.
//!
//! - **Writers** (`handle_command`, `replay`) take the exclusive lock. At most
//!   one logical write is in flight.
//! - **Readers** (`handle_query`) take the shared lock and run concurrently,
//!   blocked only by an in-flight writer.
//!
//! # Acceptance Protocol
//!
//! Modules are tried in mount order, so mount order fixes priority for
//! overlapping command kinds. A module answers with one of:
//!
//! - `Ok(Accepted::AsIs)` - handled; the caller's command is appended.
//! - `Ok(Accepted::Canonical(c))` - handled; `c` is appended instead. Used
//!   when a module normalises its input (deduplicated, sorted scopes).
//! - `Err(HandlerError::NotAccepted)` - not my kind; try the next module.
//! - `Err(HandlerError::Rejected(e))` - my kind, refused. Nothing is appended.
//!
//! # Replay
//!
//! `replay` feeds every entry newer than the version to every module, in
//! order, and advances the version to each entry's id whether or not anyone
//! accepted it. Replaying an up-to-date log is a no-op. With `skip_errors`,
//! rejections during replay are logged and skipped; without it they abort
//! the replay and the version stays at the last good entry.

use std::sync::Arc;

use anyhow::{Context, Result};
use futures::StreamExt;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::command::{Command, PersistedCommand, Query, TypedQuery};
use crate::error::{DispatchError, HandlerError};
use crate::log::CommandLog;

/// What a module did with a command it handles.
#[derive(Debug, Clone, PartialEq)]
pub enum Accepted<C> {
    /// Append the command as submitted.
    AsIs,
    /// Append this normalised form instead of the submitted one.
    Canonical(C),
}

/// A domain handler mounted on an [`App`].
///
/// Both methods default to declining, so a module only implements the side
/// it participates in.
pub trait Module<C, Q, R>: Send + Sync {
    /// Used in logs and error context.
    fn name(&self) -> &'static str;

    fn handle_command(&mut self, command: &C) -> Result<Accepted<C>, HandlerError> {
        let _ = command;
        Err(HandlerError::NotAccepted)
    }

    fn handle_query(&self, query: &Q) -> Result<R, HandlerError> {
        let _ = query;
        Err(HandlerError::NotAccepted)
    }
}

struct AppState<C, Q, R> {
    version: u64,
    modules: Vec<Box<dyn Module<C, Q, R>>>,
}

impl<C: Command, Q: Query, R> AppState<C, Q, R> {
    /// Offer a logged command to every module.
    fn feed(&mut self, entry: &PersistedCommand<C>, skip_errors: bool) -> Result<()> {
        if entry.message.is_noop() {
            return Ok(());
        }

        let kind = entry.message.kind();
        for module in self.modules.iter_mut() {
            match module.handle_command(&entry.message) {
                Ok(_) | Err(HandlerError::NotAccepted) => {}
                Err(HandlerError::Rejected(err)) if skip_errors => {
                    warn!(
                        id = entry.id,
                        kind,
                        module = module.name(),
                        error = %err,
                        "skipping command that failed during replay"
                    );
                }
                Err(HandlerError::Rejected(err)) => {
                    return Err(err.context(format!(
                        "replaying command {} ({}) in {}",
                        entry.id,
                        kind,
                        module.name()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Find the first module that takes `command`, and what to append.
    fn accept(&mut self, command: C) -> Result<C> {
        for module in self.modules.iter_mut() {
            match module.handle_command(&command) {
                Ok(Accepted::AsIs) => return Ok(command),
                Ok(Accepted::Canonical(canonical)) => return Ok(canonical),
                Err(HandlerError::NotAccepted) => continue,
                Err(HandlerError::Rejected(err)) => {
                    return Err(err.context(format!("{} rejected {}", module.name(), command.kind())));
                }
            }
        }

        Err(DispatchError::CommandNotAccepted {
            kind: command.kind().to_string(),
        }
        .into())
    }
}

/// Single-writer, multi-reader dispatcher over a command log.
pub struct App<C: Command, Q, R> {
    log: Arc<dyn CommandLog<C>>,
    state: RwLock<AppState<C, Q, R>>,
    skip_errors: bool,
}

impl<C, Q, R> App<C, Q, R>
where
    C: Command,
    Q: Query,
    R: Send + Sync + 'static,
{
    /// Bring every mounted module up to the end of the log.
    ///
    /// Returns how many entries were fed.
    pub async fn replay(&self) -> Result<usize> {
        let mut state = self.state.write().await;
        let mut entries = self.log.after(state.version);
        let mut replayed = 0;

        while let Some(entry) = entries.next().await {
            let entry = entry.with_context(|| format!("replay stopped after version {}", state.version))?;
            state.feed(&entry, self.skip_errors)?;
            state.version = entry.id;
            replayed += 1;
        }

        if replayed > 0 {
            info!(version = state.version, replayed, "replay complete");
        }
        Ok(replayed)
    }

    /// Route `command` to the first accepting module and append it.
    ///
    /// Returns the id it was stored under. Nothing is appended when the
    /// command is rejected or when no module accepts it.
    pub async fn handle_command(&self, command: C) -> Result<u64> {
        let kind = command.kind();
        let mut state = self.state.write().await;

        let accepted = if command.is_noop() {
            command
        } else {
            state.accept(command)?
        };

        let id = self
            .log
            .append(&accepted)
            .await
            .with_context(|| format!("appending {}", kind))?;
        state.version = id;

        debug!(id, kind, "command appended");
        Ok(id)
    }

    /// Answer `query` from the first accepting module.
    pub async fn handle_query(&self, query: Q) -> Result<R> {
        let state = self.state.read().await;

        for module in state.modules.iter() {
            match module.handle_query(&query) {
                Ok(result) => return Ok(result),
                Err(HandlerError::NotAccepted) => continue,
                Err(HandlerError::Rejected(err)) => {
                    return Err(err.context(format!("{} failed to answer {}", module.name(), query.kind())));
                }
            }
        }

        Err(DispatchError::QueryNotAccepted {
            kind: query.kind().to_string(),
        }
        .into())
    }

    /// [`handle_query`](Self::handle_query) with a typed answer.
    pub async fn ask<T>(&self, query: T) -> Result<T::Output>
    where
        T: TypedQuery<Q, R>,
    {
        let query = query.into_query();
        let kind = query.kind();
        let result = self.handle_query(query).await?;

        T::from_result(result).ok_or_else(|| {
            DispatchError::UnexpectedResult {
                kind: kind.to_string(),
            }
            .into()
        })
    }

    /// Highest log id fed to every mounted module.
    pub async fn version(&self) -> u64 {
        self.state.read().await.version
    }

    pub fn log(&self) -> Arc<dyn CommandLog<C>> {
        Arc::clone(&self.log)
    }

    /// Mounted module names, in priority order.
    pub async fn module_names(&self) -> Vec<&'static str> {
        self.state
            .read()
            .await
            .modules
            .iter()
            .map(|module| module.name())
            .collect()
    }
}

/// Builder for an [`App`].
pub struct AppBuilder<C: Command, Q, R> {
    log: Arc<dyn CommandLog<C>>,
    modules: Vec<Box<dyn Module<C, Q, R>>>,
    skip_errors: bool,
}

impl<C, Q, R> AppBuilder<C, Q, R>
where
    C: Command,
    Q: Query,
    R: Send + Sync + 'static,
{
    pub fn new(log: Arc<dyn CommandLog<C>>) -> Self {
        Self {
            log,
            modules: Vec::new(),
            skip_errors: false,
        }
    }

    /// Mount a module after the ones already mounted.
    pub fn mount<M>(mut self, module: M) -> Self
    where
        M: Module<C, Q, R> + 'static,
    {
        self.modules.push(Box::new(module));
        self
    }

    /// Log and skip rejected commands during replay instead of aborting.
    pub fn skip_errors(mut self, skip: bool) -> Self {
        self.skip_errors = skip;
        self
    }

    pub fn build(self) -> App<C, Q, R> {
        App {
            log: self.log,
            state: RwLock::new(AppState {
                version: 0,
                modules: self.modules,
            }),
            skip_errors: self.skip_errors,
        }
    }
}
