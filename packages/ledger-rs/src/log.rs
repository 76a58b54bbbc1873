//! The append-only command log.
//!
//! # The Contract
//!
//! 1. **Append before acknowledge.** `append` assigns the next id and the row
//!    is stored before it returns.
//!
//! 2. **Ids are gap-free.** The first command gets id 1, every later one
//!    the previous id plus one. Nothing is ever deleted.
//!
//! 3. **Streams are snapshots.** `after(k)` yields every entry with id > k in
//!    ascending order. Appends that land while a stream is being consumed may
//!    or may not show up, but whatever is observed has no holes.
//!
//! 4. **Revisions mask.** `revise_commands` stores an alternate payload that
//!    later streams return instead of the original. `None` from the mapper
//!    stores the no-op. The original stays in storage and is returned by
//!    `original`. `restore_commands` drops the mask.
//!
//! 5. **Corruption is fatal.** A row that fails to decode ends the stream
//!    with [`LedgerError::Decode`]. Replay stops there.

use std::sync::Arc;

use async_stream::stream;
use async_trait::async_trait;
use futures::stream::BoxStream;
use tokio::sync::RwLock;

use crate::command::{Command, PersistedCommand};
use crate::error::LedgerError;
use crate::registry::JsonCodec;

/// A lazily paged, owned stream of log entries.
pub type CommandStream<C> = BoxStream<'static, Result<PersistedCommand<C>, LedgerError>>;

/// Tuning for log implementations.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Rows fetched per page while streaming. No lock or connection is held
    /// between pages.
    pub page_size: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { page_size: 256 }
    }
}

/// Durable, ordered, append-only storage of commands.
#[async_trait]
pub trait CommandLog<C: Command>: Send + Sync + 'static {
    /// Persist `command` and return its id.
    async fn append(&self, command: &C) -> Result<u64, LedgerError>;

    /// Entries with id greater than `since`, ascending.
    fn after(&self, since: u64) -> CommandStream<C>;

    /// The highest assigned id, 0 for an empty log.
    async fn length(&self) -> Result<u64, LedgerError>;

    /// Mask each of `ids` with `mapper(id)`, or with the no-op when it
    /// returns `None`. Fails without changes if any id is unknown.
    async fn revise_commands(
        &self,
        ids: &[u64],
        mapper: &(dyn Fn(u64) -> Option<C> + Send + Sync),
    ) -> Result<(), LedgerError>;

    /// Drop the masks on `ids`, so streams return the originals again.
    async fn restore_commands(&self, ids: &[u64]) -> Result<(), LedgerError>;

    /// The payload as first appended, ignoring any revision.
    async fn original(&self, id: u64) -> Result<Option<C>, LedgerError>;
}

#[derive(Debug, Clone)]
struct StoredCommand {
    message: String,
    process_as: Option<String>,
}

impl StoredCommand {
    fn effective(&self) -> &str {
        match self.process_as.as_deref() {
            Some(revised) if !revised.is_empty() => revised,
            _ => &self.message,
        }
    }
}

/// Process-local log. Rows are kept encoded so that decoding and revision
/// behave exactly as they do against SQLite.
pub struct MemoryCommandLog<C> {
    entries: Arc<RwLock<Vec<StoredCommand>>>,
    codec: JsonCodec<C>,
    config: LogConfig,
}

impl<C: Command> MemoryCommandLog<C> {
    pub fn new(codec: JsonCodec<C>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
            codec,
            config: LogConfig::default(),
        }
    }

    pub fn with_config(mut self, config: LogConfig) -> Self {
        self.config = config;
        self
    }

    fn check_ids(len: usize, ids: &[u64]) -> Result<(), LedgerError> {
        match ids.iter().find(|id| **id == 0 || **id > len as u64) {
            Some(id) => Err(LedgerError::UnknownCommandId(*id)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl<C: Command> CommandLog<C> for MemoryCommandLog<C> {
    async fn append(&self, command: &C) -> Result<u64, LedgerError> {
        let message = self.codec.encode(command)?;
        let mut entries = self.entries.write().await;
        entries.push(StoredCommand {
            message,
            process_as: None,
        });
        Ok(entries.len() as u64)
    }

    fn after(&self, since: u64) -> CommandStream<C> {
        let entries = Arc::clone(&self.entries);
        let codec = self.codec.clone();
        let page_size = self.config.page_size.max(1);

        Box::pin(stream! {
            let mut cursor = since;
            loop {
                let page: Vec<(u64, String)> = {
                    let entries = entries.read().await;
                    entries
                        .iter()
                        .enumerate()
                        .skip(cursor as usize)
                        .take(page_size)
                        .map(|(index, entry)| (index as u64 + 1, entry.effective().to_string()))
                        .collect()
                };
                if page.is_empty() {
                    break;
                }
                for (id, raw) in page {
                    match codec.decode(&raw) {
                        Ok(message) => {
                            cursor = id;
                            yield Ok(PersistedCommand::new(id, message));
                        }
                        Err(source) => {
                            yield Err(LedgerError::Decode { id, source: Box::new(source) });
                            return;
                        }
                    }
                }
            }
        })
    }

    async fn length(&self) -> Result<u64, LedgerError> {
        Ok(self.entries.read().await.len() as u64)
    }

    async fn revise_commands(
        &self,
        ids: &[u64],
        mapper: &(dyn Fn(u64) -> Option<C> + Send + Sync),
    ) -> Result<(), LedgerError> {
        let mut revisions = Vec::with_capacity(ids.len());
        for id in ids {
            let replacement = mapper(*id).unwrap_or_else(C::noop);
            revisions.push((*id, self.codec.encode(&replacement)?));
        }

        let mut entries = self.entries.write().await;
        Self::check_ids(entries.len(), ids)?;
        for (id, revised) in revisions {
            entries[(id - 1) as usize].process_as = Some(revised);
        }
        Ok(())
    }

    async fn restore_commands(&self, ids: &[u64]) -> Result<(), LedgerError> {
        let mut entries = self.entries.write().await;
        Self::check_ids(entries.len(), ids)?;
        for id in ids {
            entries[(*id - 1) as usize].process_as = None;
        }
        Ok(())
    }

    async fn original(&self, id: u64) -> Result<Option<C>, LedgerError> {
        let raw = {
            let entries = self.entries.read().await;
            match id.checked_sub(1).and_then(|index| entries.get(index as usize)) {
                Some(entry) => entry.message.clone(),
                None => return Ok(None),
            }
        };
        self.codec
            .decode(&raw)
            .map(Some)
            .map_err(|source| LedgerError::Decode {
                id,
                source: Box::new(source),
            })
    }
}
