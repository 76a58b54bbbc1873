//! Opening the command log named by configuration.
//!
//! - `memory://` - process-local, lost on exit
//! - `sqlite://<path>` - SQLite file, created if missing
//! - `file://<path>` - same as `sqlite://<path>`

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use ledger::{CommandLog, MemoryCommandLog, SqliteCommandLog};
use tracing::info;

use crate::common::{command_codec, Command};

/// Where the log lives, parsed from a `COMMONS_COMMAND_LOG` url.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogLocation {
    Memory,
    Sqlite(String),
}

impl LogLocation {
    pub fn parse(url: &str) -> Result<Self> {
        if url == "memory://" || url == "memory" {
            return Ok(LogLocation::Memory);
        }
        if let Some(path) = url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("file://")) {
            if path.is_empty() {
                bail!("command log url {:?} names no file", url);
            }
            return Ok(LogLocation::Sqlite(path.to_string()));
        }
        bail!("unsupported command log url {:?}; expected memory://, sqlite://<path> or file://<path>", url)
    }
}

pub async fn open_command_log(url: &str) -> Result<Arc<dyn CommandLog<Command>>> {
    match LogLocation::parse(url)? {
        LogLocation::Memory => {
            info!("using in-memory command log");
            Ok(Arc::new(MemoryCommandLog::new(command_codec())))
        }
        LogLocation::Sqlite(path) => {
            info!(path = %path, "opening sqlite command log");
            let log = SqliteCommandLog::connect(&format!("sqlite://{}", path), command_codec())
                .await
                .with_context(|| format!("failed to open command log at {}", path))?;
            Ok(Arc::new(log))
        }
    }
}
