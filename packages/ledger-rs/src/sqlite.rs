//! SQLite-backed command log.
//!
//! A file-based log for single-node deployments. Rows follow the shape
//! `(id INTEGER PRIMARY KEY, message TEXT, process_as TEXT NULL)`; decoding
//! prefers `process_as` when it is present and non-empty.
//!
//! # Example URLs
//! - `sqlite://commons.db` - File-based log, created if missing
//! - `sqlite::memory:` - Use [`SqliteCommandLog::in_memory`] instead, which
//!   pins the pool to one connection so the database outlives idle periods

use std::str::FromStr;

use async_stream::stream;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use tracing::debug;

use crate::command::{Command, PersistedCommand};
use crate::error::LedgerError;
use crate::log::{CommandLog, CommandStream, LogConfig};
use crate::registry::JsonCodec;

pub struct SqliteCommandLog<C> {
    pool: SqlitePool,
    codec: JsonCodec<C>,
    config: LogConfig,
}

#[derive(Debug, FromRow)]
struct CommandRow {
    id: i64,
    message: String,
    process_as: Option<String>,
}

impl CommandRow {
    fn effective(&self) -> &str {
        match self.process_as.as_deref() {
            Some(revised) if !revised.is_empty() => revised,
            _ => &self.message,
        }
    }
}

impl<C: Command> SqliteCommandLog<C> {
    /// Open (creating if needed) the log at `database_url`.
    pub async fn connect(database_url: &str, codec: JsonCodec<C>) -> Result<Self, LedgerError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Self::with_pool(pool, codec).await
    }

    /// An ephemeral log for tests.
    pub async fn in_memory(codec: JsonCodec<C>) -> Result<Self, LedgerError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::with_pool(pool, codec).await
    }

    async fn with_pool(pool: SqlitePool, codec: JsonCodec<C>) -> Result<Self, LedgerError> {
        let log = Self {
            pool,
            codec,
            config: LogConfig::default(),
        };
        log.run_migrations().await?;
        Ok(log)
    }

    pub fn with_config(mut self, config: LogConfig) -> Self {
        self.config = config;
        self
    }

    async fn run_migrations(&self) -> Result<(), LedgerError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS commands (
                id INTEGER PRIMARY KEY,
                message TEXT NOT NULL,
                process_as TEXT
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn ensure_ids(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        ids: &[u64],
    ) -> Result<(), LedgerError> {
        for id in ids {
            let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM commands WHERE id = ?")
                .bind(*id as i64)
                .fetch_one(&mut **tx)
                .await?;
            if exists == 0 {
                return Err(LedgerError::UnknownCommandId(*id));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<C: Command> CommandLog<C> for SqliteCommandLog<C> {
    async fn append(&self, command: &C) -> Result<u64, LedgerError> {
        let message = self.codec.encode(command)?;
        let result = sqlx::query("INSERT INTO commands (message) VALUES (?)")
            .bind(&message)
            .execute(&self.pool)
            .await?;

        let id = result.last_insert_rowid() as u64;
        debug!(id, kind = command.kind(), "command stored");
        Ok(id)
    }

    fn after(&self, since: u64) -> CommandStream<C> {
        let pool = self.pool.clone();
        let codec = self.codec.clone();
        let page_size = self.config.page_size.max(1) as i64;

        Box::pin(stream! {
            let mut cursor = since;
            loop {
                let page = sqlx::query_as::<_, CommandRow>(
                    "SELECT id, message, process_as FROM commands WHERE id > ? ORDER BY id ASC LIMIT ?",
                )
                .bind(cursor as i64)
                .bind(page_size)
                .fetch_all(&pool)
                .await;

                let rows = match page {
                    Ok(rows) => rows,
                    Err(err) => {
                        yield Err(LedgerError::from(err));
                        return;
                    }
                };
                if rows.is_empty() {
                    break;
                }

                for row in rows {
                    let id = row.id as u64;
                    match codec.decode(row.effective()) {
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
        let max = sqlx::query_scalar::<_, i64>("SELECT COALESCE(MAX(id), 0) FROM commands")
            .fetch_one(&self.pool)
            .await?;
        Ok(max as u64)
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

        let mut tx = self.pool.begin().await?;
        Self::ensure_ids(&mut tx, ids).await?;
        for (id, revised) in revisions {
            sqlx::query("UPDATE commands SET process_as = ? WHERE id = ?")
                .bind(revised)
                .bind(id as i64)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        Ok(())
    }

    async fn restore_commands(&self, ids: &[u64]) -> Result<(), LedgerError> {
        let mut tx = self.pool.begin().await?;
        Self::ensure_ids(&mut tx, ids).await?;
        for id in ids {
            sqlx::query("UPDATE commands SET process_as = NULL WHERE id = ?")
                .bind(*id as i64)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        Ok(())
    }

    async fn original(&self, id: u64) -> Result<Option<C>, LedgerError> {
        let message = sqlx::query_scalar::<_, String>("SELECT message FROM commands WHERE id = ?")
            .bind(id as i64)
            .fetch_optional(&self.pool)
            .await?;

        match message {
            Some(raw) => self
                .codec
                .decode(&raw)
                .map(Some)
                .map_err(|source| LedgerError::Decode {
                    id,
                    source: Box::new(source),
                }),
            None => Ok(None),
        }
    }
}
