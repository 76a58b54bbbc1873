//! Background readers of the command log.
//!
//! A consumer follows the log on its own [`Cursor`], independent of the
//! dispatcher's version. It builds private state from what it observes and
//! on every tick may act on the outside world, usually by submitting
//! follow-up commands back through the [`App`](crate::App).
//!
//! # Lifecycle
//!
//! ```text
//! ConsumerRunner::run
//!     │
//!     ├─► catch_up()  after(cursor) ─► observe(entry) ─► cursor = entry.id
//!     │
//!     └─► every tick_interval
//!             ├─► catch_up()
//!             └─► tick()
//! ```
//!
//! Cursors are never persisted. A restarted consumer starts at 0 and
//! rebuilds its state from the log, so whatever it derived must be a pure
//! function of the log contents.
//!
//! Failures in `observe` or `tick` are logged and do not stop the runner.
//! A stream error (an undecodable row) ends the current pass; the next pass
//! retries from the same cursor.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::command::{Command, PersistedCommand};
use crate::log::CommandLog;

/// How far a named consumer has read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub consumer: &'static str,
    /// Id of the last entry handed to `observe`, 0 before the first.
    pub position: u64,
}

/// A background reader with private state.
#[async_trait]
pub trait Consumer<C: Command>: Send + 'static {
    fn name(&self) -> &'static str;

    /// Fold one log entry into local state. Never called with the no-op.
    async fn observe(&mut self, entry: &PersistedCommand<C>) -> Result<()>;

    /// Periodic work against the outside world.
    async fn tick(&mut self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    pub tick_interval: Duration,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
        }
    }
}

/// Drives a [`Consumer`] over a log.
pub struct ConsumerRunner<C: Command, T> {
    log: Arc<dyn CommandLog<C>>,
    consumer: T,
    cursor: Cursor,
    config: ConsumerConfig,
}

impl<C, T> ConsumerRunner<C, T>
where
    C: Command,
    T: Consumer<C>,
{
    pub fn new(log: Arc<dyn CommandLog<C>>, consumer: T) -> Self {
        let cursor = Cursor {
            consumer: consumer.name(),
            position: 0,
        };
        Self {
            log,
            consumer,
            cursor,
            config: ConsumerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ConsumerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn consumer(&self) -> &T {
        &self.consumer
    }

    pub fn consumer_mut(&mut self) -> &mut T {
        &mut self.consumer
    }

    /// Observe every entry past the cursor. Returns how many were read.
    pub async fn catch_up(&mut self) -> usize {
        let name = self.cursor.consumer;
        let mut entries = self.log.after(self.cursor.position);
        let mut read = 0;

        while let Some(entry) = entries.next().await {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(consumer = name, position = self.cursor.position, error = %e, "log stream failed");
                    break;
                }
            };

            if !entry.message.is_noop() {
                if let Err(e) = self.consumer.observe(&entry).await {
                    error!(consumer = name, id = entry.id, error = %e, "observe failed");
                }
            }
            self.cursor.position = entry.id;
            read += 1;
        }

        if read > 0 {
            debug!(consumer = name, position = self.cursor.position, read, "consumer caught up");
        }
        read
    }

    /// Run the consumer's periodic work once.
    pub async fn tick(&mut self) {
        if let Err(e) = self.consumer.tick().await {
            error!(consumer = self.cursor.consumer, error = %e, "tick failed");
        }
    }

    /// Catch up, then catch up and tick on every interval until cancelled.
    pub async fn run(mut self, shutdown: CancellationToken) -> Self {
        info!(
            consumer = self.cursor.consumer,
            interval_ms = self.config.tick_interval.as_millis() as u64,
            "consumer starting"
        );
        self.catch_up().await;

        let mut interval = tokio::time::interval(self.config.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {
                    self.catch_up().await;
                    self.tick().await;
                }
            }
        }

        info!(consumer = self.cursor.consumer, position = self.cursor.position, "consumer stopped");
        self
    }

    /// [`run`](Self::run) on a new task.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<Self> {
        tokio::spawn(self.run(shutdown))
    }
}

#[cfg(test)]
mod tests {
    use anyhow::bail;

    use super::*;
    use crate::testing::{memory_log, note, TestCommand};

    /// Collects note texts; fails on the word "boom". Counts ticks.
    #[derive(Default)]
    struct Recorder {
        seen: Vec<String>,
        ticks: usize,
    }

    #[async_trait]
    impl Consumer<TestCommand> for Recorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        async fn observe(&mut self, entry: &PersistedCommand<TestCommand>) -> Result<()> {
            match &entry.message {
                TestCommand::Note(note) if note.text == "boom" => bail!("cannot observe boom"),
                TestCommand::Note(note) => self.seen.push(note.text.clone()),
                other => self.seen.push(format!("{:?}", other)),
            }
            Ok(())
        }

        async fn tick(&mut self) -> Result<()> {
            self.ticks += 1;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_catch_up_advances_cursor() {
        let log = memory_log();
        log.append(&note("a")).await.unwrap();
        log.append(&note("b")).await.unwrap();

        let mut runner = ConsumerRunner::new(log.clone(), Recorder::default());
        assert_eq!(runner.cursor(), Cursor { consumer: "recorder", position: 0 });

        assert_eq!(runner.catch_up().await, 2);
        assert_eq!(runner.cursor().position, 2);
        assert_eq!(runner.consumer().seen, vec!["a", "b"]);

        log.append(&note("c")).await.unwrap();
        assert_eq!(runner.catch_up().await, 1);
        assert_eq!(runner.consumer().seen, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_noops_advance_cursor_without_observing() {
        let log = memory_log();
        log.append(&note("kept")).await.unwrap();
        log.append(&note("hidden")).await.unwrap();
        log.revise_commands(&[2], &|_| None).await.unwrap();

        let mut runner = ConsumerRunner::new(log, Recorder::default());
        runner.catch_up().await;

        assert_eq!(runner.cursor().position, 2);
        assert_eq!(runner.consumer().seen, vec!["kept"]);
    }

    #[tokio::test]
    async fn test_observe_failure_does_not_stall() {
        let log = memory_log();
        log.append(&note("boom")).await.unwrap();
        log.append(&note("after")).await.unwrap();

        let mut runner = ConsumerRunner::new(log, Recorder::default());
        runner.catch_up().await;

        assert_eq!(runner.cursor().position, 2);
        assert_eq!(runner.consumer().seen, vec!["after"]);
    }

    #[tokio::test]
    async fn test_tick_reaches_consumer() {
        let mut runner = ConsumerRunner::new(memory_log(), Recorder::default());
        runner.tick().await;
        runner.tick().await;
        assert_eq!(runner.consumer().ticks, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_until_cancelled() {
        let log = memory_log();
        log.append(&note("early")).await.unwrap();

        let shutdown = CancellationToken::new();
        let runner = ConsumerRunner::new(log.clone(), Recorder::default()).with_config(ConsumerConfig {
            tick_interval: Duration::from_millis(50),
        });
        let handle = runner.spawn(shutdown.clone());

        tokio::time::sleep(Duration::from_millis(20)).await;
        log.append(&note("late")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        shutdown.cancel();
        let runner = handle.await.unwrap();

        assert_eq!(runner.cursor().position, 2);
        assert_eq!(runner.consumer().seen, vec!["early", "late"]);
        assert!(runner.consumer().ticks >= 1);
    }
}
