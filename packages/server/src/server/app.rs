//! Application setup: module mounting and background consumers.

use std::sync::Arc;

use ledger::{CommandLog, Consumer, ConsumerConfig, ConsumerRunner};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::common::{Command, CommonsApp, CommonsAppBuilder};
use crate::config::Config;
use crate::domains::auth::{Auth, MagicLoginMailer, PasswordResetMailer};
use crate::domains::content::{Content, PreviewGenerator};
use crate::domains::email::{EmailCommands, Mailer};
use crate::domains::notifier::Notifier;
use crate::kernel::ServerDeps;

/// Mount every module, in dispatch order.
///
/// Auth goes first so session and user lookups never fall through to the
/// content module.
pub fn build_app(log: Arc<dyn CommandLog<Command>>, deps: &ServerDeps, skip_errors: bool) -> CommonsApp {
    CommonsAppBuilder::new(log)
        .mount(Auth::new(deps.password_hasher.clone()))
        .mount(Content::new(deps.markdown.clone()))
        .mount(EmailCommands)
        .skip_errors(skip_errors)
        .build()
}

/// Background consumers sharing one shutdown token.
pub struct Consumers {
    shutdown: CancellationToken,
    handles: Vec<(&'static str, JoinHandle<()>)>,
}

impl Consumers {
    /// Start every consumer the configuration asks for.
    pub fn start(app: Arc<CommonsApp>, deps: &ServerDeps, config: &Config, shutdown: CancellationToken) -> Self {
        let mut consumers = Self {
            shutdown,
            handles: Vec::new(),
        };
        let consumer_config = ConsumerConfig {
            tick_interval: config.tick_interval,
        };

        consumers.spawn(&app, consumer_config.clone(), Mailer::new(app.clone(), deps.email_sender.clone()));
        consumers.spawn(&app, consumer_config.clone(), Notifier::new(app.clone(), deps.clone()));
        consumers.spawn(
            &app,
            consumer_config.clone(),
            PasswordResetMailer::new(app.clone(), deps.clone()),
        );
        consumers.spawn(&app, consumer_config.clone(), MagicLoginMailer::new(app.clone(), deps.clone()));
        if config.fetch_previews {
            consumers.spawn(&app, consumer_config, PreviewGenerator::new(app.clone(), deps.clone()));
        }

        info!(count = consumers.handles.len(), "consumers started");
        consumers
    }

    fn spawn<T>(&mut self, app: &CommonsApp, config: ConsumerConfig, consumer: T)
    where
        T: Consumer<Command>,
    {
        let name = consumer.name();
        let runner = ConsumerRunner::new(app.log(), consumer).with_config(config);
        let shutdown = self.shutdown.clone();
        let handle = tokio::spawn(async move {
            runner.run(shutdown).await;
        });
        self.handles.push((name, handle));
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.handles.iter().map(|(name, _)| *name).collect()
    }

    /// Cancel every consumer and wait for it to stop.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        for (name, handle) in self.handles {
            if let Err(e) = handle.await {
                warn!(consumer = name, error = %e, "consumer task panicked");
            }
        }
        info!("consumers stopped");
    }
}
