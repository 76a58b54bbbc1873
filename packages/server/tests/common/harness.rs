//! Test harness for integration testing.
//!
//! Every harness owns a fresh in-memory command log, an app with every module
//! mounted, a shell with the stock builders and mock dependencies. Consumers
//! are not spawned; tests drive them by hand through [`ConsumerRunner`] so
//! catch-up and tick happen exactly when the test says.

use std::sync::Arc;

use anyhow::Result;
use commons_core::common::{command_codec, Command, CommonsApp};
use commons_core::domains::auth::{MagicLoginMailer, PasswordResetMailer};
use commons_core::domains::content::PreviewGenerator;
use commons_core::domains::email::Mailer;
use commons_core::domains::notifier::Notifier;
use commons_core::kernel::{ServerDeps, TestDependencies};
use commons_core::server::build_app;
use commons_core::shell::{Outcome, Request, Shell};
use ledger::{CommandLog, Consumer, ConsumerRunner, MemoryCommandLog};
use test_context::AsyncTestContext;

/// Test harness that manages test infrastructure.
///
/// # Example using test-context
///
/// ```ignore
/// use test_context::test_context;
///
/// #[test_context(TestHarness)]
/// #[tokio::test]
/// async fn my_test(ctx: &TestHarness) {
///     let outcome = ctx.request(Request::query("GetFrontpage")).await.unwrap();
///     // ... test code
/// }
/// ```
pub struct TestHarness {
    /// Mocks, kept so tests can move the clock or inspect sent mail.
    pub mocks: TestDependencies,
    pub deps: ServerDeps,
    pub log: Arc<dyn CommandLog<Command>>,
    pub app: Arc<CommonsApp>,
    pub shell: Shell,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::new()
    }

    async fn teardown(self) {
        // The log is in memory and dropped with the harness
    }
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_mocks(TestDependencies::new())
    }

    /// A harness over custom mocks, e.g. a failing email sender.
    pub fn with_mocks(mocks: TestDependencies) -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let deps = mocks.clone().into_deps();
        let log: Arc<dyn CommandLog<Command>> = Arc::new(MemoryCommandLog::new(command_codec()));
        let app = Arc::new(build_app(log.clone(), &deps, false));
        let shell = Shell::with_defaults(app.clone(), deps.clone());

        Self {
            mocks,
            deps,
            log,
            app,
            shell,
        }
    }

    pub async fn request(&self, request: Request) -> Result<Outcome> {
        self.shell.do_request(request).await
    }

    /// A fresh app over the same log, replayed from the start.
    pub async fn restart(&self) -> Result<Arc<CommonsApp>> {
        let app = Arc::new(build_app(self.log.clone(), &self.deps, false));
        app.replay().await?;
        Ok(app)
    }

    pub fn runner<T: Consumer<Command>>(&self, consumer: T) -> ConsumerRunner<Command, T> {
        ConsumerRunner::new(self.log.clone(), consumer)
    }

    pub fn mailer(&self) -> ConsumerRunner<Command, Mailer> {
        self.runner(Mailer::new(self.app.clone(), self.deps.email_sender.clone()))
    }

    pub fn notifier(&self) -> ConsumerRunner<Command, Notifier> {
        self.runner(Notifier::new(self.app.clone(), self.deps.clone()))
    }

    pub fn password_reset_mailer(&self) -> ConsumerRunner<Command, PasswordResetMailer> {
        self.runner(PasswordResetMailer::new(self.app.clone(), self.deps.clone()))
    }

    pub fn magic_login_mailer(&self) -> ConsumerRunner<Command, MagicLoginMailer> {
        self.runner(MagicLoginMailer::new(self.app.clone(), self.deps.clone()))
    }

    pub fn preview_generator(&self) -> ConsumerRunner<Command, PreviewGenerator> {
        self.runner(PreviewGenerator::new(self.app.clone(), self.deps.clone()))
    }

    /// Every logged command, in order, as replay would see it.
    pub async fn logged(&self) -> Vec<Command> {
        use futures::TryStreamExt;

        self.log
            .after(0)
            .map_ok(|entry| entry.message)
            .try_collect()
            .await
            .expect("log readable")
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
