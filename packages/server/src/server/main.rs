// Main entry point for the commons process

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commons_core::kernel::{open_command_log, ServerDeps};
use commons_core::server::{build_app, Consumers};
use commons_core::shell::{admin, Request, Shell};
use commons_core::Config;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "commons")]
#[command(about = "Link sharing and discussion on a replayable command log")]
struct Cli {
    /// Overrides COMMONS_COMMAND_LOG
    #[arg(long, global = true)]
    command_log: Option<String>,

    /// Overrides COMMONS_SKIP_ERRORS
    #[arg(long, global = true)]
    skip_errors: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay the log, start consumers and serve JSON-lines requests on stdin (default)
    Serve,

    /// Print log entries after the given id
    List {
        #[arg(default_value_t = 0)]
        after: u64,
    },

    /// Mask entries with the no-op from the next replay on
    Skip {
        #[arg(required = true)]
        ids: Vec<u64>,
    },

    /// Drop the masks on entries
    Unskip {
        #[arg(required = true)]
        ids: Vec<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries responses
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,commons_core=debug,ledger=info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(command_log) = cli.command_log {
        config.command_log = command_log;
    }
    config.skip_errors |= cli.skip_errors;
    tracing::info!(command_log = %config.command_log, "Configuration loaded");

    let deps = ServerDeps::from_config(&config)?;
    let log = open_command_log(&config.command_log).await?;
    let app = Arc::new(build_app(log, &deps, config.skip_errors));

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(app, deps, &config).await,
        Commands::List { after } => {
            for line in admin::list(&app, after).await? {
                println!("{}", line);
            }
            Ok(())
        }
        Commands::Skip { ids } => admin::skip_commands(&app, &ids).await,
        Commands::Unskip { ids } => admin::unskip_commands(&app, &ids).await,
    }
}

async fn serve(app: Arc<commons_core::common::CommonsApp>, deps: ServerDeps, config: &Config) -> Result<()> {
    let replayed = app.replay().await.context("Failed to replay command log")?;
    tracing::info!(replayed, "Command log replayed");

    let shutdown = CancellationToken::new();
    let consumers = Consumers::start(app.clone(), &deps, config, shutdown.clone());
    let shell = Shell::with_defaults(app, deps);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
            line = lines.next_line() => line.context("Failed to read stdin")?,
        };
        let Some(line) = line else {
            tracing::info!("End of input");
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => match shell.do_request(request).await {
                Ok(outcome) => json!({ "ok": outcome }),
                Err(e) => json!({ "error": format!("{:#}", e) }),
            },
            Err(e) => json!({ "error": format!("malformed request: {}", e) }),
        };

        stdout.write_all(format!("{}\n", response).as_bytes()).await?;
        stdout.flush().await?;
    }

    consumers.shutdown().await;
    Ok(())
}
