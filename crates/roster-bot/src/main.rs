use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use roster_config::LoggingConfig;
use roster_schema::templates::TEMPLATES;
use teloxide::Bot;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

mod app;
mod bootstrap;
mod callback;
mod cli;
mod commands;
mod handlers;
mod keyboards;
mod messages;

/// Dependencies whose debug output drowns the bot's own.
const QUIET_TARGETS: [&str; 4] = ["reqwest", "hyper", "hyper_util", "teloxide"];

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("roster error: {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let config = bootstrap::load_config(cli.config.as_deref())?;
    let _log_guard = init_tracing(cli.level_override(), &config.logging)?;

    match cli.command.unwrap_or_default() {
        cli::Commands::Run => {
            config.validate().context("roster is not fully configured")?;
            let store = bootstrap::open_store(&config.sheets).await?;
            let app = Arc::new(app::App::new(store, &config.general));
            handlers::run(Bot::new(&config.telegram.token), app).await;
        }
        cli::Commands::Tables => {
            bootstrap::require_sheets(&config.sheets)?;
            let store = bootstrap::open_store(&config.sheets).await?;
            for table in store.list_tables().await.context("failed to list tables")? {
                println!("{table}");
            }
        }
        cli::Commands::Config => print!("{}", bootstrap::render_config(&config)?),
        cli::Commands::Provision => {
            bootstrap::require_sheets(&config.sheets)?;
            let store = bootstrap::open_store(&config.sheets).await?;
            let catalog = roster_schema::SchemaCatalog::new(store);
            for template in TEMPLATES {
                let provisioned = roster_schema::ensure_template(&catalog, &template)
                    .await
                    .with_context(|| format!("failed to provision {}", template.name))?;
                let status = if provisioned.created {
                    "created"
                } else {
                    "already present"
                };
                println!("{}: {status}", provisioned.table);
            }
        }
    }
    Ok(())
}

fn default_directives(level: &str) -> String {
    std::iter::once(level.to_string())
        .chain(QUIET_TARGETS.iter().map(|target| format!("{target}=warn")))
        .collect::<Vec<_>>()
        .join(",")
}

/// Console logging plus, when a log directory is configured, a daily rolling
/// file. `ROSTER_LOG` replaces the configured filter entirely.
fn init_tracing(
    level_override: Option<&str>,
    logging: &LoggingConfig,
) -> anyhow::Result<Option<WorkerGuard>> {
    let level = level_override.unwrap_or(logging.level.as_str());
    let filter = match EnvFilter::try_from_env("ROSTER_LOG") {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_directives(level))
            .with_context(|| format!("invalid log level '{level}'"))?,
    };

    let (file_layer, guard) = if logging.writes_files() {
        let appender = tracing_appender::rolling::daily(&logging.directory, &logging.file_prefix);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        (
            Some(fmt::layer().with_writer(writer).with_ansi(false)),
            Some(guard),
        )
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(guard)
}
