//! nhltop server: collects the players who took part in both the all-star
//! game and the Stanley Cup final of recent NHL seasons, and serves them as
//! HTML pages.

mod config;
mod persistence;
mod report;
mod service;
mod update;

use anyhow::Context;
use clap::{Parser, Subcommand};
use nhl_client::{NhlClient, RetryPolicy, StatsApi};
use std::path::Path;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use config::ServerConfig;
use persistence::sql::Database;
use update::{UpdateScope, DEFAULT_SEASON_COUNT};

#[derive(Parser)]
#[command(name = "nhltop-server", about = "All-star and Stanley Cup final players, season by season")]
struct Cli {
    /// Defaults to `serve`.
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTML pages (default).
    Serve,
    /// Fetch seasons from the stats API into the database and exit.
    Update {
        /// Number of recent seasons (clamped to 1..=15), or a season id
        /// such as 20182019.
        #[arg(short, long, default_value_t = DEFAULT_SEASON_COUNT, allow_negative_numbers = true)]
        count: i64,
    },
    /// Print each stored season's top players.
    Report,
}

fn init_tracing(log_dir: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating log directory {}", dir.display()))?;
            let file_appender = tracing_appender::rolling::daily(dir, "nhltop-server");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true)
                .with_span_events(FmtSpan::CLOSE);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_span_events(FmtSpan::CLOSE))
        .with(file_layer)
        .with(filter)
        .init();

    Ok(guard)
}

async fn open_database(config: &ServerConfig) -> anyhow::Result<Database> {
    let url = config.database.connection_url()?;
    let db = Database::connect(&url)
        .await
        .with_context(|| format!("connecting to {}", config.database))?;
    let status = db.ensure_schema().await?;
    tracing::info!(?status, "Schema checked");
    Ok(db)
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let url = config.database.connection_url()?;
    let db = Database::connect_lazy(&url)?;
    let api: Arc<dyn StatsApi> =
        Arc::new(NhlClient::with_base_url(&config.api_base, RetryPolicy::default())?);

    let addr = config.listen_addr;
    let state = service::AppState::new(config, db, api);
    let app = service::router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = ServerConfig::from_env()?;
    let _guard = init_tracing(config.log_dir.as_deref())?;

    tracing::info!(database = %config.database, api = %config.api_base, "Starting nhltop server");

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await?,
        Commands::Update { count } => {
            let scope = UpdateScope::from_count(count)?;
            let db = open_database(&config).await?;
            let api = NhlClient::with_base_url(&config.api_base, RetryPolicy::default())?;
            let summary = update::run_update(&api, &db.games(), &db.players(), scope).await?;
            db.pool().close().await;
            println!(
                "Stored {} games and {} player stat lines from {} seasons",
                summary.games,
                summary.players,
                summary.seasons.len()
            );
        }
        Commands::Report => {
            let db = open_database(&config).await?;
            let report = report::detailed_report(&db.games(), &db.players()).await?;
            db.pool().close().await;
            print!("{}", report::render_text(&report));
        }
    }

    Ok(())
}
