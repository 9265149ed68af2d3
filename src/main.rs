//! Binary entrypoint.
//!
//! Startup ordering matters: the checkpoint store must finish
//! `initialize()` (or fail fatally) before the first turn is accepted,
//! and `close()` runs after in-flight turns drain so the final
//! checkpoint of an in-progress suspension is never lost.

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use questline::agent::{ControlPlaneConfig, RunController};
use questline::config::Config;
use questline::db::{CheckpointStore, Database, MemoryStore};
use questline::history::Store;
use questline::llm::create_llm_provider;
use questline::search::JobSearchClient;
use questline::server::{self, AppState};
use questline::tools::builtin_registry;

#[derive(Parser, Debug)]
#[command(name = "questline", about = "Career-assistance agent backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the turn API server (default).
    Serve {
        /// Use an ephemeral in-memory store instead of PostgreSQL.
        #[arg(long)]
        memory_store: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "questline=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let memory_store = match cli.command {
        Some(Command::Serve { memory_store }) => memory_store,
        None => false,
    };

    let config = Config::from_env().context("loading configuration")?;

    // One backend serves as both the checkpoint store and the domain
    // database; constructed here and injected, never fetched from
    // ambient global state.
    let (store, db): (Arc<dyn CheckpointStore>, Arc<dyn Database>) = if memory_store {
        tracing::warn!("Using in-memory store; state will not survive a restart");
        let store = Arc::new(MemoryStore::new());
        (store.clone(), store)
    } else {
        let store = Arc::new(
            Store::connect(&config.database)
                .await
                .context("connecting to PostgreSQL")?,
        );
        (store.clone(), store)
    };

    // Fatal on failure: running without durable checkpoints would
    // silently lose suspended confirmations.
    store
        .initialize()
        .await
        .context("initializing checkpoint storage")?;

    let llm = create_llm_provider(&config.llm).context("creating LLM provider")?;

    let search_client = JobSearchClient::new(config.search.clone());
    if !search_client.is_configured() {
        tracing::info!("No search API key configured; job search runs database-only");
    }

    let registry = Arc::new(builtin_registry(db, Some(Arc::new(search_client))));
    tracing::info!(tools = registry.len(), "tool registry built");

    let runner = RunController::new(
        store.clone(),
        llm,
        registry,
        ControlPlaneConfig {
            governor: config.governor,
            compaction: config.compaction,
            turn: config.turn,
            gated_tools: config.gated_tools.iter().cloned().collect(),
        },
    );

    let state = AppState {
        runner: Arc::new(runner),
    };

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Shutdown signal received, draining in-flight turns");
    };

    server::serve(state, &config.server.host, config.server.port, shutdown)
        .await
        .context("serving turn API")?;

    // In-flight turns have drained; release connections.
    store.close().await;
    tracing::info!("Shutdown complete");

    Ok(())
}
