//! Hunt tracker server binary.
//!
//! Wires configuration, the mob catalog, the selected document store, the
//! live projection, and the HTTP API together, then serves until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `hunt-config.yaml` (or `$HUNT_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Load and validate the mob catalog
//! 4. Open the configured store (in-memory or `PostgreSQL`)
//! 5. Load the projection and start following store changes
//! 6. Serve the API

mod error;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use hunt_api::{AppState, start_server};
use hunt_core::config::LoggingConfig;
use hunt_core::{MobCatalog, StoreBackend, TrackerConfig};
use hunt_db::{DocumentStore, MemoryStore, PostgresConfig, PostgresStore};
use hunt_projection::ProjectionStore;
use hunt_reports::{ReportPolicy, ReportService};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::ServerError;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "hunt-config.yaml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    run().await.context("hunt-server failed")
}

async fn run() -> Result<(), ServerError> {
    let config = load_config()?;
    init_logging(&config.logging);

    info!(
        backend = ?config.store.backend,
        port = config.server.port,
        maintenance = config.maintenance.is_some(),
        "hunt-server starting"
    );

    let catalog = Arc::new(MobCatalog::from_file(&config.catalog.path)?);

    match config.store.backend {
        StoreBackend::Memory => {
            info!("Using in-memory store; state is lost on exit");
            serve(MemoryStore::new(), &config, catalog).await
        }
        StoreBackend::Postgres => {
            let pg_config = PostgresConfig::new(&config.store.postgres_url)
                .with_max_connections(config.store.max_connections);
            let store = PostgresStore::connect(&pg_config).await?;
            store.run_migrations().await?;
            let listener = store.spawn_change_listener().await?;

            let result = serve(store.clone(), &config, catalog).await;

            listener.abort();
            store.close().await;
            result
        }
    }
}

async fn serve<S: DocumentStore>(
    store: S,
    config: &TrackerConfig,
    catalog: Arc<MobCatalog>,
) -> Result<(), ServerError> {
    let projection = ProjectionStore::initialize(&store, Arc::clone(&catalog)).await?;
    let reports = ReportService::new(store, catalog, ReportPolicy::from_config(config));
    let state = Arc::new(AppState::new(reports, projection.clone(), config.maintenance));

    let result = start_server(&config.server, state).await;
    projection.teardown();
    Ok(result?)
}

/// Load the configuration file, falling back to defaults if it is absent.
fn load_config() -> Result<TrackerConfig, ServerError> {
    let path = std::env::var("HUNT_CONFIG")
        .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    if path.exists() {
        Ok(TrackerConfig::from_file(&path)?)
    } else {
        // Logging is not up yet; defaults still honor the env overrides.
        Ok(TrackerConfig::parse("{}")?)
    }
}

fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    if config.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}
