//! Web Editor API Server
//!
//! Usage:
//!   webeditor-api [--config <file>] [--skip-migrations] [--in-memory]

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use webeditor_api::{create_router, state::AppState};
use webeditor_core::{AppConfig, ContentStore, MemoryStore, PgStore, SystemClock, UserStore};

#[derive(Parser)]
#[command(name = "webeditor-api")]
#[command(about = "REST API server for the web editor")]
#[command(version)]
struct Cli {
    /// TOML configuration file; environment variables override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Do not apply pending database migrations at startup
    #[arg(long)]
    skip_migrations: bool,

    /// Keep all data in process memory instead of PostgreSQL
    #[arg(long)]
    in_memory: bool,
}

fn init_tracing(config: &AppConfig) {
    let default_filter = format!(
        "webeditor_api={level},webeditor_core={level},tower_http=debug",
        level = config.logging.level
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    if config.logging.json_format {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal(state: Arc<AppState>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    state.set_ready(false);
    tracing::info!("Shutdown signal received, draining connections");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };
    init_tracing(&config);
    config.validate().context("Invalid configuration")?;

    let (users, contents): (Arc<dyn UserStore>, Arc<dyn ContentStore>) = if cli.in_memory {
        tracing::warn!("Using in-memory store; data is lost on exit");
        let store = Arc::new(MemoryStore::new());
        (store.clone(), store)
    } else {
        let store = PgStore::connect(&config.database)
            .await
            .context("Failed to connect to PostgreSQL")?;
        if cli.skip_migrations {
            tracing::info!("Skipping database migrations");
        } else {
            store.migrate().await.context("Failed to run migrations")?;
        }
        let store = Arc::new(store);
        (store.clone(), store)
    };

    let addr = config.server.bind_address();

    // Create application state
    let state = Arc::new(
        AppState::build(config, users, contents, Arc::new(SystemClock))
            .context("Failed to initialise password hasher")?,
    );

    // Create router
    let app = create_router(state.clone());

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Web Editor API Server starting on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);
    tracing::info!("OpenAPI spec at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state))
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
