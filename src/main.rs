use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};

use sqlchat::config::{AppConfig, CliArgs};
use sqlchat::db::db_pool::build_pool;
use sqlchat::llm::LlmManager;
use sqlchat::util::logging::init_tracing;
use sqlchat::web;
use sqlchat::web::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args = CliArgs::parse();

    // Initialize logging
    init_tracing(args.json_logs);

    // Load configuration
    let config = match AppConfig::new(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Connections are opened on first use, so a database that is down at
    // startup does not stop the server
    info!("Preparing DuckDB connection pool for {}", config.database.path);
    let pool = build_pool(&config.database);

    info!("Initializing LLM manager with backend: {}", config.llm.backend);
    let llm_manager = LlmManager::new(&config.llm)?;

    let app_state = Arc::new(AppState::new(config.clone(), pool, llm_manager));

    if config.pipeline.refresh_on_startup {
        info!("Loading schema at startup");
        if let Err(e) = app_state.orchestrator.refresh_schema().await {
            // Continue anyway, POST /schema/refresh can load it later
            warn!("Failed to load schema at startup: {}", e);
        }
    }

    info!("Starting sqlchat server on {}:{}", config.web.host, config.web.port);
    match web::run_server(config.web, app_state).await {
        Ok(_) => info!("Server stopped gracefully"),
        Err(e) => {
            error!("Server error: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
