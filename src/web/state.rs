use crate::config::AppConfig;
use crate::db::db_pool::DuckDBConnectionManager;
use crate::db::executor::DuckDbExecutor;
use crate::db::schema_loader::DuckDbSchemaLoader;
use crate::db::schema_registry::SchemaRegistry;
use crate::llm::LlmManager;
use crate::pipeline::{Orchestrator, PipelineTimeouts};
use r2d2::Pool;
use std::sync::Arc;

/// Shared application state for the web server
pub struct AppState {
    pub config: AppConfig,
    pub orchestrator: Orchestrator,
    pub startup_time: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    /// Wires the DuckDB-backed loader and executor and the configured LLM backend.
    pub fn new(
        config: AppConfig,
        db_pool: Pool<DuckDBConnectionManager>,
        llm_manager: LlmManager,
    ) -> Self {
        let orchestrator = Orchestrator::new(
            Arc::new(SchemaRegistry::new()),
            Arc::new(DuckDbSchemaLoader::new(
                db_pool.clone(),
                config.database.schema.clone(),
            )),
            Arc::new(llm_manager),
            Arc::new(DuckDbExecutor::new(db_pool)),
            PipelineTimeouts::from(&config.pipeline),
        );

        Self::with_orchestrator(config, orchestrator)
    }

    pub fn with_orchestrator(config: AppConfig, orchestrator: Orchestrator) -> Self {
        Self {
            config,
            orchestrator,
            startup_time: chrono::Utc::now(),
        }
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        self.orchestrator.registry()
    }
}
