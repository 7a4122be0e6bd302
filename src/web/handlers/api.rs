use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{error, info};

use crate::db::ddl::parse_ddl;
use crate::db::schema::TableSchema;
use crate::error::PipelineError;
use crate::pipeline::ChatResponse;
use crate::web::error::ApiError;
use crate::web::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ImportSchemaRequest {
    pub ddl: String,
}

#[derive(Debug, Serialize)]
pub struct SchemaEnvelope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    pub schema: TableSchema,
}

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: String,
    pub uptime_seconds: i64,
    pub schema_loaded: bool,
    pub table_count: usize,
    pub last_refresh: Option<String>,
    pub llm_backend: String,
    pub llm_model: String,
}

// Liveness probe
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "sqlchat" }))
}

pub async fn refresh_schema(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SchemaEnvelope>, ApiError> {
    let schema = state.orchestrator.refresh_schema().await.map_err(|e| {
        error!("Failed to refresh schema: {}", e);
        ApiError::from(e)
    })?;

    Ok(Json(SchemaEnvelope {
        success: Some(true),
        schema: TableSchema::clone(&schema),
    }))
}

pub async fn get_schema(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SchemaEnvelope>, ApiError> {
    match state.registry().get().await {
        Some(schema) => Ok(Json(SchemaEnvelope {
            success: None,
            schema: TableSchema::clone(&schema),
        })),
        None => Err(ApiError::new(
            StatusCode::NOT_FOUND,
            PipelineError::SchemaNotLoaded.to_string(),
        )),
    }
}

// Replace the registry from pasted DDL instead of the live catalog
pub async fn import_schema(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ImportSchemaRequest>, JsonRejection>,
) -> Result<Json<SchemaEnvelope>, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let schema = parse_ddl(&payload.ddl);
    if schema.is_empty() {
        return Err(ApiError::bad_request("No CREATE TABLE statements found in DDL"));
    }

    info!("Importing schema with {} tables from DDL", schema.len());
    let schema = state.registry().set(schema).await;

    Ok(Json(SchemaEnvelope {
        success: Some(true),
        schema: TableSchema::clone(&schema),
    }))
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let question = payload.message.trim();
    if question.is_empty() {
        return Err(ApiError::bad_request("message must not be empty"));
    }

    let response = state.orchestrator.answer(question).await.map_err(|e| {
        error!(kind = e.kind(), "Chat request failed: {}", e);
        ApiError::from(e)
    })?;

    Ok(Json(response))
}

pub async fn system_status(State(state): State<Arc<AppState>>) -> Json<SystemStatus> {
    let schema = state.registry().get().await;
    let uptime = chrono::Utc::now() - state.startup_time;

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime.num_seconds(),
        schema_loaded: schema.is_some(),
        table_count: schema.map(|s| s.len()).unwrap_or(0),
        last_refresh: state
            .registry()
            .last_refresh()
            .await
            .map(|t| t.to_rfc3339()),
        llm_backend: state.config.llm.backend.clone(),
        llm_model: state.config.llm.model.clone(),
    })
}
