//! Failure kinds of the question-to-result pipeline.
//!
//! Every stage reports through [`PipelineError`]; the web layer flattens it
//! into a single `{"error": ...}` body, so the variants here are the only
//! place the distinction between stages survives.

use crate::llm::LlmError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// The registry has never been filled by a refresh or import.
    #[error("Schema not loaded")]
    SchemaNotLoaded,

    #[error("Schema load failed: {message}")]
    SchemaLoad { message: String },

    #[error("Upstream service error: {0}")]
    UpstreamService(#[from] LlmError),

    /// The model answered, but not with a `{sql, analysis}` object.
    #[error("Model response could not be parsed: {reason}")]
    ModelResponseParse { reason: String },

    #[error("Dangerous SQL detected: {keyword} statements are not allowed")]
    UnsafeSqlDetected { keyword: &'static str },

    #[error("Query execution failed: {message}")]
    QueryExecution { message: String },
}

impl PipelineError {
    pub fn schema_load(message: impl Into<String>) -> Self {
        Self::SchemaLoad {
            message: message.into(),
        }
    }

    pub fn model_response_parse(reason: impl Into<String>) -> Self {
        Self::ModelResponseParse {
            reason: reason.into(),
        }
    }

    pub fn query_execution(message: impl Into<String>) -> Self {
        Self::QueryExecution {
            message: message.into(),
        }
    }

    /// Short stable name of the failure kind, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SchemaNotLoaded => "schema_not_loaded",
            Self::SchemaLoad { .. } => "schema_load",
            Self::UpstreamService(_) => "upstream_service",
            Self::ModelResponseParse { .. } => "model_response_parse",
            Self::UnsafeSqlDetected { .. } => "unsafe_sql",
            Self::QueryExecution { .. } => "query_execution",
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
