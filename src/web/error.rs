use crate::error::PipelineError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Every failed request answers with `{"error": "<message>"}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        let status = match &err {
            PipelineError::SchemaNotLoaded => StatusCode::CONFLICT,
            PipelineError::SchemaLoad { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            PipelineError::UpstreamService(_) | PipelineError::ModelResponseParse { .. } => {
                StatusCode::BAD_GATEWAY
            }
            PipelineError::UnsafeSqlDetected { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            PipelineError::QueryExecution { .. } => StatusCode::BAD_REQUEST,
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
