//! Question → prompt → completion → parse → validate → execute.
//!
//! Stages run strictly in order and the first failure ends the request.
//! Nothing is retried and callers never see a partial result: SQL that was
//! generated but rejected or failed is logged, not returned.

pub mod safety;

use crate::config::PipelineConfig;
use crate::db::executor::{QueryExecutor, QueryResult};
use crate::db::schema::TableSchema;
use crate::db::schema_loader::SchemaLoader;
use crate::db::schema_registry::SchemaRegistry;
use crate::error::{PipelineError, PipelineResult};
use crate::llm::models::{ChatMessage, ParsedModelResponse, parse_model_response};
use crate::llm::prompt::PromptBuilder;
use crate::llm::{CompletionClient, LlmError};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy)]
pub struct PipelineTimeouts {
    pub completion: Duration,
    pub execution: Duration,
}

impl From<&PipelineConfig> for PipelineTimeouts {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            completion: Duration::from_secs(config.completion_timeout_secs),
            execution: Duration::from_secs(config.query_timeout_secs),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatResponse {
    pub sql: String,
    pub analysis: String,
    pub result: QueryResult,
}

pub struct Orchestrator {
    registry: Arc<SchemaRegistry>,
    prompt_builder: PromptBuilder,
    loader: Arc<dyn SchemaLoader>,
    completion: Arc<dyn CompletionClient>,
    executor: Arc<dyn QueryExecutor>,
    timeouts: PipelineTimeouts,
}

impl Orchestrator {
    pub fn new(
        registry: Arc<SchemaRegistry>,
        loader: Arc<dyn SchemaLoader>,
        completion: Arc<dyn CompletionClient>,
        executor: Arc<dyn QueryExecutor>,
        timeouts: PipelineTimeouts,
    ) -> Self {
        Self {
            prompt_builder: PromptBuilder::new(Arc::clone(&registry)),
            registry,
            loader,
            completion,
            executor,
            timeouts,
        }
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    /// Loads a fresh snapshot and swaps it in only if the whole load succeeded.
    pub async fn refresh_schema(&self) -> PipelineResult<Arc<TableSchema>> {
        let schema = self.loader.load().await.inspect_err(|e| {
            warn!("Schema refresh failed, keeping previous schema: {}", e);
        })?;
        Ok(self.registry.set(schema).await)
    }

    pub async fn answer(&self, question: &str) -> PipelineResult<ChatResponse> {
        let start_time = Instant::now();
        info!("Answering question: {}", question);

        let system_prompt = self.prompt_builder.build().await?;

        let messages = [ChatMessage::system(system_prompt), ChatMessage::user(question)];
        let raw = self.complete(&messages).await?;

        let parsed = match parse_model_response(&raw) {
            ParsedModelResponse::Valid(parsed) => parsed,
            ParsedModelResponse::Invalid { raw, reason } => {
                debug!("Unparseable model output: {}", raw);
                return Err(PipelineError::model_response_parse(reason));
            }
        };
        info!("Model proposed SQL: {}", parsed.sql);

        if let Err(e) = safety::check(&parsed.sql) {
            warn!(kind = e.kind(), sql = %parsed.sql, "Rejected generated SQL");
            return Err(e);
        }

        let result = match timeout(self.timeouts.execution, self.executor.run(&parsed.sql)).await {
            Ok(Ok(rows)) => rows,
            Ok(Err(e)) => {
                warn!(kind = e.kind(), sql = %parsed.sql, "Generated SQL failed: {}", e);
                return Err(e);
            }
            Err(_) => {
                warn!(sql = %parsed.sql, "Generated SQL timed out");
                return Err(PipelineError::query_execution(format!(
                    "query exceeded {}s timeout",
                    self.timeouts.execution.as_secs_f64()
                )));
            }
        };

        info!(
            "Answered with {} rows in {}ms",
            result.len(),
            start_time.elapsed().as_millis()
        );
        Ok(ChatResponse {
            sql: parsed.sql,
            analysis: parsed.analysis,
            result,
        })
    }

    async fn complete(&self, messages: &[ChatMessage]) -> PipelineResult<String> {
        match timeout(self.timeouts.completion, self.completion.complete(messages)).await {
            Ok(reply) => Ok(reply?),
            Err(_) => Err(LlmError::Connection(format!(
                "completion exceeded {}s timeout",
                self.timeouts.completion.as_secs_f64()
            ))
            .into()),
        }
    }
}
