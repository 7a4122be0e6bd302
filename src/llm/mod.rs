pub mod models;
pub mod prompt;
pub mod providers;

use crate::config::LlmConfig;
use crate::llm::models::ChatMessage;
use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("LLM connection error: {0}")]
    Connection(String),
    #[error("LLM response error: {0}")]
    Response(String),
    #[error("LLM configuration error: {0}")]
    Config(String),
}

/// Sends a conversation to an inference service and returns the text of the
/// first reply, without looking inside it.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError>;
}

pub struct LlmManager {
    backend: String,
    client: Box<dyn CompletionClient>,
}

impl LlmManager {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let client: Box<dyn CompletionClient> = match config.backend.as_str() {
            "openai" | "remote" => Box::new(providers::openai::OpenAiProvider::new(config)?),
            "ollama" => Box::new(providers::ollama::OllamaProvider::new(config)?),
            _ => {
                return Err(LlmError::Config(format!(
                    "Unsupported LLM backend: {}",
                    config.backend
                )));
            }
        };

        info!("Using {} completion backend with model {}", config.backend, config.model);
        Ok(Self {
            backend: config.backend.clone(),
            client,
        })
    }

    pub fn backend(&self) -> &str {
        &self.backend
    }
}

#[async_trait]
impl CompletionClient for LlmManager {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        debug!("Requesting completion for {} messages via {}", messages.len(), self.backend);
        self.client.complete(messages).await
    }
}
