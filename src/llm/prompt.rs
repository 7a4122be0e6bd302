use crate::db::schema::summarize;
use crate::db::schema_registry::SchemaRegistry;
use crate::error::{PipelineError, PipelineResult};
use std::sync::Arc;
use tracing::debug;

const SCHEMA_PLACEHOLDER: &str = "{schema}";

const SYSTEM_PROMPT_TEMPLATE: &str = r#"You are an expert SQL assistant for DuckDB.
Use the following schema ONLY:

{schema}

Rules:
- Use only tables/columns from the schema.
- Never hallucinate columns.
- Default SQL = SELECT (read-only).
- Use LIMIT 100 for large result sets.
- Output JSON only:
{
  "sql": "...",
  "analysis": "..."
}"#;

/// Builds the system prompt from whatever schema the registry holds.
///
/// The schema summary is the only variable part; each question is prompted
/// on its own, with no history.
pub struct PromptBuilder {
    registry: Arc<SchemaRegistry>,
}

impl PromptBuilder {
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self { registry }
    }

    pub async fn build(&self) -> PipelineResult<String> {
        let schema = self
            .registry
            .get()
            .await
            .ok_or(PipelineError::SchemaNotLoaded)?;

        let prompt = render_system_prompt(&summarize(&schema));
        debug!("Prepared system prompt: {}", prompt);
        Ok(prompt)
    }
}

pub fn render_system_prompt(schema_summary: &str) -> String {
    SYSTEM_PROMPT_TEMPLATE.replacen(SCHEMA_PLACEHOLDER, schema_summary, 1)
}
