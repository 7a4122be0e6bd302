use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

// The object the model is told to answer with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSqlResponse {
    pub sql: String,
    pub analysis: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedModelResponse {
    Valid(ModelSqlResponse),
    Invalid { raw: String, reason: String },
}

/// Reads model output as a `{sql, analysis}` JSON object.
///
/// A single surrounding Markdown code fence is tolerated; anything else that
/// is not exactly such an object, or whose `sql` is blank, is `Invalid`.
pub fn parse_model_response(raw: &str) -> ParsedModelResponse {
    let invalid = |reason: String| ParsedModelResponse::Invalid {
        raw: raw.to_string(),
        reason,
    };

    match serde_json::from_str::<ModelSqlResponse>(strip_code_fence(raw)) {
        Ok(parsed) if parsed.sql.trim().is_empty() => invalid("sql field is empty".to_string()),
        Ok(parsed) => ParsedModelResponse::Valid(parsed),
        Err(e) => invalid(format!("expected a JSON object with sql and analysis fields ({})", e)),
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. "json") on the opening fence line
    match body.split_once('\n') {
        Some((info, inner)) if !info.trim_start().starts_with('{') => inner.trim(),
        _ => body.trim(),
    }
}
