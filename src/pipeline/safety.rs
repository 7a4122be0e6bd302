//! Last-resort lexical screen for generated SQL.
//!
//! The check is a denylist over raw text: a forbidden keyword anywhere in the
//! statement (subquery, string literal, comment) rejects it, and mutating
//! syntax that is not on the list passes. It does not parse SQL.

use crate::error::{PipelineError, PipelineResult};
use regex::Regex;
use std::sync::LazyLock;

pub const FORBIDDEN_KEYWORDS: [&str; 6] = ["DROP", "TRUNCATE", "ALTER", "DELETE", "UPDATE", "INSERT"];

static FORBIDDEN: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(r"(?i)\b({})\b", FORBIDDEN_KEYWORDS.join("|"));
    Regex::new(&pattern).expect("valid denylist pattern")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyVerdict {
    Safe,
    /// The first forbidden keyword found, in upper case.
    Unsafe { keyword: &'static str },
}

pub fn inspect(sql: &str) -> SafetyVerdict {
    let Some(found) = FORBIDDEN.find(sql) else {
        return SafetyVerdict::Safe;
    };

    let matched = found.as_str();
    FORBIDDEN_KEYWORDS
        .iter()
        .find(|keyword| keyword.eq_ignore_ascii_case(matched))
        .map(|keyword| SafetyVerdict::Unsafe { keyword: *keyword })
        .unwrap_or(SafetyVerdict::Safe)
}

pub fn check(sql: &str) -> PipelineResult<()> {
    match inspect(sql) {
        SafetyVerdict::Safe => Ok(()),
        SafetyVerdict::Unsafe { keyword } => Err(PipelineError::UnsafeSqlDetected { keyword }),
    }
}
