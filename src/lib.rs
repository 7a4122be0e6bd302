//! Ask questions of a DuckDB database in natural language.
//!
//! A question is turned into SQL by a language model prompted with the cached
//! schema, screened for mutating keywords, executed, and returned together
//! with the model's explanation.

pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod util;
pub mod web;
