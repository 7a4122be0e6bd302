//! End-to-end behaviour of the question pipeline against test doubles.

mod common;

use common::{
    DEFAULT_TIMEOUTS, Harness, RecordingExecutor, Script, ScriptedCompletion, order_rows,
    orders_schema,
};
use sqlchat::db::schema::{Column, TableSchema};
use sqlchat::error::PipelineError;
use sqlchat::llm::models::Role;
use sqlchat::pipeline::PipelineTimeouts;
use std::time::Duration;

const TOP_ORDERS: &str = r#"{"sql":"SELECT TOP 100 * FROM orders","analysis":"Top 100 orders"}"#;

#[tokio::test]
async fn test_unloaded_schema_stops_before_any_call() {
    let harness = Harness::replying(TOP_ORDERS);

    let err = harness.orchestrator.answer("show orders").await.unwrap_err();

    assert!(matches!(err, PipelineError::SchemaNotLoaded));
    assert!(err.to_string().contains("Schema not loaded"));
    assert_eq!(harness.completion.calls(), 0);
    assert_eq!(harness.executor.calls(), 0);
}

#[tokio::test]
async fn test_valid_answer_runs_exact_sql() {
    let harness = Harness::replying(TOP_ORDERS).with_orders_loaded().await;

    let response = harness.orchestrator.answer("show orders").await.unwrap();

    assert_eq!(response.sql, "SELECT TOP 100 * FROM orders");
    assert_eq!(response.analysis, "Top 100 orders");
    assert_eq!(response.result, order_rows());
    assert_eq!(harness.executor.calls(), 1);
    assert_eq!(
        harness.executor.last_sql().as_deref(),
        Some("SELECT TOP 100 * FROM orders")
    );
}

#[tokio::test]
async fn test_conversation_is_system_prompt_plus_question() {
    let harness = Harness::replying(TOP_ORDERS).with_orders_loaded().await;

    harness.orchestrator.answer("  show orders").await.unwrap();

    let messages = harness.completion.last_messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::System);
    assert!(messages[0].content.contains("orders(id int, total decimal)"));
    assert_eq!(messages[1].role, Role::User);
    assert_eq!(messages[1].content, "  show orders");
}

#[tokio::test]
async fn test_unsafe_sql_is_never_executed() {
    let harness = Harness::replying(r#"{"sql":"DELETE FROM orders","analysis":"clean up"}"#)
        .with_orders_loaded()
        .await;

    let err = harness.orchestrator.answer("remove orders").await.unwrap_err();

    assert!(matches!(
        err,
        PipelineError::UnsafeSqlDetected { keyword: "DELETE" }
    ));
    assert_eq!(harness.completion.calls(), 1);
    assert_eq!(harness.executor.calls(), 0);
}

#[tokio::test]
async fn test_non_json_reply_is_a_parse_error() {
    let harness = Harness::replying("I'm not sure").with_orders_loaded().await;

    let err = harness.orchestrator.answer("what?").await.unwrap_err();

    assert!(matches!(err, PipelineError::ModelResponseParse { .. }));
    // The raw model text stays out of the caller-facing message
    assert!(!err.to_string().contains("I'm not sure"));
    assert_eq!(harness.executor.calls(), 0);
}

#[tokio::test]
async fn test_upstream_failure_is_surfaced() {
    let harness = Harness::new(
        ScriptedCompletion::new(Script::Fail("connection refused".to_string())),
        RecordingExecutor::returning(order_rows()),
        DEFAULT_TIMEOUTS,
    )
    .with_orders_loaded()
    .await;

    let err = harness.orchestrator.answer("show orders").await.unwrap_err();

    assert!(matches!(err, PipelineError::UpstreamService(_)));
    assert_eq!(harness.executor.calls(), 0);
}

#[tokio::test]
async fn test_execution_failure_is_not_retried() {
    let harness = Harness::new(
        ScriptedCompletion::replying(TOP_ORDERS),
        RecordingExecutor::failing("Parser Error: syntax error at or near \"100\""),
        DEFAULT_TIMEOUTS,
    )
    .with_orders_loaded()
    .await;

    let err = harness.orchestrator.answer("show orders").await.unwrap_err();

    assert!(matches!(err, PipelineError::QueryExecution { .. }));
    assert!(err.to_string().contains("syntax error"));
    assert_eq!(harness.executor.calls(), 1);
    assert_eq!(harness.completion.calls(), 1);
}

#[tokio::test]
async fn test_hung_completion_times_out() {
    let harness = Harness::new(
        ScriptedCompletion::new(Script::Hang),
        RecordingExecutor::returning(order_rows()),
        PipelineTimeouts {
            completion: Duration::from_millis(50),
            execution: Duration::from_secs(5),
        },
    )
    .with_orders_loaded()
    .await;

    let err = harness.orchestrator.answer("show orders").await.unwrap_err();

    assert!(matches!(err, PipelineError::UpstreamService(_)));
    assert!(err.to_string().contains("timeout"));
    assert_eq!(harness.executor.calls(), 0);
}

#[tokio::test]
async fn test_slow_query_times_out() {
    let harness = Harness::new(
        ScriptedCompletion::replying(TOP_ORDERS),
        RecordingExecutor::slow(Duration::from_secs(3600)),
        PipelineTimeouts {
            completion: Duration::from_secs(5),
            execution: Duration::from_millis(50),
        },
    )
    .with_orders_loaded()
    .await;

    let err = harness.orchestrator.answer("show orders").await.unwrap_err();

    assert!(matches!(err, PipelineError::QueryExecution { .. }));
    assert!(err.to_string().contains("timeout"));
}

#[tokio::test]
async fn test_refresh_replaces_registry() {
    let harness = Harness::replying(TOP_ORDERS);

    let loaded = harness.orchestrator.refresh_schema().await.unwrap();

    assert_eq!(*loaded, orders_schema());
    assert_eq!(*harness.registry.get().await.unwrap(), orders_schema());
    assert_eq!(harness.loader.calls(), 1);
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_schema() {
    let harness = Harness::replying(TOP_ORDERS);
    harness.orchestrator.refresh_schema().await.unwrap();

    harness
        .loader
        .set_outcome(Err("catalog query failed: connection reset".to_string()));
    let err = harness.orchestrator.refresh_schema().await.unwrap_err();

    assert!(matches!(err, PipelineError::SchemaLoad { .. }));
    assert_eq!(*harness.registry.get().await.unwrap(), orders_schema());
}

#[tokio::test]
async fn test_refresh_is_idempotent_for_unchanged_store() {
    let harness = Harness::replying(TOP_ORDERS);
    harness.loader.set_outcome(Ok(TableSchema::from_iter([
        ("customers", vec![Column::new("id", "int")]),
        ("orders", vec![]),
    ])));

    let first = harness.orchestrator.refresh_schema().await.unwrap();
    let second = harness.orchestrator.refresh_schema().await.unwrap();

    assert_eq!(first, second);
}
