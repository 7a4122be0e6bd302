//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use sqlchat::db::executor::{QueryExecutor, QueryResult};
use sqlchat::db::schema::{Column, TableSchema};
use sqlchat::db::schema_loader::SchemaLoader;
use sqlchat::db::schema_registry::SchemaRegistry;
use sqlchat::error::{PipelineError, PipelineResult};
use sqlchat::llm::models::ChatMessage;
use sqlchat::llm::{CompletionClient, LlmError};
use sqlchat::pipeline::{Orchestrator, PipelineTimeouts};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn orders_schema() -> TableSchema {
    TableSchema::from_iter([(
        "orders",
        vec![Column::new("id", "int"), Column::new("total", "decimal")],
    )])
}

pub fn order_rows() -> QueryResult {
    [json!({"id": 1, "total": 12.5}), json!({"id": 2, "total": 40})]
        .into_iter()
        .map(|row| match row {
            Value::Object(map) => map,
            _ => Map::new(),
        })
        .collect()
}

pub enum Script {
    Reply(String),
    Fail(String),
    Hang,
}

pub struct ScriptedCompletion {
    script: Script,
    calls: AtomicUsize,
    last_messages: Mutex<Vec<ChatMessage>>,
}

impl ScriptedCompletion {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
            last_messages: Mutex::new(Vec::new()),
        })
    }

    pub fn replying(text: &str) -> Arc<Self> {
        Self::new(Script::Reply(text.to_string()))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_messages(&self) -> Vec<ChatMessage> {
        self.last_messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletion {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_messages.lock().unwrap() = messages.to_vec();
        match &self.script {
            Script::Reply(text) => Ok(text.clone()),
            Script::Fail(message) => Err(LlmError::Connection(message.clone())),
            Script::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(LlmError::Connection("unreachable".to_string()))
            }
        }
    }
}

pub struct RecordingExecutor {
    outcome: Result<QueryResult, String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last_sql: Mutex<Option<String>>,
}

impl RecordingExecutor {
    pub fn returning(rows: QueryResult) -> Arc<Self> {
        Arc::new(Self {
            outcome: Ok(rows),
            delay: None,
            calls: AtomicUsize::new(0),
            last_sql: Mutex::new(None),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            outcome: Err(message.to_string()),
            delay: None,
            calls: AtomicUsize::new(0),
            last_sql: Mutex::new(None),
        })
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            outcome: Ok(Vec::new()),
            delay: Some(delay),
            calls: AtomicUsize::new(0),
            last_sql: Mutex::new(None),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_sql(&self) -> Option<String> {
        self.last_sql.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueryExecutor for RecordingExecutor {
    async fn run(&self, sql: &str) -> PipelineResult<QueryResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_sql.lock().unwrap() = Some(sql.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcome
            .clone()
            .map_err(PipelineError::query_execution)
    }
}

pub struct StaticLoader {
    outcome: Mutex<Result<TableSchema, String>>,
    calls: AtomicUsize,
}

impl StaticLoader {
    pub fn new(outcome: Result<TableSchema, String>) -> Arc<Self> {
        Arc::new(Self {
            outcome: Mutex::new(outcome),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn set_outcome(&self, outcome: Result<TableSchema, String>) {
        *self.outcome.lock().unwrap() = outcome;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SchemaLoader for StaticLoader {
    async fn load(&self) -> PipelineResult<TableSchema> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome
            .lock()
            .unwrap()
            .clone()
            .map_err(PipelineError::schema_load)
    }
}

pub struct Harness {
    pub registry: Arc<SchemaRegistry>,
    pub loader: Arc<StaticLoader>,
    pub completion: Arc<ScriptedCompletion>,
    pub executor: Arc<RecordingExecutor>,
    pub orchestrator: Orchestrator,
}

pub const DEFAULT_TIMEOUTS: PipelineTimeouts = PipelineTimeouts {
    completion: Duration::from_secs(5),
    execution: Duration::from_secs(5),
};

impl Harness {
    pub fn new(
        completion: Arc<ScriptedCompletion>,
        executor: Arc<RecordingExecutor>,
        timeouts: PipelineTimeouts,
    ) -> Self {
        let registry = Arc::new(SchemaRegistry::new());
        let loader = StaticLoader::new(Ok(orders_schema()));
        let orchestrator = Orchestrator::new(
            Arc::clone(&registry),
            loader.clone(),
            completion.clone(),
            executor.clone(),
            timeouts,
        );

        Self {
            registry,
            loader,
            completion,
            executor,
            orchestrator,
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::new(
            ScriptedCompletion::replying(text),
            RecordingExecutor::returning(order_rows()),
            DEFAULT_TIMEOUTS,
        )
    }

    pub async fn with_orders_loaded(self) -> Self {
        self.registry.set(orders_schema()).await;
        self
    }
}
