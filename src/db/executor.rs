use crate::db::db_pool::DuckDBConnectionManager;
use crate::error::{PipelineError, PipelineResult};
use async_trait::async_trait;
use chrono::{DateTime, NaiveTime};
use duckdb::types::{TimeUnit, Value};
use r2d2::Pool;
use serde_json::{Map, Number, Value as JsonValue};
use std::time::Instant;
use tracing::{debug, info, warn};

/// One result row, keyed by column name in select-list order.
pub type Row = Map<String, JsonValue>;

pub type QueryResult = Vec<Row>;

/// Runs an already validated statement and returns its rows untouched.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn run(&self, sql: &str) -> PipelineResult<QueryResult>;
}

pub struct DuckDbExecutor {
    pool: Pool<DuckDBConnectionManager>,
}

impl DuckDbExecutor {
    pub fn new(pool: Pool<DuckDBConnectionManager>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QueryExecutor for DuckDbExecutor {
    async fn run(&self, sql: &str) -> PipelineResult<QueryResult> {
        let pool = self.pool.clone();
        let sql = sql.to_string();

        tokio::task::spawn_blocking(move || -> PipelineResult<QueryResult> {
            let start_time = Instant::now();

            let conn = pool.get().map_err(|e| {
                // Timed-out statements keep their connection until DuckDB finishes them
                let state = pool.state();
                warn!(
                    connections = state.connections,
                    idle = state.idle_connections,
                    "No database connection available"
                );
                PipelineError::query_execution(format!(
                    "database connection failed ({} of {} connections idle): {}",
                    state.idle_connections,
                    pool.max_size(),
                    e
                ))
            })?;

            let mut stmt = conn
                .prepare(&sql)
                .map_err(|e| PipelineError::query_execution(e.to_string()))?;
            let mut rows = stmt
                .query([])
                .map_err(|e| PipelineError::query_execution(e.to_string()))?;

            // Column names are only known once the statement has run
            let columns = rows
                .as_ref()
                .map(|stmt| stmt.column_names())
                .unwrap_or_default();

            let mut result = QueryResult::new();
            while let Some(row) = rows
                .next()
                .map_err(|e| PipelineError::query_execution(e.to_string()))?
            {
                let mut record = Row::with_capacity(columns.len());
                for (i, name) in columns.iter().enumerate() {
                    let value: Value = row
                        .get(i)
                        .map_err(|e| PipelineError::query_execution(e.to_string()))?;
                    record.insert(name.clone(), to_json(value));
                }
                result.push(record);
            }

            info!(
                "Query executed successfully. Row count: {}, Execution time: {}ms",
                result.len(),
                start_time.elapsed().as_millis()
            );
            Ok(result)
        })
        .await
        .map_err(|e| PipelineError::query_execution(format!("query task failed: {}", e)))?
    }
}

/// Maps a DuckDB value onto JSON. Lists and structs keep their shape;
/// decimals, temporals and blobs become text.
fn to_json(value: Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Boolean(b) => JsonValue::Bool(b),
        Value::TinyInt(i) => JsonValue::from(i),
        Value::SmallInt(i) => JsonValue::from(i),
        Value::Int(i) => JsonValue::from(i),
        Value::BigInt(i) => JsonValue::from(i),
        Value::UTinyInt(i) => JsonValue::from(i),
        Value::USmallInt(i) => JsonValue::from(i),
        Value::UInt(i) => JsonValue::from(i),
        Value::UBigInt(i) => JsonValue::from(i),
        // Beyond i64 there is no lossless JSON number
        Value::HugeInt(i) => match i64::try_from(i) {
            Ok(small) => JsonValue::from(small),
            Err(_) => JsonValue::String(i.to_string()),
        },
        Value::Float(f) => float_to_json(f as f64),
        Value::Double(f) => float_to_json(f),
        Value::Text(s) | Value::Enum(s) => JsonValue::String(s),
        Value::List(items) | Value::Array(items) => {
            JsonValue::Array(items.into_iter().map(to_json).collect())
        }
        Value::Struct(fields) => JsonValue::Object(
            fields
                .iter()
                .map(|(name, value)| (name.clone(), to_json(value.clone())))
                .collect(),
        ),
        // JSON keys must be strings
        Value::Map(entries) => JsonValue::Object(
            entries
                .iter()
                .map(|(key, value)| {
                    let key = match to_json(key.clone()) {
                        JsonValue::String(s) => s,
                        other => other.to_string(),
                    };
                    (key, to_json(value.clone()))
                })
                .collect(),
        ),
        Value::Union(inner) => to_json(*inner),
        other => JsonValue::String(render_text(&other)),
    }
}

fn float_to_json(f: f64) -> JsonValue {
    Number::from_f64(f)
        .map(JsonValue::Number)
        .unwrap_or(JsonValue::Null)
}

fn render_text(value: &Value) -> String {
    match value {
        Value::Decimal(d) => d.to_string(),
        Value::Blob(bytes) => String::from_utf8_lossy(bytes).to_string(),
        Value::Date32(days) => DateTime::from_timestamp(i64::from(*days) * 86_400, 0)
            .map(|dt| dt.date_naive().to_string())
            .unwrap_or_else(|| days.to_string()),
        Value::Timestamp(unit, ticks) => DateTime::from_timestamp_micros(unit.to_micros(*ticks))
            .map(|dt| dt.naive_utc().format("%Y-%m-%dT%H:%M:%S%.f").to_string())
            .unwrap_or_else(|| ticks.to_string()),
        Value::Time64(unit, ticks) => render_time(*unit, *ticks),
        Value::Interval {
            months,
            days,
            nanos,
        } => render_interval(*months, *days, *nanos),
        other => {
            debug!("Rendering unmapped value as text: {:?}", other);
            format!("{:?}", other)
        }
    }
}

fn render_time(unit: TimeUnit, ticks: i64) -> String {
    let micros = unit.to_micros(ticks);
    let secs = u32::try_from(micros.div_euclid(1_000_000)).ok();
    let nanos = u32::try_from(micros.rem_euclid(1_000_000) * 1_000).ok();

    secs.zip(nanos)
        .and_then(|(secs, nanos)| NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos))
        .map(|time| time.format("%H:%M:%S%.f").to_string())
        .unwrap_or_else(|| ticks.to_string())
}

/// ISO-8601 duration, e.g. `P1M2DT10800S`.
fn render_interval(months: i32, days: i32, nanos: i64) -> String {
    let sign = if nanos < 0 { "-" } else { "" };
    let whole = (nanos / 1_000_000_000).unsigned_abs();
    let fraction = (nanos % 1_000_000_000).unsigned_abs();

    let seconds = if fraction == 0 {
        format!("{}{}", sign, whole)
    } else {
        let digits = format!("{:09}", fraction);
        format!("{}{}.{}", sign, whole, digits.trim_end_matches('0'))
    };
    format!("P{}M{}DT{}S", months, days, seconds)
}
