use crate::db::db_pool::DuckDBConnectionManager;
use crate::db::schema::{Column, TableSchema};
use crate::error::{PipelineError, PipelineResult};
use async_trait::async_trait;
use r2d2::Pool;
use tracing::{debug, info};

const TABLES_QUERY: &str = "
    SELECT table_name
    FROM information_schema.tables
    WHERE table_type = 'BASE TABLE' AND table_schema = ?
    ORDER BY table_name";

const COLUMNS_QUERY: &str = "
    SELECT column_name, data_type
    FROM information_schema.columns
    WHERE table_schema = ? AND table_name = ?
    ORDER BY ordinal_position";

/// Produces a full schema snapshot from the backing store.
#[async_trait]
pub trait SchemaLoader: Send + Sync {
    async fn load(&self) -> PipelineResult<TableSchema>;
}

pub struct DuckDbSchemaLoader {
    pool: Pool<DuckDBConnectionManager>,
    schema: String,
}

impl DuckDbSchemaLoader {
    pub fn new(pool: Pool<DuckDBConnectionManager>, schema: impl Into<String>) -> Self {
        Self {
            pool,
            schema: schema.into(),
        }
    }
}

#[async_trait]
impl SchemaLoader for DuckDbSchemaLoader {
    async fn load(&self) -> PipelineResult<TableSchema> {
        info!("Loading schema '{}' from catalog", self.schema);

        let pool = self.pool.clone();
        let catalog_schema = self.schema.clone();

        let schema = tokio::task::spawn_blocking(move || -> PipelineResult<TableSchema> {
            let conn = pool.get().map_err(|e| {
                PipelineError::schema_load(format!("database connection failed: {}", e))
            })?;

            let mut tables_stmt = conn
                .prepare(TABLES_QUERY)
                .map_err(|e| PipelineError::schema_load(format!("catalog query failed: {}", e)))?;
            let tables = tables_stmt
                .query_map([&catalog_schema], |row| row.get::<_, String>(0))
                .and_then(|rows| rows.collect::<Result<Vec<String>, _>>())
                .map_err(|e| PipelineError::schema_load(format!("catalog query failed: {}", e)))?;

            let mut columns_stmt = conn
                .prepare(COLUMNS_QUERY)
                .map_err(|e| PipelineError::schema_load(format!("column query failed: {}", e)))?;

            // Any failing table aborts the whole load
            let mut schema = TableSchema::new();
            for table in tables {
                let columns = columns_stmt
                    .query_map([&catalog_schema, &table], |row| {
                        Ok(Column {
                            name: row.get(0)?,
                            data_type: row.get(1)?,
                        })
                    })
                    .and_then(|rows| rows.collect::<Result<Vec<Column>, _>>())
                    .map_err(|e| {
                        PipelineError::schema_load(format!(
                            "column query for table {} failed: {}",
                            table, e
                        ))
                    })?;

                debug!("Found {} columns in table {}", columns.len(), table);
                schema.insert(table, columns);
            }

            Ok(schema)
        })
        .await
        .map_err(|e| PipelineError::schema_load(format!("schema load task failed: {}", e)))??;

        info!("Loaded schema with {} tables", schema.len());
        Ok(schema)
    }
}
