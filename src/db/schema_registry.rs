use crate::db::schema::TableSchema;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Holds the most recently loaded schema, if any.
///
/// Starts unloaded. `set` swaps the whole snapshot under a write lock, so a
/// reader sees either the previous schema or the new one, never a mix.
/// Requests already holding an `Arc` keep the snapshot they started with.
#[derive(Default)]
pub struct SchemaRegistry {
    schema: RwLock<Option<Arc<TableSchema>>>,
    last_refresh: RwLock<Option<DateTime<Utc>>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self) -> Option<Arc<TableSchema>> {
        self.schema.read().await.clone()
    }

    pub async fn set(&self, schema: TableSchema) -> Arc<TableSchema> {
        let schema = Arc::new(schema);
        {
            let mut cache = self.schema.write().await;
            *cache = Some(Arc::clone(&schema));
        }

        let mut timestamp = self.last_refresh.write().await;
        *timestamp = Some(Utc::now());

        info!("Schema registry updated with {} tables", schema.len());
        schema
    }

    pub async fn is_loaded(&self) -> bool {
        self.schema.read().await.is_some()
    }

    pub async fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_refresh.read().await
    }
}
