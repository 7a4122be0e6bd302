use crate::config::DatabaseConfig;
use duckdb::Connection;
use r2d2::{ManageConnection, Pool};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info};

pub const IN_MEMORY: &str = ":memory:";

/// Hands out connections that all share one DuckDB database instance.
///
/// The instance is opened on the first checkout rather than at construction.
/// A failed open leaves nothing behind, so the next checkout tries again.
pub struct DuckDBConnectionManager {
    path: String,
    root: Mutex<Option<Connection>>,
}

impl DuckDBConnectionManager {
    pub fn new(path: String) -> Self {
        Self {
            path,
            root: Mutex::new(None),
        }
    }

    fn open(&self) -> Result<Connection, duckdb::Error> {
        if self.path == IN_MEMORY {
            Connection::open_in_memory()
        } else {
            Connection::open(&self.path)
        }
    }
}

impl ManageConnection for DuckDBConnectionManager {
    type Connection = Connection;
    type Error = duckdb::Error;

    fn connect(&self) -> Result<Self::Connection, Self::Error> {
        let mut root = self.root.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(conn) = root.as_ref() {
            return conn.try_clone();
        }

        info!("Opening DuckDB database at {}", self.path);
        let conn = self.open()?;
        let handle = conn.try_clone()?;
        *root = Some(conn);
        Ok(handle)
    }

    fn is_valid(&self, conn: &mut Self::Connection) -> Result<(), Self::Error> {
        conn.execute("SELECT 1", [])?;
        Ok(())
    }

    fn has_broken(&self, _conn: &mut Self::Connection) -> bool {
        false
    }
}

/// Builds a pool that establishes no connection until first use.
pub fn build_pool(config: &DatabaseConfig) -> Pool<DuckDBConnectionManager> {
    debug!(
        "Building DuckDB pool for {} (max {} connections)",
        config.path, config.pool_size
    );
    Pool::builder()
        .max_size(config.pool_size.max(1))
        .min_idle(Some(0))
        .connection_timeout(Duration::from_secs(config.connect_timeout_secs.max(1)))
        .build_unchecked(DuckDBConnectionManager::new(config.path.clone()))
}
