pub mod db_pool;
pub mod ddl;
pub mod executor;
pub mod schema;
pub mod schema_loader;
pub mod schema_registry;
