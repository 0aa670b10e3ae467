//! Database module
//!
//! Connection management, schema migration, the entity cache and the
//! storage facade the rest of the application talks to.

pub mod cache;
pub mod connection;
pub mod migrations;
pub mod storage;

pub use cache::{CacheValue, EntityCache};
pub use connection::{create_pool, database_url, DatabasePool};
pub use migrations::auto_migrate;
pub use storage::{Storage, UpsertMessageInput};
