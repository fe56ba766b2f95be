//! # irrihub-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the `ConfigStore` and `HistoryLog` ports defined in `irrihub-app::ports`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between port records and database rows
//!
//! ## Dependency rule
//! Depends on `irrihub-app` (for port traits) and `irrihub-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod config_store;
pub mod error;
pub mod history_log;
pub mod pool;

pub use config_store::SqliteConfigStore;
pub use error::StorageError;
pub use history_log::SqliteHistoryLog;
pub use pool::{Config, Database};
