//! Local persistence for captured fingerprint templates.
//!
//! This crate provides a SQLite-backed [`TemplateStore`]. The store is the
//! only place captured templates live outside the device; the service layer
//! inserts a record after each successful capture and purges the whole
//! collection after a failed one.
//!
//! # Examples
//!
//! ```no_run
//! use bioscan_core::Template;
//! use bioscan_storage::{Database, DatabaseConfig, SqliteTemplateStore, TemplateStore};
//! use chrono::Utc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DatabaseConfig::new("bioscan.db").max_connections(4);
//! let db = Database::open(&config).await?;
//! let store = SqliteTemplateStore::new(db.pool().clone());
//!
//! let id = store.insert(&Template::new("abc123")?, Utc::now()).await?;
//! if let Some(record) = store.get_by_id(id).await? {
//!     println!("Stored record {} at {}", record.id, record.created_at);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Schema
//!
//! A single table, `biometric_templates`, created by the migrations in the
//! workspace `migrations/` directory. Ids use `AUTOINCREMENT`, so they are
//! never reused after deletion. All queries are parameterized.

pub mod connection;
pub mod error;
pub mod models;
pub mod repositories;

pub use connection::{Database, DatabaseConfig};
pub use error::{StorageError, StorageResult};
pub use models::BiometricRecord;
pub use repositories::{SqliteTemplateStore, TemplateStore};
