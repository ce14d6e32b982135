// ABOUTME: Document store for platform users, capped notification logs and search counters
// ABOUTME: SQLite-backed implementation of the DocumentStore trait

pub mod error;
pub mod sqlite;
pub mod store;
pub mod types;

pub use error::{StorageError, StorageResult};
pub use sqlite::SqliteDocumentStore;
pub use store::DocumentStore;
pub use types::{DeliveryOutcome, SearchStats, UserUpdate};
