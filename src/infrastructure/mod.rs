// Infrastructure modules
pub mod cache;                 // LRU read cache
pub mod document_store;        // Generic document store interface
pub mod middleware;            // Request middleware
pub mod sqlite_database;       // SQLite document store

// Re-export core infrastructure components
pub use cache::Cache;
pub use document_store::{Document, DocumentQuery, DocumentStore, FilterOp, SortDirection};
pub use sqlite_database::SqliteDocumentStore;
