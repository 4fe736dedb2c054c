//! Database, directory records and catalogue files

pub mod catalogue;
pub mod db;
pub mod directory;
pub mod migrations;

// Re-exports for convenience
pub use catalogue::{CatalogueOutcome, CatalogueStore, FileFetcher};
pub use db::{create_pool, get_connection, DbConnection, DbPool, Directory};
