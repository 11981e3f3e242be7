//! # sqlpractice - SQL practice companion
//!
//! Load small sample databases from bundled scripts, run ad-hoc SQL against
//! them and grade answers against reference queries.
//!
//! sqlpractice provides:
//! - Script-to-database initialization, idempotent and best-effort
//! - Ad-hoc query execution with a canonical text form of every result
//! - Strict comparison of a user query against a reference query
//! - A read-only catalog of graded exercises
//! - Local accounts, result export and a small HTTP API

pub mod script;
pub mod assets;
pub mod storage;
pub mod query;
pub mod exercise;
pub mod auth;
pub mod export;
pub mod decks;
pub mod config;
pub mod ui;
pub mod server;

// Re-exports for convenient access
pub use exercise::{Exercise, ExerciseCatalog};
pub use query::{Comparison, ResultSet, Verdict};
pub use script::SplitMode;
pub use storage::{DatasetStore, LoadOutcome};

/// Result type alias for sqlpractice operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for sqlpractice operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid dataset name: {0}")]
    InvalidDatasetName(String),

    #[error("Dataset {0} does not exist")]
    DatasetNotFound(String),

    #[error("Unknown dataset: {0}")]
    UnknownDataset(String),

    #[error("Script error: {0}")]
    Script(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Exercise not found: {0}")]
    ExerciseNotFound(i64),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Auth error: {0}")]
    Auth(String),
}
