//! Storage Layer - SQLite-backed persistence
//!
//! Two kinds of database live on disk:
//! - one `<name>.db` per dataset, created from a bundled script
//! - `app_meta.db` holding local accounts and the current session

pub mod dataset;
pub mod loader;
pub mod meta;
pub mod schema;

pub use dataset::{DatasetStats, DatasetStore, TableCount};
pub use loader::{
    LoadObserver, LoadOutcome, LoadReport, SilentObserver, StatementFailure, TracingObserver,
};
pub use meta::{AccountRow, MetaStore, META_DB_NAME};
