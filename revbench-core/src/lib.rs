//! revbench-core: the state and I/O behind the revbench review workbench.
//!
//! Everything here is usable without a terminal. The binary crate owns
//! rendering, key handling and task spawning; this crate owns the data model,
//! the pure [`workbench::Workbench`] transitions, repository ingestion, the
//! assistant client and SQLite persistence.

pub mod archive;
pub mod assistant;
pub mod config;
pub mod db;
pub mod diff;
pub mod error;
pub mod history;
pub mod ingest;
pub mod language;
pub mod schema;
pub mod staging;
pub mod tree;
pub mod types;
pub mod workbench;

pub use error::{AssistantError, ConfigError, IngestError, StoreError};
pub use workbench::{Action, Limits, Workbench};
