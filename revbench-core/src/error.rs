//! Error types for revbench-core.
//!
//! Each subsystem gets its own `thiserror` enum so call sites can match on the
//! failure classes they actually recover from. None of these are fatal to a
//! session: callers convert them into notices or log lines.

use thiserror::Error;

/// Failures of the repository ingestion pipeline.
///
/// Only the hard failures live here. A single file that cannot be fetched is
/// dropped and logged, never surfaced as an `IngestError`.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("not a GitHub repository reference: {0}")]
    InvalidRepositoryUrl(String),

    /// Metadata lookup returned a non-success status (missing or private repo).
    #[error("repository {owner}/{repo} not found or not accessible")]
    RepositoryNotFound { owner: String, repo: String },

    #[error("failed to fetch file tree for branch {branch}: HTTP {status}")]
    TreeFetch { branch: String, status: u16 },

    #[error("no readable source files found")]
    NoReadableFiles,

    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures talking to the remote model service.
#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("assistant request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("assistant returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("assistant returned an empty response")]
    EmptyResponse,

    #[error("could not parse analysis: {0}")]
    MalformedAnalysis(#[from] serde_json::Error),
}

/// Failures of the persisted project store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] tokio_rusqlite::Error),

    #[error("could not open database: {0}")]
    Open(#[from] rusqlite::Error),

    #[error("could not (de)serialize projects: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures loading `config.toml`.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}
