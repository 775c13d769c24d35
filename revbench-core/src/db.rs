use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;
use tracing::{info, warn};

use crate::error::StoreError;
use crate::types::Project;

/// Key under which the whole project list is stored.
pub const PROJECTS_KEY: &str = "revbench.projects";

/// Opens (or creates) the SQLite database at `path`, configures WAL mode,
/// and applies schema migrations via the `schema_version` table.
///
/// The parent directory is created when missing.
///
/// # Errors
///
/// Returns `StoreError::Io` if the directory cannot be created and
/// `StoreError::Db` if the file cannot be opened, WAL configuration fails, or
/// schema DDL fails.
pub async fn open_db(path: &str) -> Result<Connection, StoreError> {
    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let conn = Connection::open(path).await?;

    conn.call(|db| {
        db.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;",
        )?;
        db.busy_timeout(Duration::from_secs(5))?;
        Ok::<_, rusqlite::Error>(())
    })
    .await?;

    // Leftover WAL from a previous run.
    conn.call(|db| {
        db.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok::<_, rusqlite::Error>(())
    })
    .await?;

    conn.call(|db| {
        crate::schema::migrate(db)?;
        Ok::<_, rusqlite::Error>(())
    })
    .await?;

    Ok(conn)
}

/// Opens a migrated store that lives only as long as the connection.
///
/// # Errors
///
/// Returns `StoreError` if the connection or schema DDL fails.
pub async fn open_memory_db() -> Result<Connection, StoreError> {
    let conn = Connection::open_in_memory().await?;
    conn.call(|db| {
        crate::schema::migrate(db)?;
        Ok::<_, rusqlite::Error>(())
    })
    .await?;
    Ok(conn)
}

/// Opens the store at `path`, falling back to an in-memory store when that
/// fails. `None` only if the in-memory store cannot be set up either.
pub async fn open_db_or_memory(path: &str) -> Option<Connection> {
    let err = match open_db(path).await {
        Ok(conn) => return Some(conn),
        Err(e) => e,
    };
    warn!(path, error = %err, "project store unavailable; this session will not be saved");
    match open_memory_db().await {
        Ok(conn) => Some(conn),
        Err(e) => {
            warn!(error = %e, "in-memory store unavailable; saving disabled");
            None
        }
    }
}

/// Returns the current Unix timestamp in seconds.
fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Reads the raw JSON value stored under `key`, if any.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the query fails.
pub async fn get_value(conn: &Connection, key: &str) -> Result<Option<String>, tokio_rusqlite::Error> {
    let key = key.to_owned();
    conn.call(move |db| {
        let value = db
            .query_row(
                "SELECT value FROM kv WHERE key = ?1",
                rusqlite::params![&key],
                |r| r.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    })
    .await
}

/// Upserts `value` under `key` inside `BEGIN IMMEDIATE`.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the write transaction fails.
pub async fn put_value(conn: &Connection, key: &str, value: String) -> Result<(), tokio_rusqlite::Error> {
    let key = key.to_owned();
    conn.call(move |db| {
        let now = now_secs();
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key)
             DO UPDATE SET value = excluded.value,
                           updated_at = excluded.updated_at",
            rusqlite::params![&key, &value, now],
        )?;
        tx.commit()?;
        Ok(())
    })
    .await
}

/// Loads the persisted project list. A database without the key yields an
/// empty list.
///
/// # Errors
///
/// Returns `StoreError::Db` if the query fails and `StoreError::Serialize` if
/// the stored document is not a valid project list.
pub async fn load_projects(conn: &Connection) -> Result<Vec<Project>, StoreError> {
    match get_value(conn, PROJECTS_KEY).await? {
        Some(json) => Ok(serde_json::from_str(&json)?),
        None => Ok(Vec::new()),
    }
}

/// Like [`load_projects`], but any failure is logged and yields an empty list.
pub async fn load_projects_or_empty(conn: &Connection) -> Vec<Project> {
    match load_projects(conn).await {
        Ok(projects) => {
            info!(count = projects.len(), "projects loaded");
            projects
        }
        Err(e) => {
            warn!(error = %e, "could not read saved projects; starting empty");
            Vec::new()
        }
    }
}

/// Replaces the persisted project list with `projects`.
///
/// # Errors
///
/// Returns `StoreError::Serialize` if encoding fails and `StoreError::Db` if
/// the write fails.
pub async fn save_projects(conn: &Connection, projects: &[Project]) -> Result<(), StoreError> {
    let json = serde_json::to_string(projects)?;
    put_value(conn, PROJECTS_KEY, json).await?;
    Ok(())
}
