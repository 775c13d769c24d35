//! Integration test for the project store lifecycle.
//!
//! Exercises: open_db, migrate, save_projects, load_projects,
//! load_projects_or_empty, open_db_or_memory.

use pretty_assertions::assert_eq;
use revbench_core::db;
use revbench_core::types::{FileRecord, Project, ProjectSource};

fn temp_db_path() -> String {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.keep().join("nested").join("test.db");
    path.to_string_lossy().to_string()
}

fn sample_project() -> Project {
    let mut file = FileRecord::new("src/lib.rs", "pub fn a() {}");
    file.staged_content = Some("pub fn a() -> u8 { 1 }".into());
    let mut project = Project::new(
        "demo",
        ProjectSource::GitHub { owner: "octo".into(), repo: "demo".into(), branch: "main".into() },
        vec![file, FileRecord::new("README.md", "# Demo")],
    );
    project.folders.push("docs".into());
    project
}

#[tokio::test]
async fn schema_and_pragmas() {
    let path = temp_db_path();
    let conn = db::open_db(&path).await.unwrap();

    let version: i64 = conn
        .call(|db| {
            Ok::<_, rusqlite::Error>(db.query_row(
                "SELECT MAX(version) FROM schema_version",
                [],
                |r| r.get(0),
            )?)
        })
        .await
        .unwrap();
    assert_eq!(version, 1, "schema_version should be 1");

    let journal: String = conn
        .call(|db| {
            Ok::<_, rusqlite::Error>(
                db.query_row("PRAGMA journal_mode", [], |r| r.get(0))?,
            )
        })
        .await
        .unwrap();
    assert_eq!(journal, "wal", "journal_mode should be wal");

    let kv_pk: String = conn
        .call(|db| {
            Ok::<_, rusqlite::Error>(db.query_row(
                "SELECT type FROM pragma_table_info('kv') WHERE name = 'key'",
                [],
                |r| r.get(0),
            )?)
        })
        .await
        .unwrap();
    assert_eq!(kv_pk, "TEXT", "kv.key should be TEXT");
}

#[tokio::test]
async fn fresh_store_is_empty() {
    let conn = db::open_db(&temp_db_path()).await.unwrap();
    assert!(db::load_projects(&conn).await.unwrap().is_empty());
}

#[tokio::test]
async fn projects_round_trip_and_overwrite() {
    let path = temp_db_path();
    let project = sample_project();
    {
        let conn = db::open_db(&path).await.unwrap();
        db::save_projects(&conn, std::slice::from_ref(&project)).await.unwrap();
    }

    // Reopen: migration must be idempotent and the data must survive.
    let conn = db::open_db(&path).await.unwrap();
    let loaded = db::load_projects(&conn).await.unwrap();
    assert_eq!(loaded, vec![project.clone()]);

    db::save_projects(&conn, &[]).await.unwrap();
    assert!(db::load_projects(&conn).await.unwrap().is_empty());

    let rows: i64 = conn
        .call(|db| {
            Ok::<_, rusqlite::Error>(
                db.query_row("SELECT COUNT(*) FROM kv", [], |r| r.get(0))?,
            )
        })
        .await
        .unwrap();
    assert_eq!(rows, 1, "one row under the fixed key");
}

#[tokio::test]
async fn corrupt_document_loads_as_empty() {
    let conn = db::open_db(&temp_db_path()).await.unwrap();
    db::put_value(&conn, db::PROJECTS_KEY, "{not json".to_owned()).await.unwrap();

    assert!(db::load_projects(&conn).await.is_err());
    assert!(db::load_projects_or_empty(&conn).await.is_empty());
}

#[tokio::test]
async fn unopenable_path_falls_back_to_memory() {
    let dir = tempfile::TempDir::new().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, "plain file").unwrap();
    let path = blocker.join("projects.db").to_string_lossy().to_string();

    assert!(db::open_db(&path).await.is_err());
    let conn = db::open_db_or_memory(&path).await.expect("in-memory fallback");

    let project = sample_project();
    db::save_projects(&conn, std::slice::from_ref(&project)).await.unwrap();
    assert_eq!(db::load_projects(&conn).await.unwrap(), vec![project]);
    assert!(!blocker.join("projects.db").exists());
}
