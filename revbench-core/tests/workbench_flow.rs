//! End-to-end flow: folder import, editing, a staged fix, persistence.

use pretty_assertions::assert_eq;
use revbench_core::db;
use revbench_core::ingest;
use revbench_core::staging::FixStatus;
use revbench_core::tree::{build_tree, TreeNode};
use revbench_core::{Action, Limits, Workbench};

#[tokio::test]
async fn import_edit_fix_persist() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = dir.path().join("calc");
    std::fs::create_dir_all(root.join("src")).unwrap();
    std::fs::write(root.join("src/calc.py"), "def add(a, b):\n    return a - b\n").unwrap();
    std::fs::write(root.join("README.md"), "# calc\n").unwrap();

    let project = ingest::import_folder(&root, None).unwrap();
    let limits = Limits { history: Some(10), versions: Some(5) };
    let wb = Workbench::new(Vec::new(), limits).apply(Action::CreateProject(project));

    let tree = build_tree(wb.active_project().unwrap());
    assert!(matches!(&tree[0], TreeNode::Directory { name, .. } if name == "src"));

    let calc_id = wb
        .active_project()
        .unwrap()
        .file_by_path("src/calc.py")
        .unwrap()
        .id
        .clone();
    let wb = wb
        .apply(Action::SelectFile { file_id: calc_id.clone() })
        .apply(Action::Edit { content: "def add(a, b):\n    return a - b  # bug\n".into() })
        .apply(Action::Undo);
    assert_eq!(wb.active_file().unwrap().content, "def add(a, b):\n    return a - b\n");

    let wb = wb.apply(Action::FixRequested { file_id: calc_id.clone() });
    let req = wb.fix_request(&calc_id, "fix the addition").unwrap();
    let wb = wb.apply(Action::FixResolved {
        project_id: req.project_id.clone(),
        file_id: calc_id.clone(),
        token: req.token,
        content: "def add(a, b):\n    return a + b\n".into(),
    });
    assert_eq!(wb.fix_status(&calc_id), FixStatus::Staged);
    let wb = wb.apply(Action::AcceptFix { file_id: calc_id.clone() });

    let path = dir.path().join("store").join("projects.db");
    let conn = db::open_db(&path.to_string_lossy()).await.unwrap();
    db::save_projects(&conn, wb.projects()).await.unwrap();

    let restored = db::load_projects(&conn).await.unwrap();
    let file = restored[0].file(&calc_id).unwrap();
    assert_eq!(file.content, "def add(a, b):\n    return a + b\n");
    assert_eq!(file.versions.len(), 1);
    assert_eq!(file.versions[0].content, "def add(a, b):\n    return a - b\n");
    assert!(file.staged_content.is_none());
}
