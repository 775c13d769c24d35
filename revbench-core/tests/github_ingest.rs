//! Integration tests for GitHub ingestion against a mock host.
//!
//! One `MockServer` plays both the REST API (`/repos/...`) and the raw
//! content host (mounted under `/raw`).

use std::time::Duration;

use pretty_assertions::assert_eq;
use revbench_core::ingest::{self, GitHubClient};
use revbench_core::types::ProjectSource;
use revbench_core::{Action, IngestError, Workbench};
use serde_json::json;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> GitHubClient {
    GitHubClient::new()
        .unwrap()
        .with_bases(&server.uri(), &format!("{}/raw", server.uri()))
        .with_token(None)
}

async fn mount_repo(server: &MockServer, tree: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/repos/octo/demo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "default_branch": "main" })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/demo/git/trees/main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "sha": "root", "tree": tree })))
        .mount(server)
        .await;
}

fn blob(server: &MockServer, path: &str, sha: &str) -> serde_json::Value {
    json!({
        "path": path,
        "mode": "100644",
        "type": "blob",
        "sha": sha,
        "url": format!("{}/blobs/{sha}", server.uri()),
    })
}

async fn mount_raw(server: &MockServer, file: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/raw/octo/demo/main/{file}")))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn readme_end_to_end() {
    let server = MockServer::start().await;
    mount_repo(&server, json!([blob(&server, "README.md", "sha-readme")])).await;
    mount_raw(&server, "README.md", "# Hello").await;

    let fetched = client(&server).fetch_repository("octo", "demo").await.unwrap();
    assert_eq!(fetched.branch, "main");
    assert_eq!(fetched.files.len(), 1);
    let file = &fetched.files[0];
    assert_eq!(file.id, "sha-readme");
    assert_eq!(file.name, "README.md");
    assert_eq!(file.path, "README.md");
    assert_eq!(file.content, "# Hello");
    assert_eq!(file.language, "md");
}

#[tokio::test]
async fn filters_denylist_and_directories() {
    let server = MockServer::start().await;
    mount_repo(
        &server,
        json!([
            blob(&server, "src/main.rs", "s1"),
            { "path": "src", "mode": "040000", "type": "tree", "sha": "t1" },
            blob(&server, "node_modules/left-pad/index.js", "s2"),
            blob(&server, "package-lock.json", "s3"),
            blob(&server, "README.md", "s4"),
        ]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/raw/octo/demo/main/.+$"))
        .respond_with(ResponseTemplate::new(200).set_body_string("x"))
        .mount(&server)
        .await;

    let fetched = client(&server).fetch_repository("octo", "demo").await.unwrap();
    let paths: Vec<&str> = fetched.files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["src/main.rs", "README.md"]);
}

#[tokio::test]
async fn truncates_to_thirty_in_tree_order() {
    let server = MockServer::start().await;
    let tree: Vec<_> = (0..45).map(|i| blob(&server, &format!("f{i:02}.txt"), &format!("s{i}"))).collect();
    mount_repo(&server, json!(tree)).await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/raw/octo/demo/main/.+$"))
        .respond_with(ResponseTemplate::new(200).set_body_string("x"))
        .mount(&server)
        .await;

    let fetched = client(&server).fetch_repository("octo", "demo").await.unwrap();
    assert_eq!(fetched.files.len(), 30);
    assert_eq!(fetched.files[0].path, "f00.txt");
    assert_eq!(fetched.files[29].path, "f29.txt");
}

#[tokio::test]
async fn result_order_ignores_completion_order() {
    let server = MockServer::start().await;
    mount_repo(&server, json!([blob(&server, "slow.txt", "s1"), blob(&server, "fast.txt", "s2")])).await;
    Mock::given(method("GET"))
        .and(path("/raw/octo/demo/main/slow.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("slow").set_delay(Duration::from_millis(200)))
        .mount(&server)
        .await;
    mount_raw(&server, "fast.txt", "fast").await;

    let fetched = client(&server).fetch_repository("octo", "demo").await.unwrap();
    let contents: Vec<&str> = fetched.files.iter().map(|f| f.content.as_str()).collect();
    assert_eq!(contents, vec!["slow", "fast"]);
}

#[tokio::test]
async fn raw_failure_falls_back_to_blob() {
    let server = MockServer::start().await;
    mount_repo(&server, json!([blob(&server, "README.md", "sha-readme")])).await;
    Mock::given(method("GET"))
        .and(path("/blobs/sha-readme"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "content": "IyBI\nZWxs\nbw==\n", "encoding": "base64" })),
        )
        .mount(&server)
        .await;

    let fetched = client(&server).fetch_repository("octo", "demo").await.unwrap();
    assert_eq!(fetched.files.len(), 1);
    assert_eq!(fetched.files[0].content, "# Hello");
}

#[tokio::test]
async fn file_failing_both_paths_is_dropped() {
    let server = MockServer::start().await;
    mount_repo(&server, json!([blob(&server, "a.txt", "sa"), blob(&server, "b.txt", "sb")])).await;
    mount_raw(&server, "a.txt", "alpha").await;
    Mock::given(method("GET"))
        .and(path("/blobs/sb"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let fetched = client(&server).fetch_repository("octo", "demo").await.unwrap();
    let paths: Vec<&str> = fetched.files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["a.txt"]);
}

#[tokio::test]
async fn missing_repository_is_not_found() {
    let server = MockServer::start().await;
    let err = client(&server).fetch_repository("octo", "missing").await.unwrap_err();
    assert!(matches!(err, IngestError::RepositoryNotFound { ref owner, ref repo } if owner == "octo" && repo == "missing"));
}

#[tokio::test]
async fn tree_failure_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/demo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "default_branch": "trunk" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/demo/git/trees/trunk"))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;

    let err = client(&server).fetch_repository("octo", "demo").await.unwrap_err();
    assert!(matches!(err, IngestError::TreeFetch { ref branch, status: 409 } if branch == "trunk"));
}

#[tokio::test]
async fn nothing_left_after_filter() {
    let server = MockServer::start().await;
    mount_repo(&server, json!([blob(&server, "node_modules/x.js", "s1"), blob(&server, "yarn.lock", "s2")])).await;
    let err = client(&server).fetch_repository("octo", "demo").await.unwrap_err();
    assert!(matches!(err, IngestError::NoReadableFiles));
}

#[tokio::test]
async fn import_builds_github_project() {
    let server = MockServer::start().await;
    mount_repo(&server, json!([blob(&server, "README.md", "sha-readme")])).await;
    mount_raw(&server, "README.md", "# Hello").await;

    let project = ingest::import_github(&client(&server), "https://github.com/octo/demo", None)
        .await
        .unwrap();
    assert_eq!(project.name, "demo");
    assert_eq!(
        project.source,
        ProjectSource::GitHub { owner: "octo".into(), repo: "demo".into(), branch: "main".into() }
    );
    assert_eq!(project.files.len(), 1);
}

#[tokio::test]
async fn identical_blobs_get_distinct_ids() {
    let server = MockServer::start().await;
    mount_repo(
        &server,
        json!([
            blob(&server, "a/__init__.py", "e69de29"),
            blob(&server, "b/__init__.py", "e69de29"),
            blob(&server, "main.py", "s-main"),
        ]),
    )
    .await;
    mount_raw(&server, "a/__init__.py", "").await;
    mount_raw(&server, "b/__init__.py", "").await;
    mount_raw(&server, "main.py", "print('hi')").await;

    let project = ingest::import_github(&client(&server), "octo/demo", None).await.unwrap();
    let ids: Vec<&str> = project.files.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids.len(), 3);
    assert!(ids[0] != ids[1] && ids[1] != ids[2] && ids[0] != ids[2]);

    let b = project.file_by_path("b/__init__.py").unwrap().id.clone();
    let wb = Workbench::default().apply(Action::CreateProject(project));
    let wb = wb.apply(Action::SelectFile { file_id: b.clone() });
    assert_eq!(wb.active_file().unwrap().path, "b/__init__.py");

    let wb = wb.apply(Action::DeleteFile { file_id: b });
    let mut left: Vec<&str> = wb.active_project().unwrap().files.iter().map(|f| f.path.as_str()).collect();
    left.sort_unstable();
    assert_eq!(left, vec!["a/__init__.py", "main.py"]);
}

#[tokio::test]
async fn every_fetch_failing_is_no_readable_files() {
    let server = MockServer::start().await;
    mount_repo(&server, json!([blob(&server, "a.txt", "sa"), blob(&server, "b.txt", "sb")])).await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/(raw/.+|blobs/.+)$"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client(&server).fetch_repository("octo", "demo").await.unwrap_err();
    assert!(matches!(err, IngestError::NoReadableFiles));
}
