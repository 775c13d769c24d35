//! Integration tests for the chat-completions client against a mock server.

use pretty_assertions::assert_eq;
use revbench_core::assistant::{AnalysisRequest, AssistantClient, FixRequest};
use revbench_core::config::AssistantConfig;
use revbench_core::types::{SafetyStatus, Severity};
use revbench_core::AssistantError;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, key: Option<&str>) -> AssistantClient {
    AssistantClient::from_config(&AssistantConfig::default())
        .unwrap()
        .with_base_url(&server.uri())
        .with_api_key(key.map(str::to_owned))
}

fn reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "cmpl-1",
        "choices": [{ "index": 0, "message": { "role": "assistant", "content": text } }]
    }))
}

fn fix_request() -> FixRequest {
    FixRequest {
        token: 7,
        project_id: "p1".into(),
        file_id: "f1".into(),
        path: "app.py".into(),
        content: "def f(x): return eval(x)".into(),
        instruction: "remove eval".into(),
        language: "py".into(),
        context: "app.py".into(),
    }
}

#[tokio::test]
async fn propose_fix_strips_fences_and_sends_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({ "model": "gpt-4o-mini" })))
        .respond_with(reply("```python\ndef f(x):\n    return int(x)\n```"))
        .expect(1)
        .mount(&server)
        .await;

    let fixed = client(&server, Some("sk-test")).propose_fix(&fix_request()).await.unwrap();
    assert_eq!(fixed, "def f(x):\n    return int(x)\n");
}

#[tokio::test]
async fn analyze_file_parses_json_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(reply(
            r#"{"status":"DANGER","quality_score":40,"security_score":10,"performance_score":80,
                "summary":"eval on input","issues":[{"title":"eval","description":"RCE","severity":"critical","line":1}]}"#,
        ))
        .mount(&server)
        .await;

    let req = AnalysisRequest {
        token: 1,
        project_id: "p1".into(),
        file_id: "f1".into(),
        path: "app.py".into(),
        content: "eval(input())".into(),
        language: "py".into(),
        context: "app.py".into(),
    };
    let analysis = client(&server, None).analyze_file(&req).await.unwrap();
    assert_eq!(analysis.status, SafetyStatus::Danger);
    assert_eq!(analysis.security_score, 10);
    assert_eq!(analysis.issues.len(), 1);
    assert_eq!(analysis.issues[0].severity, Severity::Critical);
}

#[tokio::test]
async fn non_success_status_surfaces_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let err = client(&server, None).propose_fix(&fix_request()).await.unwrap_err();
    match err {
        AssistantError::Status { status, body } => {
            assert_eq!(status, 429);
            assert_eq!(body, "rate limited");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn empty_choice_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let err = client(&server, None).propose_fix(&fix_request()).await.unwrap_err();
    assert!(matches!(err, AssistantError::EmptyResponse));
}
