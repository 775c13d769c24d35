//! Client for an OpenAI-compatible chat-completions endpoint.
//!
//! Request structs are built by the [`crate::workbench::Workbench`] request
//! builders and carry the token their response must echo back. The client
//! makes one call per operation: no retry, no backoff, no streaming.

pub mod parse;
pub mod prompts;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AssistantConfig;
use crate::error::AssistantError;
use crate::types::{Analysis, ChatMessage, ProjectAnalysis};

#[derive(Debug, Clone, PartialEq)]
pub struct FixRequest {
    pub token: u64,
    pub project_id: String,
    pub file_id: String,
    pub path: String,
    pub content: String,
    pub instruction: String,
    pub language: String,
    /// Every project path, newline-joined.
    pub context: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub token: u64,
    pub project_id: String,
    pub file_id: String,
    pub path: String,
    pub content: String,
    pub language: String,
    pub context: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TestsRequest {
    pub token: u64,
    pub project_id: String,
    pub file_id: String,
    pub path: String,
    pub content: String,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub token: u64,
    pub project_id: String,
    pub question: String,
    /// Earlier turns, oldest first, without the question itself.
    pub transcript: Vec<ChatMessage>,
    /// `(path, content)` of the file open in the editor.
    pub active_file: Option<(String, String)>,
    pub context: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectAnalysisRequest {
    pub token: u64,
    pub project_id: String,
    pub name: String,
    /// `(path, excerpt)` per file.
    pub files: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [WireMessage],
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AssistantClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
}

impl AssistantClient {
    /// Builds a client from the `[assistant]` config table. The API key is
    /// read from the configured environment variable; without one, requests
    /// go out unauthenticated (local model servers).
    ///
    /// # Errors
    ///
    /// Returns `AssistantError::Http` if the TLS backend cannot be initialised.
    pub fn from_config(cfg: &AssistantConfig) -> Result<Self, AssistantError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("revbench/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_owned(),
            model: cfg.model.clone(),
            api_key: cfg.api_key(),
            temperature: cfg.temperature,
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_owned();
        self
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends one chat-completions call and returns the first choice's text.
    ///
    /// # Errors
    ///
    /// `Http` for transport failures, `Status` for non-success responses,
    /// `EmptyResponse` when the reply has no usable text.
    pub async fn complete(&self, messages: &[WireMessage]) -> Result<String, AssistantError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = CompletionRequest { model: &self.model, messages, temperature: self.temperature };

        let mut req = self.http.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AssistantError::Status { status: status.as_u16(), body });
        }

        let parsed: CompletionResponse = resp.json().await?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|t| !t.trim().is_empty())
            .ok_or(AssistantError::EmptyResponse)?;
        debug!(model = %self.model, chars = text.len(), "completion received");
        Ok(text)
    }

    /// # Errors
    ///
    /// Any `complete` error, or `MalformedAnalysis`.
    pub async fn analyze_file(&self, req: &AnalysisRequest) -> Result<Analysis, AssistantError> {
        let reply = self.complete(&prompts::analysis(req)).await?;
        parse::parse_analysis(&reply)
    }

    /// # Errors
    ///
    /// Any `complete` error, or `MalformedAnalysis`.
    pub async fn analyze_project(&self, req: &ProjectAnalysisRequest) -> Result<ProjectAnalysis, AssistantError> {
        let reply = self.complete(&prompts::project_analysis(req)).await?;
        parse::parse_project_analysis(&reply)
    }

    /// Returns the full replacement content for the file, fences stripped.
    ///
    /// # Errors
    ///
    /// Any `complete` error.
    pub async fn propose_fix(&self, req: &FixRequest) -> Result<String, AssistantError> {
        let reply = self.complete(&prompts::fix(req)).await?;
        Ok(parse::strip_code_fences(&reply))
    }

    /// # Errors
    ///
    /// Any `complete` error.
    pub async fn chat(&self, req: &ChatRequest) -> Result<String, AssistantError> {
        let reply = self.complete(&prompts::chat(req)).await?;
        Ok(reply.trim().to_owned())
    }

    /// # Errors
    ///
    /// Any `complete` error.
    pub async fn generate_tests(&self, req: &TestsRequest) -> Result<String, AssistantError> {
        let reply = self.complete(&prompts::tests(req)).await?;
        Ok(parse::strip_code_fences(&reply))
    }
}
