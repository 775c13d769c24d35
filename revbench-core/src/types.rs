use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::language::language_for_path;

/// A project: an ordered set of files imported from one source.
///
/// `files` keeps creation order (not filesystem order). Files are addressed by
/// `id`, never by path, so renames leave every reference intact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,           // UUID v4 text
    pub name: String,
    pub source: ProjectSource,
    pub created_at: DateTime<Utc>,
    pub files: Vec<FileRecord>,
    /// Explicit directory entries. Directories implied by file paths are not listed.
    #[serde(default)]
    pub folders: Vec<String>,
    #[serde(default)]
    pub analysis: Option<ProjectAnalysis>,
    #[serde(default)]
    pub chat: Vec<ChatMessage>,
}

impl Project {
    pub fn new(name: impl Into<String>, source: ProjectSource, files: Vec<FileRecord>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            source,
            created_at: Utc::now(),
            files,
            folders: Vec::new(),
            analysis: None,
            chat: Vec::new(),
        }
    }

    pub fn file(&self, id: &str) -> Option<&FileRecord> {
        self.files.iter().find(|f| f.id == id)
    }

    pub fn file_by_path(&self, path: &str) -> Option<&FileRecord> {
        self.files.iter().find(|f| f.path == path)
    }

    /// Newline-joined list of every file path, sent to the assistant as
    /// cross-file context.
    pub fn context(&self) -> String {
        self.files
            .iter()
            .map(|f| f.path.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Where a project's files came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProjectSource {
    GitHub { owner: String, repo: String, branch: String },
    Folder { path: String },
    Blank,
}

/// One file in a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: String,
    pub name: String,
    pub path: String,
    pub content: String,
    pub language: String,
    /// AI-proposed replacement awaiting accept/reject. Single slot.
    #[serde(default)]
    pub staged_content: Option<String>,
    /// Prior contents, oldest first. Append-only.
    #[serde(default)]
    pub versions: Vec<VersionSnapshot>,
    #[serde(default)]
    pub analysis: Option<Analysis>,
}

impl FileRecord {
    /// Builds a record with a fresh UUID id; name and language derive from `path`.
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), path, content)
    }

    pub fn with_id(id: impl Into<String>, path: impl Into<String>, content: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            id: id.into(),
            name: file_name(&path).to_owned(),
            language: language_for_path(&path),
            path,
            content: content.into(),
            staged_content: None,
            versions: Vec::new(),
            analysis: None,
        }
    }

    /// Moves the file to `path`, refreshing the derived name and language.
    pub fn rename(&mut self, path: impl Into<String>) {
        let path = path.into();
        self.name = file_name(&path).to_owned();
        self.language = language_for_path(&path);
        self.path = path;
    }
}

/// Last slash-delimited segment of `path`.
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Immutable copy of a file's content taken right before it was replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionSnapshot {
    pub id: String,           // UUID v4 text
    pub created_at: DateTime<Utc>,
    pub content: String,
    pub description: String,
}

/// Overall verdict of a file analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SafetyStatus {
    Safe,
    Warning,
    Danger,
}

impl SafetyStatus {
    pub fn label(self) -> &'static str {
        match self {
            SafetyStatus::Safe => "SAFE",
            SafetyStatus::Warning => "WARNING",
            SafetyStatus::Danger => "DANGER",
        }
    }
}

/// Issue severity, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Info => "info",
        }
    }

    /// Lenient parse used on model output. Unknown labels map to `Info`.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "critical" | "blocker" => Severity::Critical,
            "high" | "major" | "error" => Severity::High,
            "medium" | "moderate" | "warning" => Severity::Medium,
            "low" | "minor" => Severity::Low,
            _ => Severity::Info,
        }
    }
}

/// A single finding from an analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub title: String,
    pub description: String,
    pub severity: Severity,
    #[serde(default)]
    pub line: Option<u32>,
    #[serde(default)]
    pub suggestion: Option<String>,
}

/// Cached per-file analysis. Cleared whenever the file content is replaced
/// through accept or revert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    pub status: SafetyStatus,
    pub quality_score: u8,
    pub security_score: u8,
    pub performance_score: u8,
    pub summary: String,
    pub issues: Vec<Issue>,
}

/// Cached whole-project analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectAnalysis {
    pub summary: String,
    pub architecture_score: u8,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub issues: Vec<Issue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One turn of the project chat transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: ChatRole, text: impl Into<String>) -> Self {
        Self { role, text: text.into(), created_at: Utc::now() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_file_derives_name_and_language() {
        let f = FileRecord::new("src/app/main.rs", "fn main() {}");
        assert_eq!(f.name, "main.rs");
        assert_eq!(f.language, "rs");
        assert!(f.staged_content.is_none());
        assert!(f.versions.is_empty());
    }

    #[test]
    fn rename_keeps_id() {
        let mut f = FileRecord::new("a.js", "x");
        let id = f.id.clone();
        f.rename("lib/b.ts");
        assert_eq!(f.id, id);
        assert_eq!(f.name, "b.ts");
        assert_eq!(f.language, "ts");
    }

    #[test]
    fn severity_lenient_parse() {
        assert_eq!(Severity::parse_lenient("HIGH"), Severity::High);
        assert_eq!(Severity::parse_lenient(" minor "), Severity::Low);
        assert_eq!(Severity::parse_lenient("whatever"), Severity::Info);
    }

    #[test]
    fn project_context_lists_paths_in_order() {
        let p = Project::new(
            "demo",
            ProjectSource::Blank,
            vec![FileRecord::new("b.rs", ""), FileRecord::new("a/c.rs", "")],
        );
        assert_eq!(p.context(), "b.rs\na/c.rs");
    }
}
