//! The workbench: the single state container behind the UI.
//!
//! Every mutation goes through [`Workbench::apply`], which consumes the current
//! value and returns the next one. Network results come back as `*Resolved` /
//! `*Failed` actions carrying the request token they were issued with; stale
//! tokens are dropped so an older response can never overwrite a newer one.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::archive;
use crate::assistant::{AnalysisRequest, ChatRequest, FixRequest, ProjectAnalysisRequest, TestsRequest};
use crate::history::EditHistory;
use crate::staging::{self, FixStatus, RequestKind, RequestTokens};
use crate::types::{
    Analysis, ChatMessage, ChatRole, FileRecord, Project, ProjectAnalysis,
};

/// How long a transient notice stays on screen.
pub const NOTICE_TTL: Duration = Duration::from_secs(4);

/// Upper bound on characters of a single file sent with a project analysis.
const PROJECT_ANALYSIS_FILE_CHARS: usize = 4_000;

/// Optional retention caps. `None` keeps everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Limits {
    pub history: Option<usize>,
    pub versions: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A transient, user-visible message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: u64,
    pub level: NoticeLevel,
    pub text: String,
    pub raised_at: Instant,
}

/// Every state transition the workbench understands.
#[derive(Debug, Clone)]
pub enum Action {
    /// Adds a project and opens it.
    CreateProject(Project),
    DeleteProject { project_id: String },
    OpenProject { project_id: String },
    CloseProject,

    SelectFile { file_id: String },
    CreateFile { path: String, content: String },
    CreateFolder { path: String },
    RenameFile { file_id: String, path: String },
    DeleteFile { file_id: String },

    /// New content for the active file, typically one keystroke.
    Edit { content: String },
    Undo,
    Redo,

    FixRequested { file_id: String },
    FixResolved { project_id: String, file_id: String, token: u64, content: String },
    FixFailed { project_id: String, file_id: String, token: u64, message: String },
    AcceptFix { file_id: String },
    RejectFix { file_id: String },
    Revert { file_id: String, version_id: String },

    AnalysisRequested { file_id: String },
    AnalysisResolved { project_id: String, file_id: String, token: u64, analysis: Analysis },
    AnalysisFailed { project_id: String, file_id: String, token: u64, message: String },

    ProjectAnalysisRequested,
    ProjectAnalysisResolved { project_id: String, token: u64, analysis: ProjectAnalysis },
    ProjectAnalysisFailed { project_id: String, token: u64, message: String },

    ChatSent { text: String },
    ChatResolved { project_id: String, token: u64, reply: String },
    ChatFailed { project_id: String, token: u64, message: String },

    TestsRequested { file_id: String },
    TestsResolved { project_id: String, file_id: String, token: u64, content: String },
    TestsFailed { project_id: String, file_id: String, token: u64, message: String },

    Notify { level: NoticeLevel, text: String },
    DismissNotice { id: u64 },
    ExpireNotices { now: Instant },
}

/// Application state: projects, selection, history, in-flight requests.
#[derive(Debug, Clone)]
pub struct Workbench {
    projects: Vec<Project>,
    active_project: Option<String>,
    active_file: Option<String>,
    history: Option<EditHistory>,
    tokens: RequestTokens,
    notices: Vec<Notice>,
    next_notice: u64,
    limits: Limits,
    /// Set when a fix for the active file lands, cleared on accept/reject/select.
    reviewing: bool,
    /// Bumped on every change to `projects`; callers persist when it moves.
    revision: u64,
}

impl Default for Workbench {
    fn default() -> Self {
        Self::new(Vec::new(), Limits::default())
    }
}

/// Token key for a file-scoped request. File ids are only unique per project
/// (GitHub blob hashes repeat when a repository is imported twice).
fn file_key(project_id: &str, file_id: &str) -> String {
    format!("{project_id}/{file_id}")
}

impl Workbench {
    pub fn new(projects: Vec<Project>, limits: Limits) -> Self {
        Self {
            projects,
            active_project: None,
            active_file: None,
            history: None,
            tokens: RequestTokens::default(),
            notices: Vec::new(),
            next_notice: 0,
            limits,
            reviewing: false,
            revision: 0,
        }
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn active_project(&self) -> Option<&Project> {
        let id = self.active_project.as_deref()?;
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn active_file(&self) -> Option<&FileRecord> {
        let file_id = self.active_file.as_deref()?;
        self.active_project()?.file(file_id)
    }

    pub fn active_file_id(&self) -> Option<&str> {
        self.active_file.as_deref()
    }

    pub fn history(&self) -> Option<&EditHistory> {
        self.history.as_ref()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn reviewing(&self) -> bool {
        self.reviewing
    }

    /// Review state of a file in the active project.
    pub fn fix_status(&self, file_id: &str) -> FixStatus {
        let Some(project) = self.active_project() else {
            return FixStatus::Clean;
        };
        let Some(file) = project.file(file_id) else {
            return FixStatus::Clean;
        };
        if self.tokens.is_pending(&file_key(&project.id, file_id), RequestKind::Fix) {
            FixStatus::Fixing
        } else if file.staged_content.is_some() {
            FixStatus::Staged
        } else {
            FixStatus::Clean
        }
    }

    /// Whether a request of `kind` is in flight for a file of the active project.
    pub fn is_pending(&self, file_id: &str, kind: RequestKind) -> bool {
        self.active_project
            .as_deref()
            .is_some_and(|p| self.tokens.is_pending(&file_key(p, file_id), kind))
    }

    /// Whether a project-scoped request of `kind` is in flight.
    pub fn is_project_pending(&self, kind: RequestKind) -> bool {
        self.active_project
            .as_deref()
            .is_some_and(|p| self.tokens.is_pending(p, kind))
    }

    // ------------------------------------------------------------------
    // Request builders
    // ------------------------------------------------------------------

    /// Builds the fix request issued by the last `FixRequested` for `file_id`.
    pub fn fix_request(&self, file_id: &str, instruction: impl Into<String>) -> Option<FixRequest> {
        let project = self.active_project()?;
        let file = project.file(file_id)?;
        let token = self.tokens.pending(&file_key(&project.id, file_id), RequestKind::Fix)?;
        Some(FixRequest {
            token,
            project_id: project.id.clone(),
            file_id: file.id.clone(),
            path: file.path.clone(),
            content: file.content.clone(),
            instruction: instruction.into(),
            language: file.language.clone(),
            context: project.context(),
        })
    }

    /// Builds a fix request that addresses every issue of the cached analysis.
    pub fn fix_all_request(&self, file_id: &str) -> Option<FixRequest> {
        let issues = &self.active_project()?.file(file_id)?.analysis.as_ref()?.issues;
        if issues.is_empty() {
            return None;
        }
        self.fix_request(file_id, staging::batch_instruction(issues))
    }

    pub fn analysis_request(&self, file_id: &str) -> Option<AnalysisRequest> {
        let project = self.active_project()?;
        let file = project.file(file_id)?;
        let token = self.tokens.pending(&file_key(&project.id, file_id), RequestKind::Analysis)?;
        Some(AnalysisRequest {
            token,
            project_id: project.id.clone(),
            file_id: file.id.clone(),
            path: file.path.clone(),
            content: file.content.clone(),
            language: file.language.clone(),
            context: project.context(),
        })
    }

    pub fn tests_request(&self, file_id: &str) -> Option<TestsRequest> {
        let project = self.active_project()?;
        let file = project.file(file_id)?;
        let token = self.tokens.pending(&file_key(&project.id, file_id), RequestKind::Tests)?;
        Some(TestsRequest {
            token,
            project_id: project.id.clone(),
            file_id: file.id.clone(),
            path: file.path.clone(),
            content: file.content.clone(),
            language: file.language.clone(),
        })
    }

    /// Builds the chat request for the latest user message of the active project.
    pub fn chat_request(&self) -> Option<ChatRequest> {
        let project = self.active_project()?;
        let token = self.tokens.pending(&project.id, RequestKind::Chat)?;
        let question = project
            .chat
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::User)?
            .text
            .clone();
        let transcript_len = project.chat.len().saturating_sub(1);
        Some(ChatRequest {
            token,
            project_id: project.id.clone(),
            question,
            transcript: project.chat[..transcript_len].to_vec(),
            active_file: self.active_file().map(|f| (f.path.clone(), f.content.clone())),
            context: project.context(),
        })
    }

    pub fn project_analysis_request(&self) -> Option<ProjectAnalysisRequest> {
        let project = self.active_project()?;
        let token = self.tokens.pending(&project.id, RequestKind::ProjectAnalysis)?;
        let files = project
            .files
            .iter()
            .map(|f| {
                let excerpt: String = f.content.chars().take(PROJECT_ANALYSIS_FILE_CHARS).collect();
                (f.path.clone(), excerpt)
            })
            .collect();
        Some(ProjectAnalysisRequest { token, project_id: project.id.clone(), name: project.name.clone(), files })
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// Applies `action` and returns the next state.
    pub fn apply(mut self, action: Action) -> Self {
        match action {
            Action::CreateProject(project) => {
                info!(project = %project.name, files = project.files.len(), "project created");
                let id = project.id.clone();
                let first = project.files.first().map(|f| f.id.clone());
                self.projects.push(project);
                self.touch();
                self.open_project(&id);
                if let Some(file_id) = first {
                    self.select_file(&file_id);
                }
            }
            Action::DeleteProject { project_id } => {
                let before = self.projects.len();
                self.projects.retain(|p| p.id != project_id);
                if self.projects.len() != before {
                    self.tokens.forget(&project_id);
                    if self.active_project.as_deref() == Some(project_id.as_str()) {
                        self.close_project();
                    }
                    self.touch();
                }
            }
            Action::OpenProject { project_id } => self.open_project(&project_id),
            Action::CloseProject => self.close_project(),

            Action::SelectFile { file_id } => self.select_file(&file_id),
            Action::CreateFile { path, content } => self.create_file(path, content),
            Action::CreateFolder { path } => self.create_folder(&path),
            Action::RenameFile { file_id, path } => self.rename_file(&file_id, path),
            Action::DeleteFile { file_id } => self.delete_file(&file_id),

            Action::Edit { content } => self.edit(content),
            Action::Undo => self.step_history(true),
            Action::Redo => self.step_history(false),

            Action::FixRequested { file_id } => self.issue_file_token(&file_id, RequestKind::Fix),
            Action::FixResolved { project_id, file_id, token, content } => {
                if self.settle_file(&project_id, &file_id, RequestKind::Fix, token) {
                    if let Some(file) = self.file_mut(&project_id, &file_id) {
                        staging::stage(file, content);
                        self.touch();
                        if self.is_active(&project_id, &file_id) {
                            self.reviewing = true;
                        }
                    }
                }
            }
            Action::FixFailed { project_id, file_id, token, message } => {
                if self.settle_file(&project_id, &file_id, RequestKind::Fix, token) {
                    self.notify(NoticeLevel::Error, format!("Fix failed: {message}"));
                }
            }
            Action::AcceptFix { file_id } => self.accept_fix(&file_id),
            Action::RejectFix { file_id } => {
                if let Some(file) = self.active_file_mut(&file_id) {
                    if staging::reject(file) {
                        self.touch();
                    }
                }
                if self.active_file.as_deref() == Some(file_id.as_str()) {
                    self.reviewing = false;
                }
            }
            Action::Revert { file_id, version_id } => self.revert(&file_id, &version_id),

            Action::AnalysisRequested { file_id } => {
                self.issue_file_token(&file_id, RequestKind::Analysis)
            }
            Action::AnalysisResolved { project_id, file_id, token, analysis } => {
                if self.settle_file(&project_id, &file_id, RequestKind::Analysis, token) {
                    if let Some(file) = self.file_mut(&project_id, &file_id) {
                        file.analysis = Some(analysis);
                        self.touch();
                    }
                }
            }
            Action::AnalysisFailed { project_id, file_id, token, message } => {
                if self.settle_file(&project_id, &file_id, RequestKind::Analysis, token) {
                    self.notify(NoticeLevel::Error, format!("Analysis failed: {message}"));
                }
            }

            Action::ProjectAnalysisRequested => {
                if let Some(id) = self.active_project.clone() {
                    self.tokens.issue(&id, RequestKind::ProjectAnalysis);
                }
            }
            Action::ProjectAnalysisResolved { project_id, token, analysis } => {
                if self.settle_project(&project_id, RequestKind::ProjectAnalysis, token) {
                    if let Some(project) = self.project_mut(&project_id) {
                        project.analysis = Some(analysis);
                        self.touch();
                    }
                }
            }
            Action::ProjectAnalysisFailed { project_id, token, message } => {
                if self.settle_project(&project_id, RequestKind::ProjectAnalysis, token) {
                    self.notify(NoticeLevel::Error, format!("Project analysis failed: {message}"));
                }
            }

            Action::ChatSent { text } => self.send_chat(text),
            Action::ChatResolved { project_id, token, reply } => {
                if self.settle_project(&project_id, RequestKind::Chat, token) {
                    if let Some(project) = self.project_mut(&project_id) {
                        project.chat.push(ChatMessage::new(ChatRole::Assistant, reply));
                        self.touch();
                    }
                }
            }
            Action::ChatFailed { project_id, token, message } => {
                if self.settle_project(&project_id, RequestKind::Chat, token) {
                    self.notify(NoticeLevel::Error, format!("Chat failed: {message}"));
                }
            }

            Action::TestsRequested { file_id } => self.issue_file_token(&file_id, RequestKind::Tests),
            Action::TestsResolved { project_id, file_id, token, content } => {
                if self.settle_file(&project_id, &file_id, RequestKind::Tests, token) {
                    self.place_tests(&project_id, &file_id, content);
                }
            }
            Action::TestsFailed { project_id, file_id, token, message } => {
                if self.settle_file(&project_id, &file_id, RequestKind::Tests, token) {
                    self.notify(NoticeLevel::Error, format!("Test generation failed: {message}"));
                }
            }

            Action::Notify { level, text } => self.notify(level, text),
            Action::DismissNotice { id } => self.notices.retain(|n| n.id != id),
            Action::ExpireNotices { now } => self
                .notices
                .retain(|n| now.saturating_duration_since(n.raised_at) < NOTICE_TTL),
        }
        self
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn touch(&mut self) {
        self.revision += 1;
    }

    fn notify(&mut self, level: NoticeLevel, text: impl Into<String>) {
        self.next_notice += 1;
        self.notices.push(Notice {
            id: self.next_notice,
            level,
            text: text.into(),
            raised_at: Instant::now(),
        });
    }

    fn is_active(&self, project_id: &str, file_id: &str) -> bool {
        self.active_project.as_deref() == Some(project_id)
            && self.active_file.as_deref() == Some(file_id)
    }

    fn project_mut(&mut self, project_id: &str) -> Option<&mut Project> {
        self.projects.iter_mut().find(|p| p.id == project_id)
    }

    fn file_mut(&mut self, project_id: &str, file_id: &str) -> Option<&mut FileRecord> {
        self.project_mut(project_id)?
            .files
            .iter_mut()
            .find(|f| f.id == file_id)
    }

    fn active_file_mut(&mut self, file_id: &str) -> Option<&mut FileRecord> {
        let project_id = self.active_project.clone()?;
        self.file_mut(&project_id, file_id)
    }

    fn settle_file(&mut self, project_id: &str, file_id: &str, kind: RequestKind, token: u64) -> bool {
        let settled = self.tokens.settle(&file_key(project_id, file_id), kind, token);
        if !settled {
            warn!(file_id, ?kind, token, "dropping stale response");
        }
        settled
    }

    fn settle_project(&mut self, project_id: &str, kind: RequestKind, token: u64) -> bool {
        let settled = self.tokens.settle(project_id, kind, token);
        if !settled {
            warn!(project_id, ?kind, token, "dropping stale response");
        }
        settled
    }

    fn issue_file_token(&mut self, file_id: &str, kind: RequestKind) {
        let Some(project) = self.active_project() else {
            return;
        };
        if project.file(file_id).is_none() {
            return;
        }
        let key = file_key(&project.id, file_id);
        let token = self.tokens.issue(&key, kind);
        debug!(file_id, ?kind, token, "request issued");
    }

    fn open_project(&mut self, project_id: &str) {
        if self.projects.iter().any(|p| p.id == project_id) {
            self.active_project = Some(project_id.to_owned());
            self.active_file = None;
            self.history = None;
            self.reviewing = false;
        }
    }

    fn close_project(&mut self) {
        self.active_project = None;
        self.active_file = None;
        self.history = None;
        self.reviewing = false;
    }

    /// Switching files resets the edit history to the file's content.
    fn select_file(&mut self, file_id: &str) {
        let Some(content) = self.active_project().and_then(|p| p.file(file_id)).map(|f| f.content.clone())
        else {
            return;
        };
        self.active_file = Some(file_id.to_owned());
        self.history = Some(match self.limits.history {
            Some(cap) => EditHistory::with_capacity(content, cap),
            None => EditHistory::new(content),
        });
        self.reviewing = false;
    }

    fn create_file(&mut self, path: String, content: String) {
        let path = normalize_path(&path);
        if path.is_empty() {
            return;
        }
        let Some(project) = self.active_project() else {
            return;
        };
        if project.file_by_path(&path).is_some() {
            self.notify(NoticeLevel::Error, format!("{path} already exists"));
            return;
        }
        let project_id = project.id.clone();
        let file = FileRecord::new(path, content);
        let file_id = file.id.clone();
        if let Some(project) = self.project_mut(&project_id) {
            project.files.push(file);
        }
        self.touch();
        self.select_file(&file_id);
    }

    fn create_folder(&mut self, path: &str) {
        let path = normalize_path(path);
        if path.is_empty() {
            return;
        }
        let Some(project_id) = self.active_project.clone() else {
            return;
        };
        if let Some(project) = self.project_mut(&project_id) {
            if !project.folders.contains(&path) {
                project.folders.push(path);
                self.touch();
            }
        }
    }

    fn rename_file(&mut self, file_id: &str, path: String) {
        let path = normalize_path(&path);
        if path.is_empty() {
            return;
        }
        let Some(project) = self.active_project() else {
            return;
        };
        if project.file_by_path(&path).is_some_and(|f| f.id != file_id) {
            self.notify(NoticeLevel::Error, format!("{path} already exists"));
            return;
        }
        if let Some(file) = self.active_file_mut(file_id) {
            file.rename(path);
            self.touch();
        }
    }

    fn delete_file(&mut self, file_id: &str) {
        let Some(project_id) = self.active_project.clone() else {
            return;
        };
        let Some(project) = self.project_mut(&project_id) else {
            return;
        };
        let before = project.files.len();
        project.files.retain(|f| f.id != file_id);
        if project.files.len() == before {
            return;
        }
        self.tokens.forget(&file_key(&project_id, file_id));
        if self.active_file.as_deref() == Some(file_id) {
            self.active_file = None;
            self.history = None;
            self.reviewing = false;
        }
        self.touch();
    }

    fn edit(&mut self, content: String) {
        let Some(file_id) = self.active_file.clone() else {
            return;
        };
        let grew = match self.history.as_mut() {
            Some(history) => history.record_edit(content.clone()),
            None => false,
        };
        if !grew {
            return;
        }
        if let Some(file) = self.active_file_mut(&file_id) {
            file.content = content;
            self.touch();
        }
    }

    fn step_history(&mut self, back: bool) {
        let Some(file_id) = self.active_file.clone() else {
            return;
        };
        let Some(history) = self.history.as_mut() else {
            return;
        };
        let stepped = if back { history.undo() } else { history.redo() };
        let Some(content) = stepped.map(str::to_owned) else {
            return;
        };
        if let Some(file) = self.active_file_mut(&file_id) {
            file.content = content;
            self.touch();
        }
    }

    /// Records externally replaced content so the pointer stays on screen content.
    fn sync_history(&mut self, file_id: &str) {
        if self.active_file.as_deref() != Some(file_id) {
            return;
        }
        let Some(content) = self.active_file().map(|f| f.content.clone()) else {
            return;
        };
        if let Some(history) = self.history.as_mut() {
            history.record_edit(content);
        }
    }

    fn accept_fix(&mut self, file_id: &str) {
        let limit = self.limits.versions;
        let accepted = self.active_file_mut(file_id).is_some_and(|f| staging::accept(f, limit));
        if accepted {
            info!(file_id, "fix accepted");
            self.sync_history(file_id);
            self.touch();
        }
        if self.active_file.as_deref() == Some(file_id) {
            self.reviewing = false;
        }
    }

    fn revert(&mut self, file_id: &str, version_id: &str) {
        let limit = self.limits.versions;
        let reverted = self
            .active_file_mut(file_id)
            .is_some_and(|f| archive::revert(f, version_id, limit));
        if reverted {
            info!(file_id, version_id, "reverted");
            self.sync_history(file_id);
            self.touch();
        }
    }

    fn send_chat(&mut self, text: String) {
        let text = text.trim().to_owned();
        if text.is_empty() {
            return;
        }
        let Some(project_id) = self.active_project.clone() else {
            return;
        };
        if let Some(project) = self.project_mut(&project_id) {
            project.chat.push(ChatMessage::new(ChatRole::User, text));
        }
        self.tokens.issue(&project_id, RequestKind::Chat);
        self.touch();
    }

    /// Generated tests land in `<stem>.test.<ext>` next to the source. An
    /// existing file at that path gets them staged for review instead.
    fn place_tests(&mut self, project_id: &str, file_id: &str, content: String) {
        let Some(source_path) = self
            .projects
            .iter()
            .find(|p| p.id == project_id)
            .and_then(|p| p.file(file_id))
            .map(|f| f.path.clone())
        else {
            return;
        };
        let target = test_path_for(&source_path);
        let Some(project) = self.project_mut(project_id) else {
            return;
        };
        let message = match project.files.iter_mut().find(|f| f.path == target) {
            Some(existing) => {
                staging::stage(existing, content);
                format!("Tests staged on {target}")
            }
            None => {
                project.files.push(FileRecord::new(target.clone(), content));
                format!("Created {target}")
            }
        };
        self.touch();
        self.notify(NoticeLevel::Info, message);
    }
}

/// Trims whitespace and surrounding slashes, collapsing empty segments.
fn normalize_path(raw: &str) -> String {
    raw.trim()
        .split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// `src/lib.rs` → `src/lib.test.rs`; `Makefile` → `Makefile.test`.
pub fn test_path_for(path: &str) -> String {
    let (dir, name) = match path.rfind('/') {
        Some(i) => (&path[..=i], &path[i + 1..]),
        None => ("", path),
    };
    match name.rfind('.') {
        Some(i) if i > 0 => format!("{dir}{}.test{}", &name[..i], &name[i..]),
        _ => format!("{dir}{name}.test"),
    }
}
