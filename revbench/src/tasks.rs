//! Background network work: assistant calls and repository imports.
//!
//! Each command first applies its `*Requested` action so the workbench issues
//! a token, then reads the request back through the matching builder and
//! spawns a tokio task. The task posts the resolved or failed action to the
//! event channel; the workbench drops it if a newer request superseded it.

use std::path::PathBuf;

use revbench_core::assistant::AssistantClient;
use revbench_core::ingest::{self, GitHubClient};
use revbench_core::workbench::NoticeLevel;
use revbench_core::Action;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

use crate::app::AppState;
use crate::event::AppEvent;

/// Work that leaves the UI task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Fix { file_id: String, instruction: String },
    /// Fix every issue of the file's cached analysis in one request.
    FixAll { file_id: String },
    Analyze { file_id: String },
    AnalyzeProject,
    Chat { text: String },
    GenerateTests { file_id: String },
    ImportGithub { url: String, name: Option<String> },
    ImportFolder { path: PathBuf, name: Option<String> },
}

/// Clients and the channel spawned tasks report back on.
pub struct Services {
    pub assistant: AssistantClient,
    pub github: GitHubClient,
    pub tx: UnboundedSender<AppEvent>,
}

impl Services {
    pub fn dispatch(&self, command: Command, state: &mut AppState) {
        match command {
            Command::Fix { file_id, instruction } => {
                state.apply(Action::FixRequested { file_id: file_id.clone() });
                if let Some(req) = state.bench.fix_request(&file_id, instruction) {
                    self.spawn_fix(req);
                }
            }
            Command::FixAll { file_id } => {
                let has_issues = state
                    .active_file()
                    .and_then(|f| f.analysis.as_ref())
                    .is_some_and(|a| !a.issues.is_empty());
                if !has_issues {
                    state.apply(Action::Notify {
                        level: NoticeLevel::Info,
                        text: "No analysis issues to fix".into(),
                    });
                    return;
                }
                state.apply(Action::FixRequested { file_id: file_id.clone() });
                if let Some(req) = state.bench.fix_all_request(&file_id) {
                    self.spawn_fix(req);
                }
            }
            Command::Analyze { file_id } => {
                state.apply(Action::AnalysisRequested { file_id: file_id.clone() });
                let Some(req) = state.bench.analysis_request(&file_id) else {
                    return;
                };
                let client = self.assistant.clone();
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let action = match client.analyze_file(&req).await {
                        Ok(analysis) => Action::AnalysisResolved {
                            project_id: req.project_id,
                            file_id: req.file_id,
                            token: req.token,
                            analysis,
                        },
                        Err(e) => {
                            warn!(path = %req.path, error = %e, "analysis failed");
                            Action::AnalysisFailed {
                                project_id: req.project_id,
                                file_id: req.file_id,
                                token: req.token,
                                message: e.to_string(),
                            }
                        }
                    };
                    let _ = tx.send(AppEvent::Apply(Box::new(action)));
                });
            }
            Command::AnalyzeProject => {
                state.apply(Action::ProjectAnalysisRequested);
                let Some(req) = state.bench.project_analysis_request() else {
                    return;
                };
                let client = self.assistant.clone();
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let action = match client.analyze_project(&req).await {
                        Ok(analysis) => Action::ProjectAnalysisResolved {
                            project_id: req.project_id,
                            token: req.token,
                            analysis,
                        },
                        Err(e) => {
                            warn!(project = %req.name, error = %e, "project analysis failed");
                            Action::ProjectAnalysisFailed {
                                project_id: req.project_id,
                                token: req.token,
                                message: e.to_string(),
                            }
                        }
                    };
                    let _ = tx.send(AppEvent::Apply(Box::new(action)));
                });
            }
            Command::Chat { text } => {
                state.apply(Action::ChatSent { text });
                let Some(req) = state.bench.chat_request() else {
                    return;
                };
                let client = self.assistant.clone();
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let action = match client.chat(&req).await {
                        Ok(reply) => Action::ChatResolved {
                            project_id: req.project_id,
                            token: req.token,
                            reply,
                        },
                        Err(e) => {
                            warn!(error = %e, "chat failed");
                            Action::ChatFailed {
                                project_id: req.project_id,
                                token: req.token,
                                message: e.to_string(),
                            }
                        }
                    };
                    let _ = tx.send(AppEvent::Apply(Box::new(action)));
                });
            }
            Command::GenerateTests { file_id } => {
                state.apply(Action::TestsRequested { file_id: file_id.clone() });
                let Some(req) = state.bench.tests_request(&file_id) else {
                    return;
                };
                let client = self.assistant.clone();
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let action = match client.generate_tests(&req).await {
                        Ok(content) => Action::TestsResolved {
                            project_id: req.project_id,
                            file_id: req.file_id,
                            token: req.token,
                            content,
                        },
                        Err(e) => {
                            warn!(path = %req.path, error = %e, "test generation failed");
                            Action::TestsFailed {
                                project_id: req.project_id,
                                file_id: req.file_id,
                                token: req.token,
                                message: e.to_string(),
                            }
                        }
                    };
                    let _ = tx.send(AppEvent::Apply(Box::new(action)));
                });
            }
            Command::ImportGithub { url, name } => {
                state.importing = Some(format!("Importing {url}"));
                let client = self.github.clone();
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let result = ingest::import_github(&client, &url, name.as_deref())
                        .await
                        .map(Box::new)
                        .map_err(|e| {
                            warn!(%url, error = %e, "github import failed");
                            e.to_string()
                        });
                    let _ = tx.send(AppEvent::Imported(result));
                });
            }
            Command::ImportFolder { path, name } => {
                state.importing = Some(format!("Importing {}", path.display()));
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let shown = path.display().to_string();
                    let joined =
                        tokio::task::spawn_blocking(move || ingest::import_folder(&path, name.as_deref()))
                            .await;
                    let result = match joined {
                        Ok(Ok(project)) => Ok(Box::new(project)),
                        Ok(Err(e)) => {
                            warn!(path = %shown, error = %e, "folder import failed");
                            Err(e.to_string())
                        }
                        Err(e) => Err(format!("import task failed: {e}")),
                    };
                    let _ = tx.send(AppEvent::Imported(result));
                });
            }
        }
    }

    fn spawn_fix(&self, req: revbench_core::assistant::FixRequest) {
        info!(path = %req.path, token = req.token, "fix requested");
        let client = self.assistant.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let action = match client.propose_fix(&req).await {
                Ok(content) => Action::FixResolved {
                    project_id: req.project_id,
                    file_id: req.file_id,
                    token: req.token,
                    content,
                },
                Err(e) => {
                    warn!(path = %req.path, error = %e, "fix failed");
                    Action::FixFailed {
                        project_id: req.project_id,
                        file_id: req.file_id,
                        token: req.token,
                        message: e.to_string(),
                    }
                }
            };
            let _ = tx.send(AppEvent::Apply(Box::new(action)));
        });
    }
}

/// Applies the result of an import: a new, opened project or a blocking error.
pub fn finish_import(state: &mut AppState, result: Result<Box<revbench_core::types::Project>, String>) {
    state.importing = None;
    match result {
        Ok(project) => {
            info!(project = %project.name, files = project.files.len(), "import finished");
            state.apply(Action::CreateProject(*project));
        }
        Err(message) => state.blocking_error = Some(message),
    }
}
