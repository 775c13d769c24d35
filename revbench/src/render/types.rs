//! Owned request/response types for the render thread.
//!
//! Nothing here borrows, so payloads cross the channel and sit in `AppState`
//! until the next request replaces them.

use std::hash::{DefaultHasher, Hash, Hasher};

use ratatui::text::Line;
use revbench_core::diff::DiffStats;

/// What the editor panel shows for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    /// Highlighted live content.
    Source,
    /// Live content on the left, staged proposal on the right.
    Review,
}

/// Identifies the exact content a rendered view was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewKey {
    pub project_id: String,
    pub file_id: String,
    pub kind: ViewKind,
    /// Hash of the path and every text the view was built from.
    pub fingerprint: u64,
}

impl ViewKey {
    pub fn new(project_id: &str, file_id: &str, kind: ViewKind, parts: &[&str]) -> Self {
        let mut hasher = DefaultHasher::new();
        for part in parts {
            part.hash(&mut hasher);
        }
        Self {
            project_id: project_id.to_owned(),
            file_id: file_id.to_owned(),
            kind,
            fingerprint: hasher.finish(),
        }
    }
}

/// Work sent from the main thread to the render thread.
#[derive(Debug)]
pub enum RenderRequest {
    Source { key: ViewKey, path: String, content: String },
    Review { key: ViewKey, path: String, current: String, staged: String },
}

/// Highlighted output for one view.
///
/// For `Source` views only `left` is filled. For `Review` views `left` and
/// `right` are row-aligned: `left[i]` and `right[i]` belong on the same
/// screen row.
#[derive(Debug)]
pub struct RenderedView {
    pub key: ViewKey,
    pub left: Vec<Line<'static>>,
    pub right: Vec<Line<'static>>,
    /// Row indices where a run of changed rows starts. Used by `[` / `]`.
    pub change_rows: Vec<usize>,
    pub stats: Option<DiffStats>,
}
