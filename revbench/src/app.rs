//! UI state for revbench.
//!
//! `AppState` wraps the core [`Workbench`] together with everything that only
//! matters on screen: mode, focus, list selections, scroll offsets, the
//! editor cursor, and the latest highlighted view. Rendering reads it; the
//! keybinding dispatcher and the main loop mutate it. Project data changes
//! only through [`AppState::apply`].

use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use revbench_core::tree::{build_tree, TreeNode};
use revbench_core::types::{FileRecord, VersionSnapshot};
use revbench_core::{Action, Workbench};

use crate::editor::EditorCursor;
use crate::render::types::{RenderRequest, RenderedView, ViewKey, ViewKind};

/// Which keybinding set is active.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Normal,
    /// Typing into the active file.
    Insert,
    /// Single-line input box; Enter submits, Esc cancels.
    Prompt(PromptKind),
    /// Yes/no dialog guarding a destructive action.
    Confirm(ConfirmKind),
    HelpOverlay,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptKind {
    FixInstruction { file_id: String },
    Chat,
    NewFile,
    NewFolder,
    Rename { file_id: String },
    ImportGithub,
    ImportFolder,
    NewProject,
}

impl PromptKind {
    pub fn title(&self) -> &'static str {
        match self {
            PromptKind::FixInstruction { .. } => " Fix instruction ",
            PromptKind::Chat => " Ask about this project ",
            PromptKind::NewFile => " New file path ",
            PromptKind::NewFolder => " New folder path ",
            PromptKind::Rename { .. } => " Rename to ",
            PromptKind::ImportGithub => " GitHub repository (owner/repo or URL) ",
            PromptKind::ImportFolder => " Local folder path ",
            PromptKind::NewProject => " New project name ",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmKind {
    DeleteFile { file_id: String, path: String },
    DeleteProject { project_id: String, name: String },
}

/// Which panel receives navigation keys.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PanelFocus {
    /// Project list, or the file tree once a project is open.
    #[default]
    Tree,
    Editor,
    Side,
}

impl PanelFocus {
    pub fn prev(self) -> Self {
        match self {
            PanelFocus::Tree => PanelFocus::Side,
            PanelFocus::Editor => PanelFocus::Tree,
            PanelFocus::Side => PanelFocus::Editor,
        }
    }

    pub fn next(self) -> Self {
        match self {
            PanelFocus::Tree => PanelFocus::Editor,
            PanelFocus::Editor => PanelFocus::Side,
            PanelFocus::Side => PanelFocus::Tree,
        }
    }
}

/// Tabs of the right-hand panel.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SideTab {
    #[default]
    Analysis,
    Chat,
    Versions,
}

impl SideTab {
    pub const ALL: [SideTab; 3] = [SideTab::Analysis, SideTab::Chat, SideTab::Versions];

    pub fn title(self) -> &'static str {
        match self {
            SideTab::Analysis => "Analysis",
            SideTab::Chat => "Chat",
            SideTab::Versions => "Versions",
        }
    }

    pub fn next(self) -> Self {
        match self {
            SideTab::Analysis => SideTab::Chat,
            SideTab::Chat => SideTab::Versions,
            SideTab::Versions => SideTab::Analysis,
        }
    }
}

/// What the last `apply` looked at, so `sync` can tell what moved.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct Synced {
    project: Option<String>,
    file: Option<String>,
    revision: u64,
}

pub struct AppState {
    pub bench: Workbench,
    pub mode: Mode,
    pub focus: PanelFocus,
    pub side_tab: SideTab,

    /// Flattened tree of the active project, rebuilt when the project changes.
    pub tree: Vec<TreeNode>,
    pub tree_state: ListState,
    pub projects_state: ListState,
    /// Selection in the versions tab; index into the newest-first list.
    pub versions_state: ListState,

    pub cursor: EditorCursor,
    /// First visible row of the editor or diff panel.
    pub editor_scroll: usize,
    pub side_scroll: u16,
    pub help_scroll: u16,

    /// Text typed into the prompt box.
    pub input: String,

    /// Latest output of the render thread.
    pub view: Option<RenderedView>,
    /// Key of the last view requested from the render thread.
    requested: Option<ViewKey>,
    /// Index into `view.change_rows` for `[` / `]`.
    pub change_cursor: usize,

    /// Label of an import in progress.
    pub importing: Option<String>,
    /// Import failure shown as a modal until dismissed.
    pub blocking_error: Option<String>,

    pub tree_viewport_height: u16,
    pub editor_viewport_height: u16,
    pub side_viewport_height: u16,

    pub left_pct: u16,
    pub center_pct: u16,
    pub right_pct: u16,
    /// Outer rects of the three panels from the last frame, for mouse hit tests.
    pub panel_rects: [Rect; 3],

    synced: Synced,
}

impl AppState {
    pub fn new(bench: Workbench) -> Self {
        let mut state = Self {
            bench,
            mode: Mode::default(),
            focus: PanelFocus::default(),
            side_tab: SideTab::default(),
            tree: Vec::new(),
            tree_state: ListState::default(),
            projects_state: ListState::default(),
            versions_state: ListState::default(),
            cursor: EditorCursor::default(),
            editor_scroll: 0,
            side_scroll: 0,
            help_scroll: 0,
            input: String::new(),
            view: None,
            requested: None,
            change_cursor: 0,
            importing: None,
            blocking_error: None,
            tree_viewport_height: 0,
            editor_viewport_height: 0,
            side_viewport_height: 0,
            left_pct: 22,
            center_pct: 50,
            right_pct: 28,
            panel_rects: [Rect::default(); 3],
            synced: Synced::default(),
        };
        if !state.bench.projects().is_empty() {
            state.projects_state.select(Some(0));
        }
        state
    }

    /// Applies `action` to the workbench and brings the UI state in line.
    pub fn apply(&mut self, action: Action) {
        self.bench = std::mem::take(&mut self.bench).apply(action);
        self.sync();
    }

    fn sync(&mut self) {
        let now = Synced {
            project: self.bench.active_project().map(|p| p.id.clone()),
            file: self.bench.active_file_id().map(str::to_owned),
            revision: self.bench.revision(),
        };
        if now == self.synced {
            return;
        }

        if now.project != self.synced.project || now.revision != self.synced.revision {
            self.tree = self.bench.active_project().map(build_tree).unwrap_or_default();
        }
        if now.project != self.synced.project {
            self.side_scroll = 0;
        }
        if now.file != self.synced.file {
            self.cursor = EditorCursor::default();
            self.editor_scroll = 0;
            self.change_cursor = 0;
            self.versions_state.select(None);
            self.select_tree_file(now.file.as_deref());
        }
        if let Some(file) = self.bench.active_file() {
            self.cursor.clamp(&file.content);
        }
        self.clamp_selections();
        self.synced = now;
    }

    fn select_tree_file(&mut self, file_id: Option<&str>) {
        let Some(file_id) = file_id else {
            return;
        };
        if let Some(i) = self.tree.iter().position(|n| n.file_id() == Some(file_id)) {
            self.tree_state.select(Some(i));
        }
    }

    fn clamp_selections(&mut self) {
        clamp_list(&mut self.tree_state, self.tree.len());
        clamp_list(&mut self.projects_state, self.bench.projects().len());
        let versions = self.bench.active_file().map_or(0, |f| f.versions.len());
        clamp_list(&mut self.versions_state, versions);
    }

    // ------------------------------------------------------------------
    // Selection helpers
    // ------------------------------------------------------------------

    pub fn active_file(&self) -> Option<&FileRecord> {
        self.bench.active_file()
    }

    pub fn selected_node(&self) -> Option<&TreeNode> {
        self.tree.get(self.tree_state.selected()?)
    }

    pub fn selected_project(&self) -> Option<&revbench_core::types::Project> {
        self.bench.projects().get(self.projects_state.selected()?)
    }

    /// Versions of the active file, newest first.
    pub fn versions(&self) -> Vec<&VersionSnapshot> {
        self.active_file()
            .map(|f| f.versions.iter().rev().collect())
            .unwrap_or_default()
    }

    pub fn selected_version(&self) -> Option<&VersionSnapshot> {
        self.versions().get(self.versions_state.selected()?).copied()
    }

    /// True when the editor panel shows a staged proposal instead of the file.
    pub fn reviewing(&self) -> bool {
        self.active_file().is_some_and(|f| f.staged_content.is_some())
    }

    /// Directory that new files and folders are created under: the selected
    /// directory, or the parent of the selected file.
    pub fn target_dir(&self) -> String {
        match self.selected_node() {
            Some(TreeNode::Directory { path, .. }) => format!("{path}/"),
            Some(TreeNode::File { path, .. }) => match path.rfind('/') {
                Some(i) => path[..=i].to_owned(),
                None => String::new(),
            },
            None => String::new(),
        }
    }

    // ------------------------------------------------------------------
    // Render thread plumbing
    // ------------------------------------------------------------------

    /// Key of the view the editor panel should show right now.
    pub fn wanted_view(&self) -> Option<ViewKey> {
        let project = self.bench.active_project()?;
        let file = self.active_file()?;
        Some(match &file.staged_content {
            Some(staged) => ViewKey::new(
                &project.id,
                &file.id,
                ViewKind::Review,
                &[&file.path, &file.content, staged],
            ),
            None => ViewKey::new(&project.id, &file.id, ViewKind::Source, &[&file.path, &file.content]),
        })
    }

    /// Returns a render request when the wanted view differs from the last
    /// one requested.
    pub fn view_request(&mut self) -> Option<RenderRequest> {
        let key = self.wanted_view()?;
        if self.requested.as_ref() == Some(&key) {
            return None;
        }
        let file = self.active_file()?;
        let request = match &file.staged_content {
            Some(staged) => RenderRequest::Review {
                key: key.clone(),
                path: file.path.clone(),
                current: file.content.clone(),
                staged: staged.clone(),
            },
            None => RenderRequest::Source {
                key: key.clone(),
                path: file.path.clone(),
                content: file.content.clone(),
            },
        };
        self.requested = Some(key);
        Some(request)
    }

    pub fn accept_view(&mut self, view: RenderedView) {
        let kind_changed = self.view.as_ref().map(|v| v.key.kind) != Some(view.key.kind);
        if kind_changed && view.key.kind == ViewKind::Review {
            self.editor_scroll = view.change_rows.first().copied().unwrap_or(0);
            self.change_cursor = 0;
        }
        self.view = Some(view);
    }

    /// The rendered view, if it matches what is on screen right now.
    pub fn fresh_view(&self) -> Option<&RenderedView> {
        let view = self.view.as_ref()?;
        (self.requested.as_ref() == Some(&view.key)).then_some(view)
    }

    // ------------------------------------------------------------------
    // Scrolling
    // ------------------------------------------------------------------

    fn editor_rows(&self) -> usize {
        if let Some(view) = self.fresh_view() {
            return view.left.len();
        }
        self.active_file().map_or(0, |f| f.content.split('\n').count())
    }

    pub fn scroll_down(&mut self, lines: u16) {
        match self.focus {
            PanelFocus::Tree => self.tree_list_mut().scroll_down_by(lines),
            PanelFocus::Editor => {
                if self.reviewing() {
                    let max = self.editor_rows().saturating_sub(1);
                    self.editor_scroll = (self.editor_scroll + lines as usize).min(max);
                } else if let Some(content) = self.active_file().map(|f| f.content.clone()) {
                    self.cursor.move_down(&content, lines as usize);
                    self.follow_cursor();
                }
            }
            PanelFocus::Side => match self.side_tab {
                SideTab::Versions => self.versions_state.scroll_down_by(lines),
                _ => self.side_scroll = self.side_scroll.saturating_add(lines),
            },
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        match self.focus {
            PanelFocus::Tree => self.tree_list_mut().scroll_up_by(lines),
            PanelFocus::Editor => {
                if self.reviewing() {
                    self.editor_scroll = self.editor_scroll.saturating_sub(lines as usize);
                } else if let Some(content) = self.active_file().map(|f| f.content.clone()) {
                    self.cursor.move_up(&content, lines as usize);
                    self.follow_cursor();
                }
            }
            PanelFocus::Side => match self.side_tab {
                SideTab::Versions => self.versions_state.scroll_up_by(lines),
                _ => self.side_scroll = self.side_scroll.saturating_sub(lines),
            },
        }
    }

    pub fn scroll_top(&mut self) {
        match self.focus {
            PanelFocus::Tree => self.tree_list_mut().select_first(),
            PanelFocus::Editor => {
                self.editor_scroll = 0;
                self.cursor = EditorCursor::default();
            }
            PanelFocus::Side => match self.side_tab {
                SideTab::Versions => self.versions_state.select_first(),
                _ => self.side_scroll = 0,
            },
        }
    }

    pub fn scroll_bottom(&mut self) {
        match self.focus {
            PanelFocus::Tree => self.tree_list_mut().select_last(),
            PanelFocus::Editor => {
                let rows = self.editor_rows();
                if self.reviewing() {
                    self.editor_scroll = rows.saturating_sub(1);
                } else if let Some(content) = self.active_file().map(|f| f.content.clone()) {
                    self.cursor.move_down(&content, rows);
                    self.follow_cursor();
                }
            }
            PanelFocus::Side => match self.side_tab {
                SideTab::Versions => self.versions_state.select_last(),
                // Paragraph clamps the offset.
                _ => self.side_scroll = u16::MAX,
            },
        }
    }

    fn viewport(&self) -> u16 {
        match self.focus {
            PanelFocus::Tree => self.tree_viewport_height,
            PanelFocus::Editor => self.editor_viewport_height,
            PanelFocus::Side => self.side_viewport_height,
        }
    }

    pub fn half_page_down(&mut self) {
        self.scroll_down((self.viewport() / 2).max(1));
    }

    pub fn half_page_up(&mut self) {
        self.scroll_up((self.viewport() / 2).max(1));
    }

    pub fn full_page_down(&mut self) {
        self.scroll_down(self.viewport().max(1));
    }

    pub fn full_page_up(&mut self) {
        self.scroll_up(self.viewport().max(1));
    }

    fn tree_list_mut(&mut self) -> &mut ListState {
        if self.bench.active_project().is_some() {
            &mut self.tree_state
        } else {
            &mut self.projects_state
        }
    }

    /// Keeps the cursor row inside the editor viewport.
    pub fn follow_cursor(&mut self) {
        let height = (self.editor_viewport_height as usize).max(1);
        if self.cursor.row < self.editor_scroll {
            self.editor_scroll = self.cursor.row;
        } else if self.cursor.row >= self.editor_scroll + height {
            self.editor_scroll = self.cursor.row + 1 - height;
        }
    }

    /// Jumps to the previous run of changed rows in the review diff.
    pub fn prev_change(&mut self) {
        let Some(rows) = self.fresh_view().map(|v| v.change_rows.clone()) else {
            return;
        };
        if rows.is_empty() {
            return;
        }
        self.change_cursor = self.change_cursor.saturating_sub(1).min(rows.len() - 1);
        self.editor_scroll = rows[self.change_cursor];
    }

    pub fn next_change(&mut self) {
        let Some(rows) = self.fresh_view().map(|v| v.change_rows.clone()) else {
            return;
        };
        if rows.is_empty() {
            return;
        }
        self.change_cursor = (self.change_cursor + 1).min(rows.len() - 1);
        self.editor_scroll = rows[self.change_cursor];
    }

    /// Shrinks the centre panel by 5%, giving the space to the side panels.
    pub fn shrink_center_panel(&mut self) {
        const MIN_CENTER: u16 = 20;
        const STEP: u16 = 5;
        if self.center_pct <= MIN_CENTER {
            return;
        }
        let transfer = STEP.min(self.center_pct - MIN_CENTER);
        self.center_pct -= transfer;
        let left_gain = transfer / 2;
        let right_gain = transfer - left_gain;
        self.left_pct = self.left_pct.saturating_add(left_gain);
        self.right_pct = self.right_pct.saturating_add(right_gain);
    }

    /// Grows the centre panel by up to 5%, taking it from the side panels.
    pub fn grow_center_panel(&mut self) {
        const MAX_CENTER: u16 = 80;
        const MIN_SIDE: u16 = 5;
        const STEP: u16 = 5;
        if self.center_pct >= MAX_CENTER {
            return;
        }
        let transfer = STEP.min(MAX_CENTER - self.center_pct);
        let left_give = (transfer / 2).min(self.left_pct.saturating_sub(MIN_SIDE));
        let right_give = (transfer - transfer / 2).min(self.right_pct.saturating_sub(MIN_SIDE));
        self.left_pct -= left_give;
        self.right_pct -= right_give;
        self.center_pct += left_give + right_give;
    }
}

fn clamp_list(state: &mut ListState, len: usize) {
    match state.selected() {
        _ if len == 0 => state.select(None),
        Some(i) if i >= len => state.select(Some(len - 1)),
        None => state.select(Some(0)),
        _ => {}
    }
}
