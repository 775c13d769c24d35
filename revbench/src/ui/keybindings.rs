//! Keybinding dispatcher for revbench.
//!
//! Translates raw crossterm `KeyEvent`s into `AppState` mutations and returns a
//! `KeyAction` telling the event loop whether to continue, quit, or hand a
//! command to the background tasks. The dispatcher branches first on
//! `state.mode` so each mode has an isolated handler.

use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Position;
use revbench_core::ingest::blank_project;
use revbench_core::tree::TreeNode;
use revbench_core::workbench::NoticeLevel;
use revbench_core::Action;

use crate::app::{AppState, ConfirmKind, Mode, PanelFocus, PromptKind, SideTab};
use crate::tasks::Command;

/// Control-flow signal returned from the key dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    Continue,
    Quit,
    /// Background work for the event loop to dispatch.
    Spawn(Command),
}

/// Dispatches a key event to the handler matching the current mode.
///
/// A blocking import error swallows the next key, whatever it is.
pub fn handle_key(key: KeyEvent, state: &mut AppState) -> KeyAction {
    if state.blocking_error.take().is_some() {
        return KeyAction::Continue;
    }
    match state.mode.clone() {
        Mode::HelpOverlay => handle_help(key, state),
        Mode::Confirm(kind) => handle_confirm(key, kind, state),
        Mode::Prompt(kind) => handle_prompt(key, kind, state),
        Mode::Insert => handle_insert(key, state),
        Mode::Normal => handle_normal(key, state),
    }
}

fn notify(state: &mut AppState, text: &str) {
    state.apply(Action::Notify { level: NoticeLevel::Info, text: text.to_owned() });
}

fn open_prompt(state: &mut AppState, kind: PromptKind, prefill: String) {
    state.input = prefill;
    state.mode = Mode::Prompt(kind);
}

// ---------------------------------------------------------------------------
// Normal mode
// ---------------------------------------------------------------------------

fn handle_normal(key: KeyEvent, state: &mut AppState) -> KeyAction {
    if let Some(action) = handle_scroll_key(key, state) {
        return action;
    }
    if let Some(action) = handle_tree_key(key, state) {
        return action;
    }
    if let Some(action) = handle_assistant_key(key, state) {
        return action;
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('r') if ctrl => state.apply(Action::Redo),
        KeyCode::Char('u') => state.apply(Action::Undo),

        KeyCode::Char('H') => state.focus = state.focus.prev(),
        KeyCode::Char('L') => state.focus = state.focus.next(),
        KeyCode::Tab => {
            state.side_tab = state.side_tab.next();
            state.side_scroll = 0;
        }
        KeyCode::Char('v') => {
            state.side_tab = SideTab::Versions;
            state.focus = PanelFocus::Side;
        }
        KeyCode::Enter if state.focus == PanelFocus::Side && state.side_tab == SideTab::Versions => {
            let target = state
                .active_file()
                .map(|f| f.id.clone())
                .zip(state.selected_version().map(|v| v.id.clone()));
            if let Some((file_id, version_id)) = target {
                state.apply(Action::Revert { file_id, version_id });
            }
        }

        KeyCode::Char('i') => {
            if state.active_file().is_none() {
                notify(state, "Open a file first");
            } else if state.reviewing() {
                notify(state, "Accept or reject the proposal before editing");
            } else {
                state.focus = PanelFocus::Editor;
                state.mode = Mode::Insert;
            }
        }

        KeyCode::Char('[') => state.prev_change(),
        KeyCode::Char(']') => state.next_change(),

        KeyCode::Char('<') => state.shrink_center_panel(),
        KeyCode::Char('>') => state.grow_center_panel(),

        KeyCode::Char('o') => open_prompt(state, PromptKind::ImportGithub, String::new()),
        KeyCode::Char('O') => open_prompt(state, PromptKind::ImportFolder, String::new()),
        KeyCode::Char('b') => open_prompt(state, PromptKind::NewProject, String::new()),
        KeyCode::Char('P') => state.apply(Action::CloseProject),

        KeyCode::Char('?') => {
            state.help_scroll = 0;
            state.mode = Mode::HelpOverlay;
        }
        KeyCode::Esc => {
            if let Some(id) = state.bench.notices().last().map(|n| n.id) {
                state.apply(Action::DismissNotice { id });
            }
        }
        KeyCode::Char('q') => return KeyAction::Quit,
        _ => {}
    }
    KeyAction::Continue
}

/// Project list and file tree keys. Returns `None` for keys that fall
/// through to the rest of the Normal handler.
fn handle_tree_key(key: KeyEvent, state: &mut AppState) -> Option<KeyAction> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return None;
    }
    let in_project = state.bench.active_project().is_some();

    match key.code {
        KeyCode::Enter | KeyCode::Char('l') if state.focus == PanelFocus::Tree => {
            if !in_project {
                if let Some(project_id) = state.selected_project().map(|p| p.id.clone()) {
                    state.apply(Action::OpenProject { project_id });
                }
            } else if let Some(file_id) = state.selected_node().and_then(TreeNode::file_id) {
                let file_id = file_id.to_owned();
                state.apply(Action::SelectFile { file_id });
                state.focus = PanelFocus::Editor;
            }
            Some(KeyAction::Continue)
        }
        KeyCode::Char('D') => {
            if !in_project {
                if let Some(p) = state.selected_project() {
                    let kind = ConfirmKind::DeleteProject { project_id: p.id.clone(), name: p.name.clone() };
                    state.mode = Mode::Confirm(kind);
                }
            } else if let Some(TreeNode::File { id, path, .. }) = state.selected_node() {
                let kind = ConfirmKind::DeleteFile { file_id: id.clone(), path: path.clone() };
                state.mode = Mode::Confirm(kind);
            }
            Some(KeyAction::Continue)
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Char('r') if !in_project => {
            notify(state, "Open a project first");
            Some(KeyAction::Continue)
        }
        KeyCode::Char('n') => {
            let prefill = state.target_dir();
            open_prompt(state, PromptKind::NewFile, prefill);
            Some(KeyAction::Continue)
        }
        KeyCode::Char('N') => {
            let prefill = state.target_dir();
            open_prompt(state, PromptKind::NewFolder, prefill);
            Some(KeyAction::Continue)
        }
        KeyCode::Char('r') => {
            let target = match state.selected_node() {
                Some(TreeNode::File { id, path, .. }) if state.focus == PanelFocus::Tree => {
                    Some((id.clone(), path.clone()))
                }
                _ => state.active_file().map(|f| (f.id.clone(), f.path.clone())),
            };
            if let Some((file_id, path)) = target {
                open_prompt(state, PromptKind::Rename { file_id }, path);
            }
            Some(KeyAction::Continue)
        }
        _ => None,
    }
}

/// Assistant and review keys that act on the active file or project.
fn handle_assistant_key(key: KeyEvent, state: &mut AppState) -> Option<KeyAction> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return None;
    }
    let needs_file = matches!(
        key.code,
        KeyCode::Char('f' | 'F' | 'a' | 't' | 'y' | 'x')
    );
    let needs_project = matches!(key.code, KeyCode::Char('A' | 'c'));
    if !needs_file && !needs_project {
        return None;
    }
    if needs_project && state.bench.active_project().is_none() {
        notify(state, "Open a project first");
        return Some(KeyAction::Continue);
    }
    let file_id = state.active_file().map(|f| f.id.clone());
    if needs_file && file_id.is_none() {
        notify(state, "Open a file first");
        return Some(KeyAction::Continue);
    }
    let file_id = file_id.unwrap_or_default();

    let action = match key.code {
        KeyCode::Char('f') => {
            open_prompt(state, PromptKind::FixInstruction { file_id }, String::new());
            KeyAction::Continue
        }
        KeyCode::Char('F') => KeyAction::Spawn(Command::FixAll { file_id }),
        KeyCode::Char('a') => {
            state.side_tab = SideTab::Analysis;
            KeyAction::Spawn(Command::Analyze { file_id })
        }
        KeyCode::Char('t') => KeyAction::Spawn(Command::GenerateTests { file_id }),
        KeyCode::Char('y') | KeyCode::Char('x') if !state.reviewing() => {
            notify(state, "No proposal to review");
            KeyAction::Continue
        }
        KeyCode::Char('y') => {
            state.apply(Action::AcceptFix { file_id });
            KeyAction::Continue
        }
        KeyCode::Char('x') => {
            state.apply(Action::RejectFix { file_id });
            KeyAction::Continue
        }
        KeyCode::Char('A') => {
            state.side_tab = SideTab::Analysis;
            KeyAction::Spawn(Command::AnalyzeProject)
        }
        KeyCode::Char('c') => {
            state.side_tab = SideTab::Chat;
            open_prompt(state, PromptKind::Chat, String::new());
            KeyAction::Continue
        }
        _ => KeyAction::Continue,
    };
    Some(action)
}

/// Handles scroll-related keys in Normal mode: j / k / g / G and Ctrl combos.
fn handle_scroll_key(key: KeyEvent, state: &mut AppState) -> Option<KeyAction> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Char('j') | KeyCode::Down => state.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => state.scroll_up(1),
        KeyCode::Char('g') => state.scroll_top(),
        KeyCode::Char('G') => state.scroll_bottom(),
        KeyCode::Char('d') if ctrl => state.half_page_down(),
        KeyCode::Char('u') if ctrl => state.half_page_up(),
        KeyCode::Char('f') if ctrl => state.full_page_down(),
        KeyCode::Char('b') if ctrl => state.full_page_up(),
        _ => return None,
    }
    Some(KeyAction::Continue)
}

// ---------------------------------------------------------------------------
// Insert mode
// ---------------------------------------------------------------------------

/// Edits the active file. Every keystroke that changes the text becomes one
/// `Edit` action, so undo steps back one keystroke at a time.
fn handle_insert(key: KeyEvent, state: &mut AppState) -> KeyAction {
    let Some(content) = state.active_file().map(|f| f.content.clone()) else {
        state.mode = Mode::Normal;
        return KeyAction::Continue;
    };
    // A fix can land while typing; the proposal takes over the panel.
    if state.reviewing() {
        state.mode = Mode::Normal;
        return KeyAction::Continue;
    }

    let mut cursor = state.cursor;
    let edited = match key.code {
        KeyCode::Esc => {
            state.mode = Mode::Normal;
            return KeyAction::Continue;
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(cursor.insert_char(&content, c))
        }
        KeyCode::Enter => Some(cursor.insert_newline(&content)),
        KeyCode::Tab => Some(cursor.insert_tab(&content)),
        KeyCode::Backspace => cursor.backspace(&content),
        KeyCode::Delete => cursor.delete(&content),
        KeyCode::Left => {
            cursor.move_left(&content);
            None
        }
        KeyCode::Right => {
            cursor.move_right(&content);
            None
        }
        KeyCode::Up => {
            cursor.move_up(&content, 1);
            None
        }
        KeyCode::Down => {
            cursor.move_down(&content, 1);
            None
        }
        KeyCode::Home => {
            cursor.line_start();
            None
        }
        KeyCode::End => {
            cursor.line_end(&content);
            None
        }
        _ => None,
    };

    if let Some(content) = edited {
        state.apply(Action::Edit { content });
    }
    state.cursor = cursor;
    state.follow_cursor();
    KeyAction::Continue
}

// ---------------------------------------------------------------------------
// Prompt mode
// ---------------------------------------------------------------------------

fn handle_prompt(key: KeyEvent, kind: PromptKind, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Esc => {
            state.input.clear();
            state.mode = Mode::Normal;
            KeyAction::Continue
        }
        KeyCode::Backspace => {
            state.input.pop();
            KeyAction::Continue
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            state.input.push(c);
            KeyAction::Continue
        }
        KeyCode::Enter => {
            let text = std::mem::take(&mut state.input).trim().to_owned();
            state.mode = Mode::Normal;
            if text.is_empty() {
                return KeyAction::Continue;
            }
            submit_prompt(kind, text, state)
        }
        _ => KeyAction::Continue,
    }
}

fn submit_prompt(kind: PromptKind, text: String, state: &mut AppState) -> KeyAction {
    match kind {
        PromptKind::FixInstruction { file_id } => {
            KeyAction::Spawn(Command::Fix { file_id, instruction: text })
        }
        PromptKind::Chat => KeyAction::Spawn(Command::Chat { text }),
        PromptKind::ImportGithub => KeyAction::Spawn(Command::ImportGithub { url: text, name: None }),
        PromptKind::ImportFolder => {
            KeyAction::Spawn(Command::ImportFolder { path: PathBuf::from(text), name: None })
        }
        PromptKind::NewFile => {
            state.apply(Action::CreateFile { path: text, content: String::new() });
            state.focus = PanelFocus::Editor;
            KeyAction::Continue
        }
        PromptKind::NewFolder => {
            state.apply(Action::CreateFolder { path: text });
            KeyAction::Continue
        }
        PromptKind::Rename { file_id } => {
            state.apply(Action::RenameFile { file_id, path: text });
            KeyAction::Continue
        }
        PromptKind::NewProject => {
            state.apply(Action::CreateProject(blank_project(&text)));
            KeyAction::Continue
        }
    }
}

// ---------------------------------------------------------------------------
// Confirm mode
// ---------------------------------------------------------------------------

fn handle_confirm(key: KeyEvent, kind: ConfirmKind, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            state.mode = Mode::Normal;
            match kind {
                ConfirmKind::DeleteFile { file_id, .. } => state.apply(Action::DeleteFile { file_id }),
                ConfirmKind::DeleteProject { project_id, .. } => {
                    state.apply(Action::DeleteProject { project_id })
                }
            }
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => state.mode = Mode::Normal,
        _ => {}
    }
    KeyAction::Continue
}

// ---------------------------------------------------------------------------
// HelpOverlay mode
// ---------------------------------------------------------------------------

fn handle_help(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('j') => state.help_scroll = state.help_scroll.saturating_add(1),
        KeyCode::Char('k') => state.help_scroll = state.help_scroll.saturating_sub(1),
        KeyCode::Char('g') => state.help_scroll = 0,
        KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q') => state.mode = Mode::Normal,
        _ => {}
    }
    KeyAction::Continue
}

// ---------------------------------------------------------------------------
// Mouse events
// ---------------------------------------------------------------------------

/// Left click focuses a panel; the wheel scrolls the focused panel by 3 rows.
pub fn handle_mouse(mouse: MouseEvent, state: &mut AppState) -> KeyAction {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) if state.mode == Mode::Normal => {
            let pos = Position { x: mouse.column, y: mouse.row };
            let [left, center, right] = state.panel_rects;
            // Zero-width rects belong to panels hidden on narrow terminals.
            if left.width > 0 && left.contains(pos) {
                state.focus = PanelFocus::Tree;
            } else if center.width > 0 && center.contains(pos) {
                state.focus = PanelFocus::Editor;
            } else if right.width > 0 && right.contains(pos) {
                state.focus = PanelFocus::Side;
            }
        }
        MouseEventKind::ScrollUp => {
            if state.mode == Mode::HelpOverlay {
                state.help_scroll = state.help_scroll.saturating_sub(3);
            } else {
                state.scroll_up(3);
            }
        }
        MouseEventKind::ScrollDown => {
            if state.mode == Mode::HelpOverlay {
                state.help_scroll = state.help_scroll.saturating_add(3);
            } else {
                state.scroll_down(3);
            }
        }
        _ => {}
    }
    KeyAction::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use revbench_core::types::{FileRecord, Project, ProjectSource};
    use revbench_core::{Limits, Workbench};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(state: &mut AppState, text: &str) {
        for c in text.chars() {
            handle_key(press(KeyCode::Char(c)), state);
        }
    }

    fn open_state() -> AppState {
        let project = Project::new(
            "demo",
            ProjectSource::Blank,
            vec![FileRecord::new("src/lib.rs", "fn a() {}")],
        );
        let mut state = AppState::new(Workbench::new(Vec::new(), Limits::default()));
        state.apply(Action::CreateProject(project));
        state
    }

    #[test]
    fn insert_mode_edits_and_undo_restores() {
        let mut state = open_state();
        handle_key(press(KeyCode::Char('i')), &mut state);
        assert_eq!(state.mode, Mode::Insert);
        type_str(&mut state, "x");
        assert_eq!(state.active_file().unwrap().content, "xfn a() {}");

        handle_key(press(KeyCode::Esc), &mut state);
        handle_key(press(KeyCode::Char('u')), &mut state);
        assert_eq!(state.active_file().unwrap().content, "fn a() {}");
    }

    #[test]
    fn new_file_prompt_is_prefilled_and_creates_the_file() {
        let mut state = open_state();
        handle_key(press(KeyCode::Char('n')), &mut state);
        assert_eq!(state.input, "src/");
        type_str(&mut state, "b.rs");
        handle_key(press(KeyCode::Enter), &mut state);

        assert_eq!(state.mode, Mode::Normal);
        let project = state.bench.active_project().unwrap();
        assert!(project.files.iter().any(|f| f.path == "src/b.rs"));
    }

    #[test]
    fn fix_prompt_spawns_a_fix_command() {
        let mut state = open_state();
        let file_id = state.bench.active_file_id().unwrap().to_owned();
        handle_key(press(KeyCode::Char('f')), &mut state);
        type_str(&mut state, "add docs");
        let action = handle_key(press(KeyCode::Enter), &mut state);
        assert_eq!(action, KeyAction::Spawn(Command::Fix { file_id, instruction: "add docs".into() }));
    }

    #[test]
    fn empty_prompt_submits_nothing() {
        let mut state = open_state();
        handle_key(press(KeyCode::Char('c')), &mut state);
        assert_eq!(state.side_tab, SideTab::Chat);
        assert_eq!(handle_key(press(KeyCode::Enter), &mut state), KeyAction::Continue);
        assert_eq!(state.mode, Mode::Normal);
    }

    #[test]
    fn delete_asks_for_confirmation() {
        let mut state = open_state();
        let file = state.tree.iter().position(|n| n.file_id().is_some()).unwrap();
        state.tree_state.select(Some(file));
        handle_key(press(KeyCode::Char('D')), &mut state);
        assert!(matches!(state.mode, Mode::Confirm(ConfirmKind::DeleteFile { .. })));

        handle_key(press(KeyCode::Char('n')), &mut state);
        assert_eq!(state.bench.active_project().unwrap().files.len(), 1);

        handle_key(press(KeyCode::Char('D')), &mut state);
        handle_key(press(KeyCode::Char('y')), &mut state);
        assert!(state.bench.active_project().unwrap().files.is_empty());
    }

    #[test]
    fn blocking_error_swallows_one_key() {
        let mut state = open_state();
        state.blocking_error = Some("boom".into());
        assert_eq!(handle_key(press(KeyCode::Char('q')), &mut state), KeyAction::Continue);
        assert!(state.blocking_error.is_none());
        assert_eq!(handle_key(press(KeyCode::Char('q')), &mut state), KeyAction::Quit);
    }

    #[test]
    fn project_list_enter_opens_the_project() {
        let mut state = open_state();
        state.apply(Action::CloseProject);
        assert!(state.bench.active_project().is_none());
        handle_key(press(KeyCode::Enter), &mut state);
        assert!(state.bench.active_project().is_some());
    }
}
