//! UI rendering for revbench.
//!
//! `render()` is the single entry point called from the event loop's
//! `terminal.draw()` closure. Layout arithmetic lives in `layout.rs`; each
//! panel has its own module, and modal boxes are drawn last so they sit on top.

mod dialog;
mod layout;
pub mod editor_view;
pub mod file_tree;
pub mod help;
pub mod keybindings;
pub mod side_panel;

use ratatui::{Frame, style::Style, widgets::Block};

use crate::app::{AppState, Mode};
use crate::theme::Theme;
use layout::{compute_layout, inner_rect, render_status_bar};

/// Renders one complete frame.
///
/// Viewport heights and panel rects are written back into `state` so the next
/// keypress can compute page distances and mouse hit tests.
pub fn render(frame: &mut Frame, state: &mut AppState, theme: &Theme) {
    frame.render_widget(Block::new().style(Style::default().bg(theme.background)), frame.area());
    let [left, center, right, status_bar] = compute_layout(frame, state);

    state.tree_viewport_height = inner_rect(left).height;
    state.editor_viewport_height = inner_rect(center).height;
    state.panel_rects = [left, center, right];

    if left.width > 0 {
        file_tree::render_left_panel(frame, left, state, theme);
    }
    if center.width > 0 {
        editor_view::render_editor(frame, center, state, theme);
    }
    if right.width > 0 {
        side_panel::render_side_panel(frame, right, state, theme);
    }

    render_status_bar(frame, status_bar, state, theme);

    if state.mode == Mode::HelpOverlay {
        help::render_help_overlay(frame, theme, state.help_scroll);
    }
    dialog::render_dialogs(frame, state, theme);
}
