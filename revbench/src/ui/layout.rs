//! Responsive 3-panel layout.
//!
//! At `>= 120` columns the tree, editor and side panels are all visible with
//! widths from `AppState.left_pct / center_pct / right_pct`. Narrower
//! terminals show only the focused panel.
//!
//! `Spacing::Overlap(1)` with `MergeStrategy::Fuzzy` borders lets adjacent
//! panels share a border column with merged junction glyphs.

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Margin, Rect, Spacing},
    style::{Modifier, Style},
    symbols::merge::MergeStrategy,
    text::{Line, Span},
    widgets::{Block, BorderType, Paragraph},
};
use revbench_core::staging::RequestKind;
use revbench_core::workbench::NoticeLevel;

use crate::app::{AppState, Mode, PanelFocus};
use crate::theme::Theme;

/// Returns `[left, center, right, status_bar]` for the current frame.
pub fn compute_layout(frame: &Frame, state: &AppState) -> [Rect; 4] {
    let term_width = frame.area().width;

    let [main_area, status_bar] =
        frame.area().layout(&Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]));

    let widths = if term_width >= 120 {
        [
            Constraint::Percentage(state.left_pct),
            Constraint::Percentage(state.center_pct),
            Constraint::Percentage(state.right_pct),
        ]
    } else {
        match state.focus {
            PanelFocus::Tree => [Constraint::Fill(1), Constraint::Length(0), Constraint::Length(0)],
            PanelFocus::Editor => [Constraint::Length(0), Constraint::Fill(1), Constraint::Length(0)],
            PanelFocus::Side => [Constraint::Length(0), Constraint::Length(0), Constraint::Fill(1)],
        }
    };
    let horizontal = Layout::horizontal(widths).spacing(Spacing::Overlap(1));

    let [left, center, right] = main_area.layout(&horizontal);

    [left, center, right, status_bar]
}

/// Inner `Rect` of a bordered panel.
pub fn inner_rect(area: Rect) -> Rect {
    area.inner(Margin { vertical: 1, horizontal: 1 })
}

/// Bordered panel block: thick and highlighted when focused. `Fuzzy` merging
/// is needed because `Exact` mis-joins thick and plain borders.
pub fn panel_block<'a>(title: impl Into<Line<'a>>, is_focused: bool, theme: &Theme) -> Block<'a> {
    let border_style = if is_focused {
        Style::default().fg(theme.border_active)
    } else {
        Style::default().fg(theme.border_inactive)
    };
    let border_type = if is_focused { BorderType::Thick } else { BorderType::Plain };

    Block::bordered()
        .title(title)
        .border_type(border_type)
        .border_style(border_style)
        .merge_borders(MergeStrategy::Fuzzy)
}

/// Renders the 1-row status bar: mode, location, undo position, in-flight
/// requests, and the newest notice.
pub fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let (mode_text, mode_fg) = match state.mode {
        Mode::Insert => (" INSERT ", theme.status_mode_insert),
        Mode::Prompt(_) => (" INPUT ", theme.status_mode_insert),
        Mode::Normal | Mode::Confirm(_) | Mode::HelpOverlay => (" NORMAL ", theme.status_mode_normal),
    };

    let mut spans = vec![Span::styled(
        mode_text,
        Style::default().fg(mode_fg).add_modifier(Modifier::BOLD),
    )];

    match state.bench.active_project() {
        Some(project) => {
            spans.push(Span::raw(format!(" {} ", project.name)));
            if let Some(file) = state.active_file() {
                spans.push(Span::raw(format!("› {} ", file.path)));
            }
        }
        None => spans.push(Span::raw(" projects ")),
    }

    if let Some(history) = state.bench.history() {
        spans.push(Span::styled(
            format!(" undo {}/{} ", history.pointer() + 1, history.len()),
            Style::default().add_modifier(Modifier::DIM),
        ));
    }

    let pending = pending_labels(state);
    if !pending.is_empty() {
        spans.push(Span::styled(
            format!(" ⟳ {} ", pending.join(", ")),
            Style::default().fg(theme.fix_pending),
        ));
    }
    if let Some(label) = &state.importing {
        spans.push(Span::styled(format!(" ⟳ {label} "), Style::default().fg(theme.fix_pending)));
    }

    if let Some(notice) = state.bench.notices().last() {
        let color = match notice.level {
            NoticeLevel::Info => theme.notice_info,
            NoticeLevel::Error => theme.notice_error,
        };
        spans.push(Span::styled(format!(" {} ", notice.text), Style::default().fg(color)));
    } else {
        spans.push(Span::styled(" ? help ", Style::default().add_modifier(Modifier::DIM)));
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans))
            .style(Style::default().bg(theme.status_bar_bg).fg(theme.status_bar_fg)),
        area,
    );
}

/// Short names of requests in flight for the active file and project.
fn pending_labels(state: &AppState) -> Vec<&'static str> {
    let mut labels = Vec::new();
    if let Some(file_id) = state.bench.active_file_id() {
        for (kind, label) in [
            (RequestKind::Fix, "fixing"),
            (RequestKind::Analysis, "analyzing"),
            (RequestKind::Tests, "writing tests"),
        ] {
            if state.bench.is_pending(file_id, kind) {
                labels.push(label);
            }
        }
    }
    if state.bench.is_project_pending(RequestKind::ProjectAnalysis) {
        labels.push("project analysis");
    }
    if state.bench.is_project_pending(RequestKind::Chat) {
        labels.push("chat");
    }
    labels
}
