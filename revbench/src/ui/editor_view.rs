//! Centre panel: the active file, or a side-by-side review of its staged
//! proposal.
//!
//! Both modes use a List with manual virtual scrolling: only the rows in
//! `editor_scroll..editor_scroll + viewport` are materialised per frame.
//! Until the render thread answers for the current content, plain unstyled
//! lines are shown.

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, Paragraph},
};
use revbench_core::language::display_name;
use revbench_core::types::FileRecord;

use crate::app::{AppState, Mode, PanelFocus};
use crate::render::worker::gutter_width;
use crate::theme::Theme;
use crate::ui::layout::{inner_rect, panel_block};

pub fn render_editor(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let is_focused = state.focus == PanelFocus::Editor;
    let inner = inner_rect(area);

    let Some(file) = state.active_file() else {
        let hint = if state.bench.active_project().is_some() {
            "Select a file in the tree (Enter)."
        } else {
            "Open a project (Enter) or import one (o / O)."
        };
        frame.render_widget(panel_block("Editor", is_focused, theme), area);
        frame.render_widget(Paragraph::new(hint).style(Style::default().fg(theme.gutter)), inner);
        return;
    };

    if file.staged_content.is_some() {
        render_review(frame, area, state, theme);
    } else {
        render_source(frame, area, state, theme);
    }
}

fn plain_lines(content: &str) -> Vec<Line<'static>> {
    let width = gutter_width(content.lines().count());
    content
        .lines()
        .enumerate()
        .map(|(i, text)| Line::raw(format!("{:>width$} {text}", i + 1)))
        .collect()
}

fn window(lines: &[Line<'static>], start: usize, height: usize) -> Vec<ListItem<'static>> {
    let start = start.min(lines.len().saturating_sub(1));
    let end = (start + height).min(lines.len());
    lines[start..end].iter().map(|l| ListItem::new(l.clone())).collect()
}

fn source_title(file: &FileRecord) -> String {
    format!("{} · {}", file.path, display_name(&file.language))
}

fn render_source(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let is_focused = state.focus == PanelFocus::Editor;
    let inner = inner_rect(area);
    let height = inner.height as usize;
    let Some(file) = state.active_file() else {
        return;
    };

    let mut title = vec![Span::raw(source_title(file))];
    if state.mode == Mode::Insert {
        title.push(Span::styled(" [insert]", Style::default().fg(theme.status_mode_insert)));
    }
    let width = gutter_width(file.content.lines().count());

    let fallback;
    let lines: &[Line<'static>] = match state.fresh_view() {
        Some(view) => &view.left,
        None => {
            fallback = plain_lines(&file.content);
            &fallback
        }
    };
    let items = window(lines, state.editor_scroll, height);
    let cursor = state.cursor;

    frame.render_widget(panel_block(Line::from(title), is_focused, theme), area);
    frame.render_widget(List::new(items), inner);

    if state.mode == Mode::Insert && cursor.row >= state.editor_scroll {
        let y = cursor.row - state.editor_scroll;
        let x = width + 1 + cursor.col;
        if y < height && x < inner.width as usize {
            frame.set_cursor_position(Position { x: inner.x + x as u16, y: inner.y + y as u16 });
        }
    }
}

fn render_review(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let is_focused = state.focus == PanelFocus::Editor;
    let inner = inner_rect(area);
    let Some(file) = state.active_file() else {
        return;
    };

    let view = state.fresh_view();
    let mut title = vec![
        Span::styled("Review ", Style::default().fg(theme.fix_staged).add_modifier(Modifier::BOLD)),
        Span::raw(file.path.clone()),
    ];
    if let Some(stats) = view.and_then(|v| v.stats) {
        title.push(Span::styled(format!("  +{}", stats.added), Style::default().fg(theme.diff_added)));
        title.push(Span::styled(format!(" -{}", stats.removed), Style::default().fg(theme.diff_removed)));
    }
    title.push(Span::styled("  y accept · x reject", Style::default().fg(theme.gutter)));
    frame.render_widget(panel_block(Line::from(title), is_focused, theme), area);

    let [header, body] = inner.layout(&Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]));
    let [head_left, head_right] =
        header.layout(&Layout::horizontal([Constraint::Fill(1), Constraint::Fill(1)]));
    let [left, right] = body.layout(&Layout::horizontal([Constraint::Fill(1), Constraint::Fill(1)]));

    let head = Style::default().fg(theme.diff_context).add_modifier(Modifier::BOLD);
    frame.render_widget(Paragraph::new("Current").style(head), head_left);
    frame.render_widget(Paragraph::new("Proposed").style(head), head_right);

    let Some(view) = view else {
        frame.render_widget(Paragraph::new("Computing diff…").style(Style::default().fg(theme.gutter)), body);
        return;
    };
    let height = body.height as usize;
    frame.render_widget(List::new(window(&view.left, state.editor_scroll, height)), left);
    frame.render_widget(List::new(window(&view.right, state.editor_scroll, height)), right);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_lines_match_rendered_gutter() {
        let lines = plain_lines("a\nb\n");
        assert_eq!(lines.len(), 2);
        let text: String = lines[1].spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "  2 b");
    }

    #[test]
    fn window_clamps_past_the_end() {
        let lines = plain_lines("a\nb\nc");
        assert_eq!(window(&lines, 10, 5).len(), 1);
        assert_eq!(window(&lines, 0, 2).len(), 2);
        assert!(window(&[], 0, 5).is_empty());
    }
}
