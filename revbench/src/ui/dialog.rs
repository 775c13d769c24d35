//! Modal boxes: the prompt input, yes/no confirmations, import progress, and
//! blocking import errors.

use ratatui::{
    Frame,
    layout::{Constraint, Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Clear, Paragraph, Wrap},
};

use crate::app::{AppState, ConfirmKind, Mode};
use crate::theme::Theme;

fn modal(frame: &mut Frame, width: u16, height: u16) -> Rect {
    let area = frame
        .area()
        .centered(Constraint::Length(width.min(frame.area().width)), Constraint::Length(height));
    frame.render_widget(Clear, area);
    area
}

/// Draws whichever modal the state calls for, if any.
pub fn render_dialogs(frame: &mut Frame, state: &AppState, theme: &Theme) {
    if let Some(message) = &state.blocking_error {
        render_error(frame, message, theme);
        return;
    }
    if let Some(label) = &state.importing {
        let area = modal(frame, 60, 3);
        let block = Block::bordered()
            .title(" Import ")
            .border_style(Style::default().fg(theme.border_active));
        frame.render_widget(Paragraph::new(format!("{label}…")).block(block), area);
        return;
    }
    match &state.mode {
        Mode::Prompt(kind) => {
            let area = modal(frame, 70, 3);
            let block = Block::bordered()
                .title(kind.title())
                .title_bottom(" Enter submit · Esc cancel ")
                .border_style(Style::default().fg(theme.status_mode_insert));
            let inner = block.inner(area);
            // Show the tail of long input.
            let visible = inner.width.saturating_sub(1) as usize;
            let chars = state.input.chars().count();
            let shown: String = state.input.chars().skip(chars.saturating_sub(visible)).collect();
            let cursor_x = shown.chars().count() as u16;
            frame.render_widget(Paragraph::new(shown).block(block), area);
            frame.set_cursor_position(Position { x: inner.x + cursor_x, y: inner.y });
        }
        Mode::Confirm(kind) => {
            let question = match kind {
                ConfirmKind::DeleteFile { path, .. } => format!("Delete {path}?"),
                ConfirmKind::DeleteProject { name, .. } => format!("Delete project {name} and all its files?"),
            };
            let area = modal(frame, 60, 4);
            let block = Block::bordered()
                .title(" Confirm ")
                .border_style(Style::default().fg(theme.notice_error));
            let text = vec![
                Line::raw(question),
                Line::from(Span::styled("y: yes   n / Esc: no", Style::default().fg(theme.gutter))),
            ];
            frame.render_widget(Paragraph::new(text).block(block), area);
        }
        _ => {}
    }
}

fn render_error(frame: &mut Frame, message: &str, theme: &Theme) {
    let area = modal(frame, 70, 7);
    let block = Block::bordered()
        .title(Span::styled(" Import failed ", Style::default().add_modifier(Modifier::BOLD)))
        .title_bottom(" any key to dismiss ")
        .border_style(Style::default().fg(theme.notice_error));
    frame.render_widget(
        Paragraph::new(message.to_owned()).block(block).wrap(Wrap { trim: true }),
        area,
    );
}
