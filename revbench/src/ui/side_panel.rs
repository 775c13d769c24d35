//! Right panel: analysis results, project chat, and the version archive of
//! the active file, one tab at a time.

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{List, ListItem, Paragraph, Tabs, Wrap},
};
use revbench_core::staging::RequestKind;
use revbench_core::types::{Analysis, ChatRole, Issue, ProjectAnalysis};

use crate::app::{AppState, PanelFocus, SideTab};
use crate::theme::Theme;
use crate::ui::layout::{inner_rect, panel_block};

pub fn render_side_panel(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let is_focused = state.focus == PanelFocus::Side;
    let inner = inner_rect(area);
    frame.render_widget(panel_block("Assistant", is_focused, theme), area);

    let [tabs_area, body] = inner.layout(&Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]));
    let selected = SideTab::ALL.iter().position(|t| *t == state.side_tab).unwrap_or(0);
    let tabs = Tabs::new(SideTab::ALL.iter().map(|t| t.title()))
        .select(selected)
        .highlight_style(Style::default().fg(theme.border_active).add_modifier(Modifier::BOLD));
    frame.render_widget(tabs, tabs_area);
    state.side_viewport_height = body.height;

    match state.side_tab {
        SideTab::Analysis => {
            let text = analysis_text(state, theme);
            frame.render_widget(
                Paragraph::new(text).wrap(Wrap { trim: false }).scroll((state.side_scroll, 0)),
                body,
            );
        }
        SideTab::Chat => {
            let text = chat_text(state, theme);
            frame.render_widget(
                Paragraph::new(text).wrap(Wrap { trim: false }).scroll((state.side_scroll, 0)),
                body,
            );
        }
        SideTab::Versions => render_versions(frame, body, state, theme),
    }
}

fn heading(text: impl Into<String>) -> Line<'static> {
    Line::from(Span::styled(text.into(), Style::default().add_modifier(Modifier::BOLD)))
}

fn dim(text: impl Into<String>, theme: &Theme) -> Line<'static> {
    Line::from(Span::styled(text.into(), Style::default().fg(theme.gutter)))
}

fn analysis_text(state: &AppState, theme: &Theme) -> Text<'static> {
    let mut lines = Vec::new();

    if let Some(file) = state.active_file() {
        lines.push(heading(file.path.clone()));
        if state.bench.is_pending(&file.id, RequestKind::Analysis) {
            lines.push(dim("Analyzing…", theme));
        }
        match &file.analysis {
            Some(analysis) => push_file_analysis(&mut lines, analysis, theme),
            None => lines.push(dim("No analysis yet. a: analyze file", theme)),
        }
        lines.push(Line::raw(""));
    }

    if let Some(project) = state.bench.active_project() {
        lines.push(heading(format!("Project · {}", project.name)));
        if state.bench.is_project_pending(RequestKind::ProjectAnalysis) {
            lines.push(dim("Analyzing project…", theme));
        }
        match &project.analysis {
            Some(analysis) => push_project_analysis(&mut lines, analysis, theme),
            None => lines.push(dim("No project analysis yet. A: analyze project", theme)),
        }
    } else {
        lines.push(dim("Open a project to see analyses.", theme));
    }

    Text::from(lines)
}

fn push_file_analysis(lines: &mut Vec<Line<'static>>, analysis: &Analysis, theme: &Theme) {
    lines.push(Line::from(vec![
        Span::styled(
            format!(" {} ", analysis.status.label()),
            Style::default().fg(theme.safety(analysis.status)).add_modifier(Modifier::REVERSED | Modifier::BOLD),
        ),
        Span::raw(format!(
            "  quality {}  security {}  performance {}",
            analysis.quality_score, analysis.security_score, analysis.performance_score
        )),
    ]));
    if !analysis.summary.is_empty() {
        lines.push(Line::raw(analysis.summary.clone()));
    }
    if analysis.issues.is_empty() {
        lines.push(dim("No issues found.", theme));
    } else {
        lines.push(dim(format!("{} issue(s) · F: fix all", analysis.issues.len()), theme));
    }
    for issue in &analysis.issues {
        push_issue(lines, issue, theme);
    }
}

fn push_project_analysis(lines: &mut Vec<Line<'static>>, analysis: &ProjectAnalysis, theme: &Theme) {
    lines.push(Line::raw(format!("Architecture score {}", analysis.architecture_score)));
    if !analysis.summary.is_empty() {
        lines.push(Line::raw(analysis.summary.clone()));
    }
    for highlight in &analysis.highlights {
        lines.push(Line::from(vec![
            Span::styled("+ ", Style::default().fg(theme.status_safe)),
            Span::raw(highlight.clone()),
        ]));
    }
    for issue in &analysis.issues {
        push_issue(lines, issue, theme);
    }
}

fn push_issue(lines: &mut Vec<Line<'static>>, issue: &Issue, theme: &Theme) {
    let mut head = vec![
        Span::styled(
            format!("[{}] ", issue.severity.label()),
            Style::default().fg(theme.severity(issue.severity)).add_modifier(Modifier::BOLD),
        ),
        Span::raw(issue.title.clone()),
    ];
    if let Some(line) = issue.line {
        head.push(Span::styled(format!("  L{line}"), Style::default().fg(theme.gutter)));
    }
    lines.push(Line::from(head));
    if !issue.description.is_empty() {
        lines.push(Line::raw(format!("  {}", issue.description)));
    }
    if let Some(suggestion) = &issue.suggestion {
        lines.push(dim(format!("  → {suggestion}"), theme));
    }
}

fn chat_text(state: &AppState, theme: &Theme) -> Text<'static> {
    let Some(project) = state.bench.active_project() else {
        return Text::from(dim("Open a project to chat about it.", theme));
    };
    let mut lines = Vec::new();
    if project.chat.is_empty() {
        lines.push(dim("No messages yet. c: ask a question", theme));
    }
    for message in &project.chat {
        let (who, color) = match message.role {
            ChatRole::User => ("you", theme.chat_user),
            ChatRole::Assistant => ("assistant", theme.chat_assistant),
        };
        lines.push(Line::from(vec![
            Span::styled(who, Style::default().fg(color).add_modifier(Modifier::BOLD)),
            Span::styled(
                format!("  {}", message.created_at.format("%H:%M")),
                Style::default().fg(theme.gutter),
            ),
        ]));
        lines.extend(message.text.lines().map(|l| Line::raw(l.to_owned())));
        lines.push(Line::raw(""));
    }
    if state.bench.is_project_pending(RequestKind::Chat) {
        lines.push(dim("Thinking…", theme));
    }
    Text::from(lines)
}

fn render_versions(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let items: Vec<ListItem> = match state.active_file() {
        None => vec![ListItem::new(dim("No file selected.", theme))],
        Some(file) if file.versions.is_empty() => {
            vec![ListItem::new(dim("No earlier versions. Accepting a fix archives one.", theme))]
        }
        Some(_) => state
            .versions()
            .into_iter()
            .map(|v| {
                ListItem::new(vec![
                    Line::raw(v.description.clone()),
                    dim(format!("  {} lines · Enter: revert", v.content.lines().count()), theme),
                ])
            })
            .collect(),
    };
    let list = List::new(items)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("› ");
    frame.render_stateful_widget(list, area, &mut state.versions_state);
}
