//! Left panel: the project list, or the active project's file tree.
//!
//! Tree rows are indented by depth. Files carry a review badge (`…` while a
//! fix is in flight, `◆` while a proposal is staged) and a dot colored by the
//! cached analysis verdict.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem},
};
use revbench_core::staging::FixStatus;
use revbench_core::tree::TreeNode;
use revbench_core::types::{Project, ProjectSource};

use crate::app::{AppState, PanelFocus};
use crate::theme::Theme;
use crate::ui::layout::panel_block;

pub fn render_left_panel(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    if state.bench.active_project().is_some() {
        render_file_tree(frame, area, state, theme);
    } else {
        render_project_list(frame, area, state, theme);
    }
}

fn render_project_list(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let is_focused = state.focus == PanelFocus::Tree;
    let count = state.bench.projects().len();
    let block = panel_block(format!("Projects ({count})"), is_focused, theme);

    let items: Vec<ListItem> = if count == 0 {
        vec![
            ListItem::new(Line::raw("No projects yet.")),
            ListItem::new(Line::raw("o  import GitHub repo")),
            ListItem::new(Line::raw("O  import local folder")),
            ListItem::new(Line::raw("b  blank project")),
        ]
    } else {
        state.bench.projects().iter().map(|p| project_item(p, theme)).collect()
    };

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().fg(theme.border_active).add_modifier(Modifier::BOLD))
        .highlight_symbol("▶ ");

    frame.render_stateful_widget(list, area, &mut state.projects_state);
}

fn project_item(project: &Project, theme: &Theme) -> ListItem<'static> {
    let source = match &project.source {
        ProjectSource::GitHub { owner, repo, .. } => format!("{owner}/{repo}"),
        ProjectSource::Folder { path } => path.clone(),
        ProjectSource::Blank => "blank".to_owned(),
    };
    ListItem::new(vec![
        Line::from(Span::styled(project.name.clone(), Style::default().add_modifier(Modifier::BOLD))),
        Line::from(Span::styled(
            format!("  {source} · {} files", project.files.len()),
            Style::default().fg(theme.gutter),
        )),
    ])
}

fn render_file_tree(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let is_focused = state.focus == PanelFocus::Tree;
    let title = state
        .bench
        .active_project()
        .map(|p| format!("{} ({})", p.name, p.files.len()))
        .unwrap_or_default();
    let block = panel_block(title, is_focused, theme);

    let active = state.bench.active_file_id();
    let items: Vec<ListItem> = if state.tree.is_empty() {
        vec![ListItem::new(Line::raw("Empty project. n: new file"))]
    } else {
        state
            .tree
            .iter()
            .map(|node| tree_item(node, state, active, theme))
            .collect()
    };

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    frame.render_stateful_widget(list, area, &mut state.tree_state);
}

fn tree_item(node: &TreeNode, state: &AppState, active: Option<&str>, theme: &Theme) -> ListItem<'static> {
    let indent = "  ".repeat(node.depth());
    match node {
        TreeNode::Directory { name, .. } => ListItem::new(Line::from(vec![
            Span::raw(indent),
            Span::styled(format!("▾ {name}/"), Style::default().fg(theme.directory)),
        ])),
        TreeNode::File { id, name, .. } => {
            let mut style = Style::default();
            if active == Some(id.as_str()) {
                style = style.add_modifier(Modifier::BOLD);
            }
            let mut spans = vec![Span::raw(indent), Span::raw("  "), Span::styled(name.clone(), style)];

            let status = state.bench.fix_status(id);
            if let Some(color) = theme.fix_status(status) {
                let badge = match status {
                    FixStatus::Fixing => " …",
                    _ => " ◆",
                };
                spans.push(Span::styled(badge, Style::default().fg(color)));
            }
            let verdict = state
                .bench
                .active_project()
                .and_then(|p| p.file(id))
                .and_then(|f| f.analysis.as_ref())
                .map(|a| a.status);
            if let Some(verdict) = verdict {
                spans.push(Span::styled(" ●", Style::default().fg(theme.safety(verdict))));
            }
            ListItem::new(Line::from(spans))
        }
    }
}
