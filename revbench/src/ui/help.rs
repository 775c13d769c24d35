//! Help overlay: a centred modal drawn over the panels. `Clear` erases the
//! background first so the modal shows in the same `terminal.draw()` pass.

use ratatui::{
    Frame,
    layout::Constraint,
    style::Style,
    text::{Line, Text},
    widgets::{Block, Clear, Paragraph, Wrap},
};

use crate::theme::Theme;

/// Skipped on terminals narrower than 60 columns.
pub fn render_help_overlay(frame: &mut Frame, theme: &Theme, help_scroll: u16) {
    if frame.area().width < 60 {
        return;
    }

    let overlay_area = frame
        .area()
        .centered(Constraint::Percentage(80), Constraint::Percentage(80));

    frame.render_widget(Clear, overlay_area);

    let block = Block::bordered()
        .title(" Help · j/k scroll, ? or Esc to dismiss ")
        .border_style(Style::default().fg(theme.border_active));

    frame.render_widget(
        Paragraph::new(build_help_text())
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((help_scroll, 0)),
        overlay_area,
    );
}

fn build_help_text() -> Text<'static> {
    Text::from(vec![
        Line::from("Navigation"),
        Line::from("  j / k         Move down / up"),
        Line::from("  g / G         Jump to top / bottom"),
        Line::from("  Ctrl-d / u    Half page down / up"),
        Line::from("  Ctrl-f / b    Full page down / up"),
        Line::from("  H / L         Focus previous / next panel"),
        Line::from("  Tab           Next assistant tab (Analysis, Chat, Versions)"),
        Line::from("  < / >         Shrink / grow the editor panel"),
        Line::from(""),
        Line::from("Projects"),
        Line::from("  Enter         Open the selected project"),
        Line::from("  o / O         Import a GitHub repository / local folder"),
        Line::from("  b             New blank project"),
        Line::from("  D             Delete the selected project"),
        Line::from("  P             Back to the project list"),
        Line::from(""),
        Line::from("Files"),
        Line::from("  Enter / l     Open the selected file"),
        Line::from("  n / N         New file / folder under the selection"),
        Line::from("  r             Rename the selected file"),
        Line::from("  D             Delete the selected file"),
        Line::from(""),
        Line::from("Editing"),
        Line::from("  i             Insert mode (Esc leaves)"),
        Line::from("  u / Ctrl-r    Undo / redo"),
        Line::from(""),
        Line::from("Assistant"),
        Line::from("  a / A         Analyze file / project"),
        Line::from("  f             Ask for a fix with an instruction"),
        Line::from("  F             Fix every issue from the last analysis"),
        Line::from("  t             Generate tests for the file"),
        Line::from("  c             Ask a question in the project chat"),
        Line::from(""),
        Line::from("Review (when a proposal is staged)"),
        Line::from("  y / x         Accept / reject the proposal"),
        Line::from("  [ / ]         Previous / next change"),
        Line::from("  Enter         Revert to the selected version (Versions tab)"),
        Line::from(""),
        Line::from("General"),
        Line::from("  Esc           Dismiss the newest notice"),
        Line::from("  ?             Open / close this help"),
        Line::from("  q             Quit"),
    ])
}
