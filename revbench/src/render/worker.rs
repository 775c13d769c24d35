//! Render thread: syntect highlighting and side-by-side diff styling.
//!
//! Requests arrive over a crossbeam channel; when several are queued only the
//! newest is rendered, since every request supersedes the ones before it.

use std::sync::LazyLock;

use crossbeam_channel::Receiver;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use revbench_core::diff::{self, DiffCell, RowKind};
use similar::{ChangeTag, TextDiff};
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::event::AppEvent;
use crate::render::types::{RenderRequest, RenderedView, ViewKey};

static PS: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_nonewlines);
static TS: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

const GUTTER: Color = Color::DarkGray;

/// Entry point for the render thread. Runs until every sender is dropped or
/// the event channel closes.
pub fn render_worker_loop(rx: Receiver<RenderRequest>, event_tx: UnboundedSender<AppEvent>) {
    // Load the syntax and theme sets before the first request.
    let _ = &*PS;
    let _ = &*TS;

    for request in rx.iter() {
        let request = rx.try_iter().last().unwrap_or(request);
        let view = render(request);
        debug!(file_id = %view.key.file_id, rows = view.left.len(), "view rendered");
        if event_tx.send(AppEvent::Rendered(Box::new(view))).is_err() {
            break;
        }
    }
}

pub fn render(request: RenderRequest) -> RenderedView {
    match request {
        RenderRequest::Source { key, path, content } => render_source(key, &path, &content),
        RenderRequest::Review { key, path, current, staged } => {
            render_review(key, &path, &current, &staged)
        }
    }
}

fn syntax_for(path: &str) -> &'static SyntaxReference {
    let ext = path.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
    PS.find_syntax_by_extension(ext)
        .unwrap_or_else(|| PS.find_syntax_plain_text())
}

fn theme() -> Option<&'static Theme> {
    TS.themes.get("base16-ocean.dark").or_else(|| TS.themes.values().next())
}

/// Highlights a line with `h` when a theme is available, plain otherwise.
fn highlight(code: &str, h: Option<&mut HighlightLines<'_>>) -> Vec<Span<'static>> {
    match h {
        Some(h) => build_syntect_spans(code, h, &PS),
        None => vec![Span::raw(code.to_owned())],
    }
}

fn render_source(key: ViewKey, path: &str, content: &str) -> RenderedView {
    let syntax = syntax_for(path);
    let mut h = theme().map(|t| HighlightLines::new(syntax, t));
    let width = gutter_width(content.lines().count());

    let mut left: Vec<Line<'static>> = content
        .lines()
        .enumerate()
        .map(|(i, code)| {
            let mut spans = vec![gutter(i as u32 + 1, width)];
            spans.extend(highlight(code, h.as_mut()));
            Line::from(spans)
        })
        .collect();
    if left.is_empty() {
        left.push(Line::from(vec![gutter(1, width)]));
    }

    RenderedView { key, left, right: Vec::new(), change_rows: Vec::new(), stats: None }
}

fn render_review(key: ViewKey, path: &str, current: &str, staged: &str) -> RenderedView {
    let syntax = syntax_for(path);
    let theme = theme();
    let mut old_h = theme.map(|t| HighlightLines::new(syntax, t));
    let mut new_h = theme.map(|t| HighlightLines::new(syntax, t));

    let rows = diff::side_by_side(current, staged);
    let width = gutter_width(current.lines().count().max(staged.lines().count()));

    let mut left = Vec::with_capacity(rows.len());
    let mut right = Vec::with_capacity(rows.len());
    let mut change_rows = Vec::new();
    let mut in_change = false;

    for (i, row) in rows.iter().enumerate() {
        let changed = row.kind != RowKind::Equal;
        if changed && !in_change {
            change_rows.push(i);
        }
        in_change = changed;

        match row.kind {
            RowKind::Equal => {
                left.push(cell_line(row.left.as_ref(), width, ' ', GUTTER, |t| {
                    highlight(t, old_h.as_mut())
                }));
                right.push(cell_line(row.right.as_ref(), width, ' ', GUTTER, |t| {
                    highlight(t, new_h.as_mut())
                }));
            }
            RowKind::Removed => {
                left.push(cell_line(row.left.as_ref(), width, '-', Color::Red, |t| {
                    highlight(t, old_h.as_mut())
                }));
                right.push(filler(width));
            }
            RowKind::Added => {
                left.push(filler(width));
                right.push(cell_line(row.right.as_ref(), width, '+', Color::Green, |t| {
                    highlight(t, new_h.as_mut())
                }));
            }
            RowKind::Changed => {
                let old_text = row.left.as_ref().map(|c| c.text.as_str()).unwrap_or("");
                let new_text = row.right.as_ref().map(|c| c.text.as_str()).unwrap_or("");
                // Keep both highlighters in step with the lines they skip.
                let _ = highlight(old_text, old_h.as_mut());
                let _ = highlight(new_text, new_h.as_mut());
                let (old_words, new_words) = word_diff_spans(old_text, new_text);
                left.push(cell_line(row.left.as_ref(), width, '-', Color::Red, |_| old_words));
                right.push(cell_line(row.right.as_ref(), width, '+', Color::Green, |_| new_words));
            }
        }
    }

    let stats = diff::stats(&rows);
    RenderedView { key, left, right, change_rows, stats: Some(stats) }
}

pub(crate) fn gutter_width(lines: usize) -> usize {
    lines.max(1).to_string().len().max(3)
}

fn gutter(lineno: u32, width: usize) -> Span<'static> {
    Span::styled(format!("{lineno:>width$} "), Style::default().fg(GUTTER))
}

fn cell_line(
    cell: Option<&DiffCell>,
    width: usize,
    marker: char,
    marker_color: Color,
    body: impl FnOnce(&str) -> Vec<Span<'static>>,
) -> Line<'static> {
    let Some(cell) = cell else {
        return filler(width);
    };
    let mut spans = vec![
        gutter(cell.lineno, width),
        Span::styled(format!("{marker} "), Style::default().fg(marker_color)),
    ];
    spans.extend(body(&cell.text));
    Line::from(spans)
}

/// Blank row on the side of a diff that has no counterpart line.
fn filler(width: usize) -> Line<'static> {
    Line::from(Span::styled(
        format!("{:>width$} ", "~"),
        Style::default().fg(GUTTER),
    ))
}

/// Converts a syntect (Style, &str) pair to an owned ratatui Span.
fn syntect_to_span(style: syntect::highlighting::Style, content: &str) -> Span<'static> {
    use syntect::highlighting::Color as SC;
    use syntect::highlighting::FontStyle;
    let to_color = |c: SC| -> Option<Color> {
        if c.a > 0 { Some(Color::Rgb(c.r, c.g, c.b)) } else { None }
    };
    // Syntect backgrounds are dropped.
    let mut ratatui_style = Style::default();
    if let Some(fg) = to_color(style.foreground) {
        ratatui_style = ratatui_style.fg(fg);
    }
    if style.font_style.contains(FontStyle::BOLD) {
        ratatui_style = ratatui_style.add_modifier(Modifier::BOLD);
    }
    if style.font_style.contains(FontStyle::ITALIC) {
        ratatui_style = ratatui_style.add_modifier(Modifier::ITALIC);
    }
    if style.font_style.contains(FontStyle::UNDERLINE) {
        ratatui_style = ratatui_style.add_modifier(Modifier::UNDERLINED);
    }
    Span::styled(content.to_owned(), ratatui_style)
}

/// Highlights one line. Falls back to a plain span on error.
fn build_syntect_spans(code: &str, h: &mut HighlightLines, ps: &SyntaxSet) -> Vec<Span<'static>> {
    let ranges = h.highlight_line(code, ps).unwrap_or_default();
    let spans: Vec<Span<'static>> =
        ranges.into_iter().map(|(style, text)| syntect_to_span(style, text)).collect();
    if spans.is_empty() {
        vec![Span::raw(code.to_owned())]
    } else {
        spans
    }
}

/// Word-level spans for a changed line pair; changed words are bold.
fn word_diff_spans(old_line: &str, new_line: &str) -> (Vec<Span<'static>>, Vec<Span<'static>>) {
    let diff = TextDiff::from_words(old_line, new_line);
    let mut old_spans: Vec<Span<'static>> = Vec::new();
    let mut new_spans: Vec<Span<'static>> = Vec::new();

    for op in diff.ops() {
        for change in diff.iter_inline_changes(op) {
            for (emphasized, value) in change.iter_strings_lossy() {
                let text = value.into_owned();
                match change.tag() {
                    ChangeTag::Delete => {
                        let mut style = Style::default().fg(Color::Red);
                        if emphasized {
                            style = style.add_modifier(Modifier::BOLD | Modifier::REVERSED);
                        }
                        old_spans.push(Span::styled(text, style));
                    }
                    ChangeTag::Insert => {
                        let mut style = Style::default().fg(Color::Green);
                        if emphasized {
                            style = style.add_modifier(Modifier::BOLD | Modifier::REVERSED);
                        }
                        new_spans.push(Span::styled(text, style));
                    }
                    ChangeTag::Equal => {
                        let span = Span::raw(text);
                        old_spans.push(span.clone());
                        new_spans.push(span);
                    }
                }
            }
        }
    }
    (old_spans, new_spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::types::ViewKind;

    fn text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    fn key(kind: ViewKind) -> ViewKey {
        ViewKey::new("p", "f", kind, &["x"])
    }

    #[test]
    fn source_lines_carry_line_numbers() {
        let view = render_source(key(ViewKind::Source), "main.rs", "fn main() {\n}\n");
        assert_eq!(view.left.len(), 2);
        assert_eq!(text(&view.left[0]), "  1 fn main() {");
        assert_eq!(text(&view.left[1]), "  2 }");
        assert!(view.right.is_empty());
    }

    #[test]
    fn empty_source_still_has_a_row() {
        let view = render_source(key(ViewKind::Source), "empty.txt", "");
        assert_eq!(view.left.len(), 1);
    }

    #[test]
    fn review_rows_stay_aligned() {
        let view = render_review(
            key(ViewKind::Review),
            "calc.py",
            "a = 1\nb = 2\nc = 3\n",
            "a = 1\nb = 20\nc = 3\nd = 4\n",
        );
        assert_eq!(view.left.len(), view.right.len());
        assert_eq!(view.left.len(), 4);
        assert_eq!(text(&view.left[1]), "  2 - b = 2");
        assert_eq!(text(&view.right[1]), "  2 + b = 20");
        assert_eq!(text(&view.right[3]), "  4 + d = 4");
        assert_eq!(view.change_rows, vec![1, 3]);
        let stats = view.stats.unwrap();
        assert_eq!((stats.added, stats.removed), (2, 1));
    }

    #[test]
    fn word_diff_keeps_text_and_emphasises_changes() {
        let (old, new) = word_diff_spans("let x = 1;", "let x = 2;");
        let joined = |spans: &[Span<'_>]| spans.iter().map(|s| s.content.as_ref()).collect::<String>();
        assert_eq!(joined(&old), "let x = 1;");
        assert_eq!(joined(&new), "let x = 2;");
        assert!(old.iter().any(|s| s.style.add_modifier.contains(Modifier::BOLD)));
        assert!(new.iter().any(|s| s.style.add_modifier.contains(Modifier::BOLD)));
        assert!(!old.iter().any(|s| s.content.contains("let") && s.style.add_modifier.contains(Modifier::BOLD)));
    }
}
