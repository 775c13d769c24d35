//! Cursor movement and text edits for the insert-mode editor.
//!
//! Every edit takes the current content and returns the full new content;
//! the caller turns that into a single `Action::Edit`, which is what makes
//! each keystroke one undo step. Columns count chars, not bytes.

const TAB: &str = "    ";

/// Cursor position in the active file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditorCursor {
    pub row: usize,
    pub col: usize,
}

fn split_lines(content: &str) -> Vec<&str> {
    content.split('\n').collect()
}

fn char_len(line: &str) -> usize {
    line.chars().count()
}

/// Byte offset of char column `col` in `line`, clamped to the line end.
fn byte_at(line: &str, col: usize) -> usize {
    line.char_indices().nth(col).map(|(i, _)| i).unwrap_or(line.len())
}

fn leading_whitespace(line: &str) -> &str {
    let end = line.len() - line.trim_start_matches([' ', '\t']).len();
    &line[..end]
}

impl EditorCursor {
    /// Pulls the cursor back inside `content`.
    pub fn clamp(&mut self, content: &str) {
        let lines = split_lines(content);
        self.row = self.row.min(lines.len().saturating_sub(1));
        self.col = self.col.min(char_len(lines[self.row]));
    }

    pub fn insert_str(&mut self, content: &str, text: &str) -> String {
        self.clamp(content);
        let mut lines: Vec<String> = split_lines(content).into_iter().map(str::to_owned).collect();
        let line = &mut lines[self.row];
        let at = byte_at(line, self.col);
        line.insert_str(at, text);
        self.col += char_len(text);
        lines.join("\n")
    }

    pub fn insert_char(&mut self, content: &str, ch: char) -> String {
        let mut buf = [0u8; 4];
        self.insert_str(content, ch.encode_utf8(&mut buf))
    }

    pub fn insert_tab(&mut self, content: &str) -> String {
        self.insert_str(content, TAB)
    }

    /// Splits the line at the cursor, carrying the line's indentation over.
    pub fn insert_newline(&mut self, content: &str) -> String {
        self.clamp(content);
        let mut lines: Vec<String> = split_lines(content).into_iter().map(str::to_owned).collect();
        let line = lines[self.row].clone();
        let at = byte_at(&line, self.col);
        let indent = leading_whitespace(&line[..at]).to_owned();
        let tail = format!("{indent}{}", &line[at..]);
        lines[self.row] = line[..at].to_owned();
        lines.insert(self.row + 1, tail);
        self.row += 1;
        self.col = char_len(&indent);
        lines.join("\n")
    }

    /// Deletes the char before the cursor, joining lines at column zero.
    /// Returns `None` at the very start of the file.
    pub fn backspace(&mut self, content: &str) -> Option<String> {
        self.clamp(content);
        let mut lines: Vec<String> = split_lines(content).into_iter().map(str::to_owned).collect();
        if self.col > 0 {
            let line = &mut lines[self.row];
            let start = byte_at(line, self.col - 1);
            let end = byte_at(line, self.col);
            line.replace_range(start..end, "");
            self.col -= 1;
        } else if self.row > 0 {
            let line = lines.remove(self.row);
            self.row -= 1;
            self.col = char_len(&lines[self.row]);
            lines[self.row].push_str(&line);
        } else {
            return None;
        }
        Some(lines.join("\n"))
    }

    /// Deletes the char under the cursor, joining the next line at line end.
    /// Returns `None` at the very end of the file.
    pub fn delete(&mut self, content: &str) -> Option<String> {
        self.clamp(content);
        let mut lines: Vec<String> = split_lines(content).into_iter().map(str::to_owned).collect();
        let len = char_len(&lines[self.row]);
        if self.col < len {
            let line = &mut lines[self.row];
            let start = byte_at(line, self.col);
            let end = byte_at(line, self.col + 1);
            line.replace_range(start..end, "");
        } else if self.row + 1 < lines.len() {
            let next = lines.remove(self.row + 1);
            lines[self.row].push_str(&next);
        } else {
            return None;
        }
        Some(lines.join("\n"))
    }

    pub fn move_left(&mut self, content: &str) {
        self.clamp(content);
        if self.col > 0 {
            self.col -= 1;
        } else if self.row > 0 {
            self.row -= 1;
            self.col = char_len(split_lines(content)[self.row]);
        }
    }

    pub fn move_right(&mut self, content: &str) {
        self.clamp(content);
        let lines = split_lines(content);
        if self.col < char_len(lines[self.row]) {
            self.col += 1;
        } else if self.row + 1 < lines.len() {
            self.row += 1;
            self.col = 0;
        }
    }

    pub fn move_up(&mut self, content: &str, rows: usize) {
        self.row = self.row.saturating_sub(rows);
        self.clamp(content);
    }

    pub fn move_down(&mut self, content: &str, rows: usize) {
        self.row = self.row.saturating_add(rows);
        self.clamp(content);
    }

    pub fn line_start(&mut self) {
        self.col = 0;
    }

    pub fn line_end(&mut self, content: &str) {
        self.col = usize::MAX;
        self.clamp(content);
    }
}
