//! Side-by-side line alignment for diff review.
//!
//! Produces display rows only; nothing here mutates a file. Removed lines that
//! are directly followed by added lines are paired row by row as `Changed`, so
//! a one-line edit shows up on a single row with both sides filled.

use similar::{DiffTag, TextDiff};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Equal,
    Removed,
    Added,
    Changed,
}

/// One side of a row: 1-based line number and the line text (no newline).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffCell {
    pub lineno: u32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffRow {
    pub kind: RowKind,
    pub left: Option<DiffCell>,
    pub right: Option<DiffCell>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffStats {
    pub added: usize,
    pub removed: usize,
}

/// Aligns `old` and `new` line by line.
pub fn side_by_side(old: &str, new: &str) -> Vec<DiffRow> {
    let old_lines: Vec<&str> = old.lines().collect();
    let new_lines: Vec<&str> = new.lines().collect();
    let diff = TextDiff::from_slices(&old_lines, &new_lines);

    let mut rows = Vec::new();
    let mut pending_removed: Vec<DiffCell> = Vec::new();

    for op in diff.ops() {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        match tag {
            DiffTag::Equal => {
                flush_removed(&mut rows, &mut pending_removed);
                for (o, n) in old_range.zip(new_range) {
                    rows.push(DiffRow {
                        kind: RowKind::Equal,
                        left: Some(cell(&old_lines, o)),
                        right: Some(cell(&new_lines, n)),
                    });
                }
            }
            DiffTag::Delete => {
                pending_removed.extend(old_range.map(|o| cell(&old_lines, o)));
            }
            DiffTag::Insert => {
                pair_added(&mut rows, &mut pending_removed, new_range.map(|n| cell(&new_lines, n)));
            }
            DiffTag::Replace => {
                pending_removed.extend(old_range.map(|o| cell(&old_lines, o)));
                pair_added(&mut rows, &mut pending_removed, new_range.map(|n| cell(&new_lines, n)));
            }
        }
    }
    flush_removed(&mut rows, &mut pending_removed);
    rows
}

fn cell(lines: &[&str], i: usize) -> DiffCell {
    DiffCell { lineno: i as u32 + 1, text: lines[i].to_owned() }
}

fn flush_removed(rows: &mut Vec<DiffRow>, pending: &mut Vec<DiffCell>) {
    rows.extend(pending.drain(..).map(|left| DiffRow {
        kind: RowKind::Removed,
        left: Some(left),
        right: None,
    }));
}

fn pair_added(
    rows: &mut Vec<DiffRow>,
    pending: &mut Vec<DiffCell>,
    added: impl Iterator<Item = DiffCell>,
) {
    let mut removed = pending.drain(..);
    for right in added {
        match removed.next() {
            Some(left) => rows.push(DiffRow { kind: RowKind::Changed, left: Some(left), right: Some(right) }),
            None => rows.push(DiffRow { kind: RowKind::Added, left: None, right: Some(right) }),
        }
    }
    let leftover: Vec<DiffCell> = removed.collect();
    rows.extend(leftover.into_iter().map(|left| DiffRow {
        kind: RowKind::Removed,
        left: Some(left),
        right: None,
    }));
}

/// Counts added and removed lines; a `Changed` row counts as one of each.
pub fn stats(rows: &[DiffRow]) -> DiffStats {
    rows.iter().fold(DiffStats::default(), |mut s, row| {
        match row.kind {
            RowKind::Equal => {}
            RowKind::Removed => s.removed += 1,
            RowKind::Added => s.added += 1,
            RowKind::Changed => {
                s.added += 1;
                s.removed += 1;
            }
        }
        s
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(rows: &[DiffRow]) -> Vec<RowKind> {
        rows.iter().map(|r| r.kind).collect()
    }

    #[test]
    fn identical_text_is_all_equal() {
        let rows = side_by_side("a\nb\n", "a\nb\n");
        assert_eq!(kinds(&rows), vec![RowKind::Equal, RowKind::Equal]);
        assert_eq!(stats(&rows), DiffStats::default());
    }

    #[test]
    fn single_line_change_pairs_on_one_row() {
        let rows = side_by_side("a\nb\nc", "a\nB\nc");
        assert_eq!(kinds(&rows), vec![RowKind::Equal, RowKind::Changed, RowKind::Equal]);
        let changed = &rows[1];
        assert_eq!(changed.left.as_ref().unwrap().text, "b");
        assert_eq!(changed.right.as_ref().unwrap().text, "B");
        assert_eq!(changed.left.as_ref().unwrap().lineno, 2);
    }

    #[test]
    fn pure_insert_and_delete() {
        let rows = side_by_side("a\nc", "a\nb\nc");
        assert_eq!(kinds(&rows), vec![RowKind::Equal, RowKind::Added, RowKind::Equal]);
        assert_eq!(rows[1].right.as_ref().unwrap().lineno, 2);

        let rows = side_by_side("a\nb\nc", "a\nc");
        assert_eq!(kinds(&rows), vec![RowKind::Equal, RowKind::Removed, RowKind::Equal]);
    }

    #[test]
    fn uneven_replacement_leaves_tail() {
        let rows = side_by_side("x\n1\n2\n3\ny", "x\nA\ny");
        assert_eq!(
            kinds(&rows),
            vec![RowKind::Equal, RowKind::Changed, RowKind::Removed, RowKind::Removed, RowKind::Equal]
        );
        assert_eq!(stats(&rows), DiffStats { added: 1, removed: 3 });
    }

    #[test]
    fn empty_old_is_all_added() {
        let rows = side_by_side("", "a\nb");
        assert_eq!(kinds(&rows), vec![RowKind::Added, RowKind::Added]);
    }
}
