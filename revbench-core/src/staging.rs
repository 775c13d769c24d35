//! Staged-fix workflow: AI-proposed replacements held beside the live content.
//!
//! A file is `Clean`, `Fixing` (a request is in flight) or `Staged` (a proposal
//! waits for review). Staging is a single slot; the latest accepted response
//! overwrites any earlier proposal.
//!
//! Overlapping requests are ordered by [`RequestTokens`]: every request takes
//! a fresh token, and a response is applied only if its token is still the
//! latest one issued for that file and request kind.

use std::collections::HashMap;

use crate::archive::{archive_current, SnapshotReason};
use crate::types::{FileRecord, Issue};

/// Review state of a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixStatus {
    Clean,
    Fixing,
    Staged,
}

/// Kinds of remote request that are tracked per target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Fix,
    Analysis,
    Tests,
    Chat,
    ProjectAnalysis,
}

/// Monotonic request tokens, keyed by target id and request kind.
///
/// The target is a file id for file-scoped requests and a project id for
/// chat and project analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestTokens {
    next: u64,
    latest: HashMap<(String, RequestKind), u64>,
}

impl RequestTokens {
    /// Issues a new token for `(target, kind)`, superseding any earlier one.
    pub fn issue(&mut self, target: &str, kind: RequestKind) -> u64 {
        self.next += 1;
        self.latest.insert((target.to_owned(), kind), self.next);
        self.next
    }

    /// Latest outstanding token for `(target, kind)`.
    pub fn pending(&self, target: &str, kind: RequestKind) -> Option<u64> {
        self.latest.get(&(target.to_owned(), kind)).copied()
    }

    pub fn is_pending(&self, target: &str, kind: RequestKind) -> bool {
        self.pending(target, kind).is_some()
    }

    /// Consumes `token` if it is the latest for `(target, kind)`.
    ///
    /// Returns `false` for stale or unknown tokens, leaving state untouched.
    pub fn settle(&mut self, target: &str, kind: RequestKind, token: u64) -> bool {
        let key = (target.to_owned(), kind);
        if self.latest.get(&key) == Some(&token) {
            self.latest.remove(&key);
            true
        } else {
            false
        }
    }

    /// Drops every outstanding token for `target` and for keys nested under
    /// it (`target/...`).
    pub fn forget(&mut self, target: &str) {
        let nested = format!("{target}/");
        self.latest
            .retain(|(t, _), _| t != target && !t.starts_with(&nested));
    }
}

/// Places `content` in the staging slot, replacing any earlier proposal.
pub fn stage(file: &mut FileRecord, content: impl Into<String>) {
    file.staged_content = Some(content.into());
}

/// Accepts the staged proposal.
///
/// Archives the current content as "before fix", promotes the staged content,
/// clears the slot and the cached analysis. Returns `false` when nothing is
/// staged.
pub fn accept(file: &mut FileRecord, version_limit: Option<usize>) -> bool {
    let Some(staged) = file.staged_content.take() else {
        return false;
    };
    archive_current(file, SnapshotReason::BeforeFix, version_limit);
    file.content = staged;
    file.analysis = None;
    true
}

/// Discards the staged proposal. Content and archive are untouched.
pub fn reject(file: &mut FileRecord) -> bool {
    file.staged_content.take().is_some()
}

/// Combines every issue into one instruction for a single fix request.
pub fn batch_instruction(issues: &[Issue]) -> String {
    let mut out = String::from("Fix all of the following issues:\n");
    for (i, issue) in issues.iter().enumerate() {
        out.push_str(&format!("{}. {}: {}\n", i + 1, issue.title, issue.description));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Severity;

    #[test]
    fn accept_appends_exactly_one_snapshot() {
        let mut f = FileRecord::new("a.py", "print(1)");
        stage(&mut f, "print(2)");
        assert!(accept(&mut f, None));
        assert_eq!(f.content, "print(2)");
        assert!(f.staged_content.is_none());
        assert_eq!(f.versions.len(), 1);
        assert_eq!(f.versions[0].content, "print(1)");
        assert!(f.versions[0].description.starts_with("Before fix"));
    }

    #[test]
    fn accept_without_staged_is_no_op() {
        let mut f = FileRecord::new("a.py", "x");
        assert!(!accept(&mut f, None));
        assert!(f.versions.is_empty());
    }

    #[test]
    fn reject_never_touches_content_or_archive() {
        let mut f = FileRecord::new("a.py", "x");
        stage(&mut f, "y");
        let versions = f.versions.clone();
        assert!(reject(&mut f));
        assert_eq!(f.content, "x");
        assert_eq!(f.versions, versions);
        assert!(f.staged_content.is_none());
    }

    #[test]
    fn staging_twice_keeps_last() {
        let mut f = FileRecord::new("a.py", "x");
        stage(&mut f, "first");
        stage(&mut f, "second");
        assert_eq!(f.staged_content.as_deref(), Some("second"));
    }

    #[test]
    fn stale_token_is_rejected() {
        let mut tokens = RequestTokens::default();
        let first = tokens.issue("f1", RequestKind::Fix);
        let second = tokens.issue("f1", RequestKind::Fix);
        assert!(!tokens.settle("f1", RequestKind::Fix, first));
        assert!(tokens.is_pending("f1", RequestKind::Fix));
        assert!(tokens.settle("f1", RequestKind::Fix, second));
        assert!(!tokens.is_pending("f1", RequestKind::Fix));
    }

    #[test]
    fn tokens_are_scoped_by_kind() {
        let mut tokens = RequestTokens::default();
        let fix = tokens.issue("f1", RequestKind::Fix);
        tokens.issue("f1", RequestKind::Analysis);
        assert!(tokens.settle("f1", RequestKind::Fix, fix));
        assert!(tokens.is_pending("f1", RequestKind::Analysis));
    }

    #[test]
    fn forget_drops_nested_keys() {
        let mut tokens = RequestTokens::default();
        tokens.issue("p1", RequestKind::Chat);
        tokens.issue("p1/f1", RequestKind::Fix);
        tokens.issue("p2/f1", RequestKind::Fix);
        tokens.forget("p1");
        assert!(!tokens.is_pending("p1", RequestKind::Chat));
        assert!(!tokens.is_pending("p1/f1", RequestKind::Fix));
        assert!(tokens.is_pending("p2/f1", RequestKind::Fix));
    }

    #[test]
    fn batch_instruction_lists_every_issue() {
        let issues = vec![
            Issue {
                title: "Unchecked index".into(),
                description: "may panic".into(),
                severity: Severity::High,
                line: Some(3),
                suggestion: None,
            },
            Issue {
                title: "Naming".into(),
                description: "use snake_case".into(),
                severity: Severity::Low,
                line: None,
                suggestion: None,
            },
        ];
        let text = batch_instruction(&issues);
        assert!(text.contains("1. Unchecked index: may panic"));
        assert!(text.contains("2. Naming: use snake_case"));
    }
}
