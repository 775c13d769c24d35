//! Append-only version archive and revert.
//!
//! A snapshot is taken right before a file's content is replaced by an
//! accepted fix or by a revert. Snapshots are never mutated or removed, except
//! by the optional `limit` which drops the oldest ones.

use chrono::{DateTime, Utc};

use crate::types::{FileRecord, VersionSnapshot};

/// Why a snapshot was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotReason {
    BeforeFix,
    BeforeRevert,
}

impl SnapshotReason {
    /// Human-readable description stored on the snapshot.
    pub fn describe(self, at: DateTime<Utc>) -> String {
        let stamp = at.format("%Y-%m-%d %H:%M:%S UTC");
        match self {
            SnapshotReason::BeforeFix => format!("Before fix ({stamp})"),
            SnapshotReason::BeforeRevert => format!("Before revert ({stamp})"),
        }
    }
}

/// Appends the file's current content to its archive and returns the new
/// snapshot's id.
///
/// `limit` of `None` (or `Some(0)`) keeps every snapshot.
pub fn archive_current(file: &mut FileRecord, reason: SnapshotReason, limit: Option<usize>) -> String {
    let now = Utc::now();
    let snapshot = VersionSnapshot {
        id: uuid::Uuid::new_v4().to_string(),
        created_at: now,
        content: file.content.clone(),
        description: reason.describe(now),
    };
    let id = snapshot.id.clone();
    file.versions.push(snapshot);

    if let Some(cap) = limit.filter(|&cap| cap > 0) {
        if file.versions.len() > cap {
            let excess = file.versions.len() - cap;
            file.versions.drain(..excess);
        }
    }
    id
}

/// Restores the snapshot `version_id`.
///
/// Unknown ids are a no-op and return `false`. Otherwise the current content
/// is archived first, then replaced by the snapshot's content, and the cached
/// analysis is cleared. The restored snapshot stays in the archive.
pub fn revert(file: &mut FileRecord, version_id: &str, limit: Option<usize>) -> bool {
    let Some(target) = file
        .versions
        .iter()
        .find(|v| v.id == version_id)
        .map(|v| v.content.clone())
    else {
        return false;
    };

    archive_current(file, SnapshotReason::BeforeRevert, limit);
    file.content = target;
    file.analysis = None;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Analysis, SafetyStatus};

    fn sample_analysis() -> Analysis {
        Analysis {
            status: SafetyStatus::Safe,
            quality_score: 90,
            security_score: 90,
            performance_score: 90,
            summary: "fine".into(),
            issues: Vec::new(),
        }
    }

    #[test]
    fn unknown_version_is_no_op() {
        let mut f = FileRecord::new("a.rs", "one");
        archive_current(&mut f, SnapshotReason::BeforeFix, None);
        let before = f.clone();
        assert!(!revert(&mut f, "does-not-exist", None));
        assert_eq!(f, before);
    }

    #[test]
    fn revert_archives_current_then_restores() {
        let mut f = FileRecord::new("a.rs", "one");
        let first = archive_current(&mut f, SnapshotReason::BeforeFix, None);
        f.content = "two".into();
        f.analysis = Some(sample_analysis());

        assert!(revert(&mut f, &first, None));
        assert_eq!(f.content, "one");
        assert!(f.analysis.is_none());
        assert_eq!(f.versions.len(), 2);
        assert_eq!(f.versions[0].id, first);
        assert_eq!(f.versions[1].content, "two");
        assert!(f.versions[1].description.starts_with("Before revert"));
    }

    #[test]
    fn limit_drops_oldest_snapshots() {
        let mut f = FileRecord::new("a.rs", "0");
        for i in 1..=5 {
            archive_current(&mut f, SnapshotReason::BeforeFix, Some(2));
            f.content = i.to_string();
        }
        let kept: Vec<_> = f.versions.iter().map(|v| v.content.as_str()).collect();
        assert_eq!(kept, vec!["3", "4"]);
    }
}
