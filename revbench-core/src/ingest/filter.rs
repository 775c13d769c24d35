use serde::Deserialize;

/// Path fragments that exclude an entry: VCS metadata, dependency and build
/// output directories, editor state, lockfiles.
pub const DENYLIST: &[&str] = &[
    ".git/",
    "node_modules/",
    "dist/",
    "build/",
    ".next/",
    "target/",
    "coverage/",
    ".vscode/",
    ".idea/",
    "__pycache__/",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "Cargo.lock",
    ".DS_Store",
];

/// Upper bound on files taken from a remote repository.
pub const MAX_FILES: usize = 30;

/// One entry of a recursive git tree listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub sha: String,
    /// Blob API URL; absent for some mirrors.
    #[serde(default)]
    pub url: Option<String>,
}

impl TreeEntry {
    pub fn is_blob(&self) -> bool {
        self.kind == "blob"
    }
}

/// True when `path` contains any denylisted fragment (plain substring match).
pub fn is_denied(path: &str) -> bool {
    DENYLIST.iter().any(|frag| path.contains(frag))
}

/// Keeps blobs whose path passes the denylist, preserving tree order, and
/// truncates to the first `max` survivors.
pub fn filter_tree(entries: Vec<TreeEntry>, max: usize) -> Vec<TreeEntry> {
    entries
        .into_iter()
        .filter(|e| e.is_blob() && !is_denied(&e.path))
        .take(max)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(path: &str, kind: &str) -> TreeEntry {
        TreeEntry { path: path.into(), kind: kind.into(), sha: format!("sha-{path}"), url: None }
    }

    #[test]
    fn drops_trees_and_denylisted_paths() {
        let entries = vec![
            entry("src/main.rs", "blob"),
            entry("node_modules/x/index.js", "blob"),
            entry("src", "tree"),
            entry("package-lock.json", "blob"),
            entry("README.md", "blob"),
        ];
        let kept: Vec<String> = filter_tree(entries, MAX_FILES).into_iter().map(|e| e.path).collect();
        assert_eq!(kept, vec!["src/main.rs", "README.md"]);
    }

    #[test]
    fn vcs_dependency_and_build_paths_are_dropped() {
        let entries = vec![
            entry("node_modules/a.js", "blob"),
            entry("src/b.js", "blob"),
            entry(".git/HEAD", "blob"),
            entry("dist/bundle.js", "blob"),
        ];
        let kept: Vec<String> = filter_tree(entries, MAX_FILES).into_iter().map(|e| e.path).collect();
        assert_eq!(kept, vec!["src/b.js"]);
    }

    #[test]
    fn truncates_in_tree_order() {
        let entries: Vec<TreeEntry> = (0..45).map(|i| entry(&format!("f{i:02}.txt"), "blob")).collect();
        let kept = filter_tree(entries, MAX_FILES);
        assert_eq!(kept.len(), 30);
        assert_eq!(kept[0].path, "f00.txt");
        assert_eq!(kept[29].path, "f29.txt");
    }

    #[test]
    fn denylist_is_substring_based() {
        assert!(is_denied("packages/web/.next/cache.json"));
        assert!(is_denied("crates/a/target/debug/a"));
        assert!(is_denied("ios/.DS_Store"));
        assert!(!is_denied("src/targets.rs"));
        assert!(!is_denied("docs/building.md"));
    }
}
