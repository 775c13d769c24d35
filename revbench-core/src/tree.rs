//! Directory-tree view over a project's flat file list.
//!
//! Directories come from two places: parents of file paths, and the project's
//! explicit `folders` (which is how an empty directory exists at all).

use std::collections::BTreeSet;

use crate::types::{file_name, FileRecord, Project};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeNode {
    Directory { path: String, name: String, depth: usize },
    File { id: String, path: String, name: String, depth: usize },
}

impl TreeNode {
    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Directory { depth, .. } | TreeNode::File { depth, .. } => *depth,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            TreeNode::Directory { name, .. } | TreeNode::File { name, .. } => name,
        }
    }

    pub fn file_id(&self) -> Option<&str> {
        match self {
            TreeNode::File { id, .. } => Some(id),
            TreeNode::Directory { .. } => None,
        }
    }
}

/// Flattens the project into display order: directories first, then files,
/// each group sorted by name, children directly after their parent.
pub fn build_tree(project: &Project) -> Vec<TreeNode> {
    let mut dirs = BTreeSet::new();
    for folder in &project.folders {
        insert_with_parents(&mut dirs, folder);
    }
    for file in &project.files {
        let parent = parent_of(&file.path);
        if !parent.is_empty() {
            insert_with_parents(&mut dirs, parent);
        }
    }

    let mut out = Vec::with_capacity(dirs.len() + project.files.len());
    walk("", 0, &dirs, &project.files, &mut out);
    out
}

fn walk(parent: &str, depth: usize, dirs: &BTreeSet<String>, files: &[FileRecord], out: &mut Vec<TreeNode>) {
    for dir in dirs.iter().filter(|d| parent_of(d) == parent) {
        out.push(TreeNode::Directory {
            path: dir.clone(),
            name: file_name(dir).to_owned(),
            depth,
        });
        walk(dir, depth + 1, dirs, files, out);
    }

    let mut here: Vec<&FileRecord> = files.iter().filter(|f| parent_of(&f.path) == parent).collect();
    here.sort_by(|a, b| a.name.cmp(&b.name));
    out.extend(here.into_iter().map(|f| TreeNode::File {
        id: f.id.clone(),
        path: f.path.clone(),
        name: f.name.clone(),
        depth,
    }));
}

fn parent_of(path: &str) -> &str {
    path.rsplit_once('/').map(|(parent, _)| parent).unwrap_or("")
}

fn insert_with_parents(dirs: &mut BTreeSet<String>, dir: &str) {
    let mut current = dir;
    while !current.is_empty() && dirs.insert(current.to_owned()) {
        current = parent_of(current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProjectSource;
    use pretty_assertions::assert_eq;

    fn names(nodes: &[TreeNode]) -> Vec<String> {
        nodes
            .iter()
            .map(|n| format!("{}{}", "  ".repeat(n.depth()), n.name()))
            .collect()
    }

    #[test]
    fn directories_first_then_files() {
        let mut project = Project::new(
            "demo",
            ProjectSource::Blank,
            vec![
                FileRecord::new("src/main.rs", ""),
                FileRecord::new("README.md", ""),
                FileRecord::new("src/ui/view.rs", ""),
                FileRecord::new("Cargo.toml", ""),
                FileRecord::new("src/app.rs", ""),
            ],
        );
        project.folders.push("docs/adr".into());

        assert_eq!(
            names(&build_tree(&project)),
            vec![
                "docs",
                "  adr",
                "src",
                "  ui",
                "    view.rs",
                "  app.rs",
                "  main.rs",
                "Cargo.toml",
                "README.md",
            ]
        );
    }

    #[test]
    fn file_nodes_carry_ids() {
        let file = FileRecord::new("a/b.rs", "");
        let id = file.id.clone();
        let project = Project::new("demo", ProjectSource::Blank, vec![file]);
        let tree = build_tree(&project);
        assert_eq!(tree[0].file_id(), None);
        assert_eq!(tree[1].file_id(), Some(id.as_str()));
    }
}
