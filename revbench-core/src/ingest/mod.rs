//! Repository ingestion: GitHub over HTTP and local folders over `walkdir`.
//!
//! Both paths apply the same [`DENYLIST`] and build plain [`FileRecord`]s.
//! Failures that leave no usable project are [`IngestError`]s; individual
//! unreadable files are logged and dropped.

pub mod filter;
pub mod folder;
pub mod github;

use std::path::Path;

pub use filter::{filter_tree, is_denied, TreeEntry, DENYLIST, MAX_FILES};
pub use github::{FetchedRepository, GitHubClient};

use crate::error::IngestError;
use crate::types::{FileRecord, Project, ProjectSource};

/// `owner/repo` pair parsed from user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

/// Parses `https://github.com/owner/repo[.git][/...]`, `github.com/owner/repo`
/// or bare `owner/repo`.
///
/// # Errors
///
/// `InvalidRepositoryUrl` for other hosts, missing segments, or characters
/// GitHub does not allow in owner and repository names.
pub fn parse_repo_url(input: &str) -> Result<RepoRef, IngestError> {
    let invalid = || IngestError::InvalidRepositoryUrl(input.to_owned());
    let trimmed = input.trim();

    let (has_scheme, rest) = match trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
    {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let rest = rest.strip_prefix("www.").unwrap_or(rest);
    let (has_host, rest) = match rest.strip_prefix("github.com/") {
        Some(rest) => (true, rest),
        None => (false, rest),
    };
    if has_scheme && !has_host {
        return Err(invalid());
    }

    let mut segments = rest.split('/').filter(|s| !s.is_empty());
    let owner = segments.next().ok_or_else(invalid)?;
    let repo = segments.next().ok_or_else(invalid)?;
    if !has_host && segments.next().is_some() {
        return Err(invalid());
    }
    let repo = repo.strip_suffix(".git").unwrap_or(repo);

    let owner_ok = owner.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
    let repo_ok = !repo.is_empty()
        && repo != "."
        && repo != ".."
        && repo
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !owner_ok || !repo_ok {
        return Err(invalid());
    }

    Ok(RepoRef { owner: owner.to_owned(), repo: repo.to_owned() })
}

/// Imports a GitHub repository as a new project named `name` (default: the
/// repository name).
///
/// # Errors
///
/// Any [`IngestError`] from URL parsing or [`GitHubClient::fetch_repository`].
pub async fn import_github(
    client: &GitHubClient,
    reference: &str,
    name: Option<&str>,
) -> Result<Project, IngestError> {
    let RepoRef { owner, repo } = parse_repo_url(reference)?;
    let FetchedRepository { branch, files } = client.fetch_repository(&owner, &repo).await?;
    let name = name.map(str::to_owned).unwrap_or_else(|| repo.clone());
    Ok(Project::new(name, ProjectSource::GitHub { owner, repo, branch }, files))
}

/// Imports a local directory as a new project named `name` (default: the
/// directory's own name). Blocking; run it off the UI task.
///
/// # Errors
///
/// Any [`IngestError`] from [`folder::read_folder`].
pub fn import_folder(root: &Path, name: Option<&str>) -> Result<Project, IngestError> {
    let files: Vec<FileRecord> = folder::read_folder(root)?;
    let name = name.map(str::to_owned).unwrap_or_else(|| {
        root.canonicalize()
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "project".to_owned())
    });
    Ok(Project::new(name, ProjectSource::Folder { path: root.display().to_string() }, files))
}

/// An empty project with no source.
pub fn blank_project(name: &str) -> Project {
    Project::new(name, ProjectSource::Blank, Vec::new())
}
