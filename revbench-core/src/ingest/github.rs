//! GitHub repository ingestion over the REST API and the raw content host.
//!
//! Three calls per import: repository metadata (default branch), the
//! recursive tree, then one content fetch per surviving file. Content is
//! read from the raw host first; on any failure the blob API is tried, whose
//! body carries base64 with embedded newlines.

use std::collections::HashSet;

use base64::Engine as _;
use futures::future::join_all;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::filter::{filter_tree, TreeEntry, MAX_FILES};
use crate::config::GithubConfig;
use crate::error::IngestError;
use crate::types::FileRecord;

const USER_AGENT: &str = concat!("revbench/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct RepoMetadata {
    default_branch: String,
}

#[derive(Debug, Deserialize)]
struct TreeResponse {
    tree: Vec<TreeEntry>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct BlobResponse {
    content: String,
    #[serde(default)]
    encoding: String,
}

/// Result of a successful repository fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedRepository {
    pub branch: String,
    pub files: Vec<FileRecord>,
}

#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_base: String,
    raw_base: String,
    token: Option<String>,
    max_files: usize,
}

impl GitHubClient {
    /// Builds a client against the public GitHub hosts.
    ///
    /// # Errors
    ///
    /// Returns `IngestError::Http` if the TLS backend cannot be initialised.
    pub fn new() -> Result<Self, IngestError> {
        Self::from_config(&GithubConfig::default())
    }

    /// Builds a client from the `[github]` config table, reading the token
    /// from the configured environment variable.
    ///
    /// # Errors
    ///
    /// Returns `IngestError::Http` if the TLS backend cannot be initialised.
    pub fn from_config(cfg: &GithubConfig) -> Result<Self, IngestError> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            http,
            api_base: cfg.api_base.trim_end_matches('/').to_owned(),
            raw_base: cfg.raw_base.trim_end_matches('/').to_owned(),
            token: cfg.token(),
            max_files: if cfg.max_files == 0 { MAX_FILES } else { cfg.max_files },
        })
    }

    /// Points both hosts at `api_base` / `raw_base` (mock servers in tests).
    pub fn with_bases(mut self, api_base: &str, raw_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_owned();
        self.raw_base = raw_base.trim_end_matches('/').to_owned();
        self
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let req = self.http.get(url);
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Resolves the default branch of `owner/repo`.
    ///
    /// # Errors
    ///
    /// `RepositoryNotFound` for any non-success status (missing and private
    /// repositories look the same), `Http` for transport failures.
    pub async fn default_branch(&self, owner: &str, repo: &str) -> Result<String, IngestError> {
        let url = format!("{}/repos/{owner}/{repo}", self.api_base);
        let resp = self.get(&url).header("Accept", "application/vnd.github+json").send().await?;
        if !resp.status().is_success() {
            debug!(status = resp.status().as_u16(), owner, repo, "metadata lookup failed");
            return Err(IngestError::RepositoryNotFound { owner: owner.to_owned(), repo: repo.to_owned() });
        }
        let meta: RepoMetadata = resp.json().await?;
        Ok(meta.default_branch)
    }

    /// Lists every entry of `branch`, recursively.
    ///
    /// # Errors
    ///
    /// `TreeFetch` for a non-success status, `Http` for transport failures.
    pub async fn tree(&self, owner: &str, repo: &str, branch: &str) -> Result<Vec<TreeEntry>, IngestError> {
        let url = format!("{}/repos/{owner}/{repo}/git/trees/{branch}?recursive=1", self.api_base);
        let resp = self.get(&url).header("Accept", "application/vnd.github+json").send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(IngestError::TreeFetch { branch: branch.to_owned(), status: status.as_u16() });
        }
        let tree: TreeResponse = resp.json().await?;
        if tree.truncated {
            warn!(owner, repo, "tree listing truncated by the host");
        }
        Ok(tree.tree)
    }

    async fn fetch_raw(&self, owner: &str, repo: &str, branch: &str, path: &str) -> Option<String> {
        let url = format!("{}/{owner}/{repo}/{branch}/{path}", self.raw_base);
        let resp = match self.get(&url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                debug!(path, error = %e, "raw fetch failed");
                return None;
            }
        };
        if !resp.status().is_success() {
            debug!(path, status = resp.status().as_u16(), "raw fetch failed");
            return None;
        }
        resp.text().await.ok()
    }

    async fn fetch_blob(&self, owner: &str, repo: &str, entry: &TreeEntry) -> Option<String> {
        let url = entry
            .url
            .clone()
            .unwrap_or_else(|| format!("{}/repos/{owner}/{repo}/git/blobs/{}", self.api_base, entry.sha));
        let resp = self.get(&url).header("Accept", "application/vnd.github+json").send().await.ok()?;
        if !resp.status().is_success() {
            debug!(path = %entry.path, status = resp.status().as_u16(), "blob fetch failed");
            return None;
        }
        let blob: BlobResponse = resp.json().await.ok()?;
        decode_blob(&blob)
    }

    async fn fetch_file(&self, owner: &str, repo: &str, branch: &str, entry: &TreeEntry) -> Option<FileRecord> {
        let content = match self.fetch_raw(owner, repo, branch, &entry.path).await {
            Some(content) => content,
            None => match self.fetch_blob(owner, repo, entry).await {
                Some(content) => content,
                None => {
                    warn!(path = %entry.path, "dropping file: raw and blob fetch both failed");
                    return None;
                }
            },
        };
        Some(FileRecord::with_id(entry.sha.clone(), entry.path.clone(), content))
    }

    /// Runs the full ingestion pipeline for `owner/repo`.
    ///
    /// Files are fetched concurrently; the result keeps the filtered tree
    /// order. Individual files that cannot be read are dropped.
    ///
    /// # Errors
    ///
    /// `RepositoryNotFound`, `TreeFetch`, `NoReadableFiles` when the filter
    /// (or every content fetch) leaves nothing, or `Http` for transport
    /// failures on the first two calls.
    pub async fn fetch_repository(&self, owner: &str, repo: &str) -> Result<FetchedRepository, IngestError> {
        let branch = self.default_branch(owner, repo).await?;
        let entries = filter_tree(self.tree(owner, repo, &branch).await?, self.max_files);
        if entries.is_empty() {
            return Err(IngestError::NoReadableFiles);
        }

        let fetches = entries.iter().map(|e| self.fetch_file(owner, repo, &branch, e));
        let mut files: Vec<FileRecord> = join_all(fetches).await.into_iter().flatten().collect();
        if files.is_empty() {
            return Err(IngestError::NoReadableFiles);
        }
        make_ids_unique(&mut files);

        info!(owner, repo, %branch, selected = entries.len(), fetched = files.len(), "repository ingested");
        Ok(FetchedRepository { branch, files })
    }
}

/// Files with identical content share a blob SHA. The first keeps the SHA as
/// its id; later ones get `<sha>:<path>`, which is unique because paths are.
fn make_ids_unique(files: &mut [FileRecord]) {
    let mut taken = HashSet::new();
    for file in files.iter_mut() {
        if !taken.insert(file.id.clone()) {
            file.id = format!("{}:{}", file.id, file.path);
            taken.insert(file.id.clone());
        }
    }
}

/// Decodes a blob API body. Only `base64` encoding is understood.
fn decode_blob(blob: &BlobResponse) -> Option<String> {
    if !blob.encoding.is_empty() && blob.encoding != "base64" {
        return None;
    }
    let packed: String = blob.content.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD.decode(packed).ok()?;
    String::from_utf8(bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_content_with_newlines_decodes() {
        let blob = BlobResponse { content: "IyBI\nZWxs\nbw==\n".into(), encoding: "base64".into() };
        assert_eq!(decode_blob(&blob).as_deref(), Some("# Hello"));
    }

    #[test]
    fn non_utf8_blob_is_rejected() {
        let blob = BlobResponse { content: "//79".into(), encoding: "base64".into() };
        assert_eq!(decode_blob(&blob), None);
    }

    #[test]
    fn shared_blob_sha_gets_distinct_ids() {
        let mut files = vec![
            FileRecord::with_id("e69de29", "a/__init__.py", ""),
            FileRecord::with_id("e69de29", "b/__init__.py", ""),
            FileRecord::with_id("s-main", "main.py", "print()"),
        ];
        make_ids_unique(&mut files);
        let ids: Vec<&str> = files.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["e69de29", "e69de29:b/__init__.py", "s-main"]);
    }

    #[test]
    fn unknown_encoding_is_rejected() {
        let blob = BlobResponse { content: "# Hello".into(), encoding: "utf-8".into() };
        assert_eq!(decode_blob(&blob), None);
    }
}
