use std::path::Path;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::filter::is_denied;
use crate::error::IngestError;
use crate::types::FileRecord;

/// Files larger than this are skipped on local import.
pub const MAX_LOCAL_FILE_BYTES: u64 = 1024 * 1024;

/// Reads every text file under `root` into fresh records, sorted by path.
///
/// Denylisted directories are pruned before descending. Non-UTF-8 and
/// oversized files are skipped; unreadable entries are logged and skipped.
///
/// # Errors
///
/// `Io` when `root` is not a readable directory, `NoReadableFiles` when
/// nothing survives.
pub fn read_folder(root: &Path) -> Result<Vec<FileRecord>, IngestError> {
    if !root.is_dir() {
        return Err(IngestError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} is not a directory", root.display()),
        )));
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let Some(rel) = relative(root, entry.path()) else {
                return true;
            };
            if entry.file_type().is_dir() {
                !is_denied(&format!("{rel}/"))
            } else {
                !is_denied(&rel)
            }
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(rel) = relative(root, entry.path()) else {
            continue;
        };
        if entry.metadata().map(|m| m.len() > MAX_LOCAL_FILE_BYTES).unwrap_or(true) {
            debug!(path = %rel, "skipping oversized or unstatable file");
            continue;
        }
        match std::fs::read(entry.path()) {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(content) => files.push(FileRecord::new(rel, content)),
                Err(_) => debug!(path = %rel, "skipping non-UTF-8 file"),
            },
            Err(e) => warn!(path = %rel, error = %e, "skipping unreadable file"),
        }
    }

    if files.is_empty() {
        return Err(IngestError::NoReadableFiles);
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));
    info!(root = %root.display(), files = files.len(), "folder imported");
    Ok(files)
}

/// Slash-delimited path of `path` below `root`; `None` for the root itself.
fn relative(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    if rel.as_os_str().is_empty() {
        return None;
    }
    let parts: Vec<String> = rel.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect();
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write(root: &Path, rel: &str, bytes: &[u8]) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, bytes).unwrap();
    }

    #[test]
    fn reads_text_files_and_prunes_denylist() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path();
        write(root, "src/main.rs", b"fn main() {}");
        write(root, "README.md", b"# Hello");
        write(root, "node_modules/x/index.js", b"module.exports = 1");
        write(root, "target/debug/out", b"bin");
        write(root, "Cargo.lock", b"lock");
        write(root, "logo.png", &[0x89, 0x50, 0x4e, 0x47, 0xff, 0xfe]);

        let files = read_folder(root).unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["README.md", "src/main.rs"]);
        assert_eq!(files[1].name, "main.rs");
        assert_eq!(files[1].language, "rs");
    }

    #[test]
    fn empty_folder_has_no_readable_files() {
        let dir = tempfile::TempDir::new().unwrap();
        write(dir.path(), ".git/HEAD", b"ref: refs/heads/main");
        assert!(matches!(read_folder(dir.path()), Err(IngestError::NoReadableFiles)));
    }

    #[test]
    fn missing_root_is_io_error() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(matches!(read_folder(&dir.path().join("absent")), Err(IngestError::Io(_))));
    }
}
