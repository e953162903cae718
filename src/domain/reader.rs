//! Recursive directory reads producing [`DirectoryEntry`] trees

use super::DirectoryEntry;
use crate::error::Result;
use async_trait::async_trait;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Reads a directory into a tree of entries
#[async_trait]
pub trait DirectoryReader: Send + Sync {
    async fn read_dir(&self, path: &Path) -> Result<Vec<DirectoryEntry>>;
}

/// Filesystem-backed reader
#[derive(Debug, Clone, Copy, Default)]
pub struct FsDirectoryReader {
    /// Include entries whose name starts with '.'
    pub show_hidden: bool,
}

impl FsDirectoryReader {
    pub fn new(show_hidden: bool) -> Self {
        Self { show_hidden }
    }
}

#[async_trait]
impl DirectoryReader for FsDirectoryReader {
    async fn read_dir(&self, path: &Path) -> Result<Vec<DirectoryEntry>> {
        let root = path.to_path_buf();
        let show_hidden = self.show_hidden;
        let entries =
            tokio::task::spawn_blocking(move || read_dir_recursive(&root, show_hidden)).await??;
        Ok(entries)
    }
}

/// Reads `dir_path` and all of its subdirectories.
///
/// # Behavior
/// - Fails only if `dir_path` itself cannot be read
/// - Subdirectories that cannot be read are returned with no children
/// - Symlinked directories are listed as files and never followed
/// - Entries whose metadata cannot be read are skipped
pub fn read_dir_recursive(dir_path: &Path, show_hidden: bool) -> io::Result<Vec<DirectoryEntry>> {
    let mut entries = Vec::new();

    for entry_result in fs::read_dir(dir_path)? {
        let entry = match entry_result {
            Ok(e) => e,
            Err(_) => continue,
        };

        let name = entry.file_name().to_string_lossy().into_owned();
        if !show_hidden && name.starts_with('.') {
            continue;
        }

        let file_type = match entry.file_type() {
            Ok(t) => t,
            Err(_) => continue,
        };

        let path: PathBuf = entry.path();
        if file_type.is_dir() {
            let children = match read_dir_recursive(&path, show_hidden) {
                Ok(children) => children,
                Err(e) => {
                    log::debug!("Skipping unreadable directory {}: {}", path.display(), e);
                    Vec::new()
                }
            };
            entries.push(DirectoryEntry::directory(name, path, children));
        } else {
            entries.push(DirectoryEntry::file(name, path));
        }
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn find<'a>(entries: &'a [DirectoryEntry], name: &str) -> &'a DirectoryEntry {
        entries
            .iter()
            .find(|e| e.name == name)
            .unwrap_or_else(|| panic!("missing entry {}", name))
    }

    #[test]
    fn test_reads_nested_tree() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("top.csv"), b"a,b\n1,2\n").unwrap();
        fs::create_dir_all(root.join("sub").join("deeper")).unwrap();
        fs::write(root.join("sub").join("inner.tsv"), b"a\tb\n").unwrap();
        fs::write(root.join("sub").join("deeper").join("x.txt"), b"x").unwrap();

        let entries = read_dir_recursive(root, false).unwrap();
        assert_eq!(entries.len(), 2);

        let top = find(&entries, "top.csv");
        assert!(!top.is_dir());
        assert_eq!(top.path, root.join("top.csv"));

        let sub = find(&entries, "sub");
        assert!(sub.is_dir());
        let deeper = find(sub.children(), "deeper");
        assert_eq!(deeper.children().len(), 1);
        assert_eq!(deeper.children()[0].name, "x.txt");
    }

    #[test]
    fn test_empty_directory_has_empty_children() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("empty")).unwrap();

        let entries = read_dir_recursive(temp_dir.path(), false).unwrap();
        assert_eq!(entries[0].children, Some(vec![]));
    }

    #[test]
    fn test_hidden_entries() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(".hidden.csv"), b"a").unwrap();
        fs::write(temp_dir.path().join("shown.csv"), b"a").unwrap();

        let hidden_skipped = read_dir_recursive(temp_dir.path(), false).unwrap();
        assert_eq!(hidden_skipped.len(), 1);
        assert_eq!(hidden_skipped[0].name, "shown.csv");

        let all = read_dir_recursive(temp_dir.path(), true).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_nonexistent_directory_fails() {
        let result = read_dir_recursive(Path::new("/nonexistent/csvex/dir"), false);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_fs_reader_async() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("one.csv"), b"a").unwrap();

        let reader = FsDirectoryReader::default();
        let entries = reader.read_dir(temp_dir.path()).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "one.csv");
    }

    #[tokio::test]
    async fn test_fs_reader_error_propagates() {
        let reader = FsDirectoryReader::default();
        assert!(reader.read_dir(Path::new("/nonexistent/csvex")).await.is_err());
    }
}
