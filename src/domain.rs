pub mod reader;

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

pub use reader::{DirectoryReader, FsDirectoryReader};

/// Extensions recognised as tabular files
const TABULAR_EXTENSIONS: [&str; 2] = ["csv", "tsv"];

/// A snapshot of one directory-listing node.
///
/// `children` being present (even empty) marks a directory; absence marks a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub name: String,
    pub path: PathBuf,
    pub children: Option<Vec<DirectoryEntry>>,
}

impl DirectoryEntry {
    pub fn file(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            children: None,
        }
    }

    pub fn directory(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        children: Vec<DirectoryEntry>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            children: Some(children),
        }
    }

    pub fn is_dir(&self) -> bool {
        self.children.is_some()
    }

    pub fn children(&self) -> &[DirectoryEntry] {
        self.children.as_deref().unwrap_or(&[])
    }
}

/// Case-insensitive `.csv` / `.tsv` suffix check
pub fn is_tabular_name(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|ext| {
            TABULAR_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

/// Name ordering used for listings: case-folded first, raw text as tiebreak.
///
/// Folded names compare by code point, so accented letters sort after the
/// ASCII alphabet ("zeta" before "éclair") rather than by locale collation.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Orders directories before files, then by name
pub fn compare_entries(a: &DirectoryEntry, b: &DirectoryEntry) -> Ordering {
    match (a.is_dir(), b.is_dir()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => compare_names(&a.name, &b.name),
    }
}

/// Turns a raw recursive read into a displayable listing.
///
/// Keeps tabular files and directories that still hold at least one kept
/// descendant, at every depth, and sorts each level with [`compare_entries`].
pub fn prepare_listing(entries: Vec<DirectoryEntry>) -> Vec<DirectoryEntry> {
    let mut kept: Vec<DirectoryEntry> = entries
        .into_iter()
        .filter_map(|entry| match entry.children {
            Some(children) => {
                let children = prepare_listing(children);
                if children.is_empty() {
                    None
                } else {
                    Some(DirectoryEntry {
                        children: Some(children),
                        ..entry
                    })
                }
            }
            None if is_tabular_name(&entry.name) => Some(entry),
            None => None,
        })
        .collect();

    kept.sort_by(compare_entries);
    kept
}

/// Case-insensitive substring match; empty text matches every name
pub fn name_matches(name: &str, text: &str) -> bool {
    text.is_empty() || name.to_lowercase().contains(&text.to_lowercase())
}

/// Case-insensitive substring filter on entry names; empty text keeps everything
pub fn filter_entries<'a>(entries: &'a [DirectoryEntry], text: &str) -> Vec<&'a DirectoryEntry> {
    entries
        .iter()
        .filter(|entry| name_matches(&entry.name, text))
        .collect()
}
