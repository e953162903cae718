//! Native folder picker

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Single-selection, directory-only picker
#[async_trait]
pub trait FolderPicker: Send + Sync {
    /// Returns `None` when the user dismisses the dialog
    async fn pick_directory(&self, start: Option<&Path>) -> Result<Option<PathBuf>>;
}

/// System dialog through `rfd`, run on the blocking pool so the event loop keeps going
#[derive(Debug, Clone, Default)]
pub struct NativeFolderPicker {
    title: Option<String>,
}

impl NativeFolderPicker {
    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
        }
    }
}

#[async_trait]
impl FolderPicker for NativeFolderPicker {
    async fn pick_directory(&self, start: Option<&Path>) -> Result<Option<PathBuf>> {
        let start = start.map(Path::to_path_buf);
        let title = self.title.clone();

        tokio::task::spawn_blocking(move || {
            let mut dialog = rfd::FileDialog::new();
            if let Some(title) = title {
                dialog = dialog.set_title(title);
            }
            if let Some(start) = start {
                dialog = dialog.set_directory(start);
            }
            dialog.pick_folder()
        })
        .await
        .map_err(|e| Error::Picker(e.to_string()))
    }
}
