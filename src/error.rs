//! Crate-wide error type

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the explorer core and its collaborators
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Settings store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Folder picker failed: {0}")]
    Picker(String),

    /// A directory request is already waiting on the picker
    #[error("A folder picker is already open")]
    PickerBusy,

    #[error("Unsupported extension: {}", .0.display())]
    UnsupportedExtension(PathBuf),

    /// The execution engine ran but reported failure; holds its stderr
    #[error("Execution failed: {0}")]
    Execution(String),

    #[error("Invalid shortcut '{0}'")]
    Shortcut(String),

    #[error("Background task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Task(err.to_string())
    }
}
