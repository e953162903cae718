//! Csvex - a terminal explorer for directories of CSV/TSV files
//!
//! This crate provides the core of the Csvex application: the shared
//! "opened directory / opened file" state, the directory navigation model,
//! the dashboard models for the opened file and the subscriptions that feed
//! them (keyboard shortcuts and file drops).

pub mod app;
pub mod bridge;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod domain;
pub mod error;
pub mod navigation;
pub mod notes;
pub mod picker;
pub mod state;
pub mod store;
pub mod subscriptions;
pub mod tui;

// Re-export primary types for convenience
pub use app::{App, Collaborators};
pub use config::{StorePaths, UserConfig};
pub use domain::{DirectoryEntry, DirectoryReader, FsDirectoryReader};
pub use error::{Error, Result};
pub use navigation::NavigationModel;
pub use state::{AppSnapshot, AppState, DirectoryRequest};
