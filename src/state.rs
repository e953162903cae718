//! Shared application state: which directory is browsed and which file is open
//!
//! `AppState` is created once, shared by `Arc`, and is only mutated through
//! its intent methods. Consumers observe it through a `watch` receiver and
//! re-render when it changes.

use crate::error::{Error, Result};
use crate::picker::FolderPicker;
use crate::store::{load_opened_directory, save_opened_directory, SettingsStore};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// What the views read
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppSnapshot {
    pub opened_directory: Option<PathBuf>,
    /// Not required to live under `opened_directory`; drops can open any file
    pub opened_file: Option<PathBuf>,
}

/// Outcome of [`AppState::request_directory`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryRequest {
    Selected(PathBuf),
    Cancelled,
}

#[derive(Debug, Default)]
struct Tracked {
    snapshot: AppSnapshot,
    /// Set once a directory was chosen by the user; hydration no longer applies
    user_chose_directory: bool,
}

pub struct AppState {
    state: watch::Sender<Tracked>,
    picker: Arc<dyn FolderPicker>,
    settings: Arc<dyn SettingsStore>,
    picker_open: AtomicBool,
}

/// Clears the single-flight flag when the picker request ends, however it ends
struct PickerFlight<'a>(&'a AtomicBool);

impl<'a> PickerFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for PickerFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl AppState {
    /// Starts with nothing opened
    pub fn new(picker: Arc<dyn FolderPicker>, settings: Arc<dyn SettingsStore>) -> Self {
        let (state, _) = watch::channel(Tracked::default());
        Self {
            state,
            picker,
            settings,
            picker_open: AtomicBool::new(false),
        }
    }

    pub fn snapshot(&self) -> AppSnapshot {
        self.state.borrow().snapshot.clone()
    }

    /// Receiver that is notified on every observable change
    pub fn subscribe(&self) -> AppStateWatcher {
        AppStateWatcher {
            rx: self.state.subscribe(),
        }
    }

    pub fn is_picker_open(&self) -> bool {
        self.picker_open.load(Ordering::Acquire)
    }

    /// Opens the folder picker and, on a selection, makes it the opened directory.
    ///
    /// Dismissing the picker leaves the state and the settings store untouched.
    /// Only one request may wait on the picker at a time; a concurrent call
    /// fails with [`Error::PickerBusy`].
    pub async fn request_directory(&self) -> Result<DirectoryRequest> {
        let _flight = PickerFlight::acquire(&self.picker_open).ok_or(Error::PickerBusy)?;

        let start = self.snapshot().opened_directory;
        match self.picker.pick_directory(start.as_deref()).await? {
            Some(path) => {
                self.select_directory(path.clone()).await;
                Ok(DirectoryRequest::Selected(path))
            }
            None => {
                log::info!("Directory selection cancelled");
                Ok(DirectoryRequest::Cancelled)
            }
        }
    }

    /// Makes `path` the opened directory and remembers it for the next launch.
    ///
    /// The in-memory change is authoritative; a failed persist is only logged.
    pub async fn select_directory(&self, path: PathBuf) {
        log::info!("Opening directory {}", path.display());
        self.state.send_if_modified(|tracked| {
            tracked.user_chose_directory = true;
            if tracked.snapshot.opened_directory.as_ref() == Some(&path) {
                return false;
            }
            tracked.snapshot.opened_directory = Some(path.clone());
            true
        });

        if let Err(e) = save_opened_directory(self.settings.as_ref(), &path).await {
            log::error!("Could not store preferences: {}", e);
        }
    }

    /// Sets the opened file. No validation is done here.
    pub fn open_file(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        self.state.send_if_modified(|tracked| {
            if tracked.snapshot.opened_file.as_ref() == Some(&path) {
                return false;
            }
            log::info!("Opening file {}", path.display());
            tracked.snapshot.opened_file = Some(path);
            true
        });
    }

    /// Restores the last opened directory from the settings store.
    ///
    /// Applies only while no directory has been chosen by the user, so a
    /// slow store never overrides a fresh selection.
    pub async fn hydrate(&self) {
        let stored = match load_opened_directory(self.settings.as_ref()).await {
            Ok(Some(path)) => path,
            Ok(None) => return,
            Err(e) => {
                log::error!("Could not read preferences: {}", e);
                return;
            }
        };

        let applied = self.state.send_if_modified(|tracked| {
            if tracked.user_chose_directory
                || tracked.snapshot.opened_directory.as_ref() == Some(&stored)
            {
                return false;
            }
            tracked.snapshot.opened_directory = Some(stored.clone());
            true
        });

        if applied {
            log::info!("Restored directory {}", stored.display());
        } else {
            log::debug!("Skipped restoring {}", stored.display());
        }
    }
}

/// Read side of [`AppState`]
pub struct AppStateWatcher {
    rx: watch::Receiver<Tracked>,
}

impl AppStateWatcher {
    /// Waits for the next change and returns the new snapshot.
    ///
    /// Returns `None` once the state has been dropped.
    pub async fn changed(&mut self) -> Option<AppSnapshot> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().snapshot.clone())
    }

    pub fn current(&self) -> AppSnapshot {
        self.rx.borrow().snapshot.clone()
    }

    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }
}
