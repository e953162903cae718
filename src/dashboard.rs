//! Presentation models for the opened file: parsed preview, note, code runner
//!
//! Failures from the parsing and execution engines end up as explicit
//! `Failed` states so the views can show them instead of stale data.

use crate::bridge::{CsvData, CsvRequest};
use crate::domain::is_tabular_name;
use crate::error::Result;
use std::path::{Path, PathBuf};

/// Longest delimiter accepted from the user
pub const MAX_DELIMITER_LEN: usize = 2;

pub const DEFAULT_DELIMITER: &str = ",";

/// Whether the dashboard should hand this file to the parsing engine
pub fn is_tabular_path(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(is_tabular_name)
        .unwrap_or(false)
}

/// Clamps user input to a usable delimiter
pub fn normalize_delimiter(input: &str) -> String {
    let trimmed: String = input.chars().take(MAX_DELIMITER_LEN).collect();
    if trimmed.is_empty() {
        DEFAULT_DELIMITER.to_string()
    } else {
        trimmed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableState {
    /// No file opened
    Idle,
    /// The opened file is not `.csv`/`.tsv`
    NotTabular,
    Loading,
    Ready(CsvData),
    Failed(String),
}

/// A parse the owner should run and hand back to [`DashboardModel::apply_table`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRequest {
    pub id: u64,
    pub request: CsvRequest,
}

#[derive(Debug)]
pub struct DashboardModel {
    file: Option<PathBuf>,
    delimiter: String,
    table: TableState,
    note: Option<String>,
    next_id: u64,
    pending: Option<u64>,
}

impl Default for DashboardModel {
    fn default() -> Self {
        Self::new(DEFAULT_DELIMITER)
    }
}

impl DashboardModel {
    pub fn new(delimiter: &str) -> Self {
        Self {
            file: None,
            delimiter: normalize_delimiter(delimiter),
            table: TableState::Idle,
            note: None,
            next_id: 0,
            pending: None,
        }
    }

    pub fn file(&self) -> Option<&PathBuf> {
        self.file.as_ref()
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    pub fn table(&self) -> &TableState {
        &self.table
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    /// Follows the opened file
    pub fn set_file(&mut self, file: Option<PathBuf>) -> Option<TableRequest> {
        if file == self.file {
            return None;
        }
        self.file = file;
        self.note = None;
        self.reload()
    }

    /// Changes the delimiter and re-parses the current file
    pub fn set_delimiter(&mut self, input: &str) -> Option<TableRequest> {
        let delimiter = normalize_delimiter(input);
        if delimiter == self.delimiter {
            return None;
        }
        self.delimiter = delimiter;
        self.reload()
    }

    pub fn reload(&mut self) -> Option<TableRequest> {
        self.pending = None;
        let path = match &self.file {
            None => {
                self.table = TableState::Idle;
                return None;
            }
            Some(path) if !is_tabular_path(path) => {
                self.table = TableState::NotTabular;
                return None;
            }
            Some(path) => path.clone(),
        };

        self.next_id += 1;
        self.pending = Some(self.next_id);
        self.table = TableState::Loading;
        Some(TableRequest {
            id: self.next_id,
            request: CsvRequest {
                path,
                delimiter: self.delimiter.clone(),
            },
        })
    }

    /// Applies a parse result; results of superseded requests are ignored
    pub fn apply_table(&mut self, id: u64, result: Result<CsvData>) -> bool {
        if self.pending != Some(id) {
            return false;
        }
        self.pending = None;
        self.table = match result {
            Ok(data) => TableState::Ready(data),
            Err(e) => {
                log::warn!("Failed to parse {:?}: {}", self.file, e);
                TableState::Failed(e.to_string())
            }
        };
        true
    }

    /// Applies a loaded note if it still belongs to the opened file
    pub fn apply_note(&mut self, file: &Path, note: Option<String>) -> bool {
        if self.file.as_deref() != Some(file) {
            return false;
        }
        self.note = note;
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionState {
    Idle,
    Running,
    Done(String),
    Failed(String),
}

/// Scratch buffer for the code-execution engine
#[derive(Debug)]
pub struct ExecutorModel {
    pub code: String,
    state: ExecutionState,
}

impl Default for ExecutorModel {
    fn default() -> Self {
        Self {
            code: "print(\"Hello world\")".to_string(),
            state: ExecutionState::Idle,
        }
    }
}

impl ExecutorModel {
    pub fn state(&self) -> &ExecutionState {
        &self.state
    }

    /// Code to run, or `None` if nothing should start
    pub fn begin(&mut self) -> Option<String> {
        if self.state == ExecutionState::Running || self.code.trim().is_empty() {
            return None;
        }
        self.state = ExecutionState::Running;
        Some(self.code.clone())
    }

    pub fn finish(&mut self, result: Result<String>) {
        self.state = match result {
            Ok(output) => ExecutionState::Done(output),
            Err(e) => ExecutionState::Failed(e.to_string()),
        };
    }
}
