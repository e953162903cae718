//! Request/response calls into the tabular-parsing and code-execution engines

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::Stdio;

/// Parse request for one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvRequest {
    pub path: PathBuf,
    /// Up to two characters; `,` means "decide from the extension"
    pub delimiter: String,
}

/// Parsed preview of a tabular file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvData {
    pub file_size: u64,
    /// Header row followed by the first records
    pub lines: Vec<Vec<String>>,
    pub fields: Vec<String>,
}

/// Picks the field delimiter for a file.
///
/// A custom delimiter other than `,` wins (`\t` spelled out means tab).
/// Otherwise the extension decides: `tsv` is tab-separated, anything else
/// comma-separated. A file with no extension is rejected.
pub fn resolve_delimiter(path: &Path, custom: &str) -> Result<u8> {
    let custom = custom_delimiter(custom);
    if custom != b',' {
        return Ok(custom);
    }

    match path.extension().and_then(OsStr::to_str) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => Ok(b'\t'),
        Some(_) => Ok(b','),
        None => Err(Error::UnsupportedExtension(path.to_path_buf())),
    }
}

fn custom_delimiter(s: &str) -> u8 {
    if s == "\\t" {
        return b'\t';
    }
    match s.chars().next() {
        Some(c) if c.is_ascii() => c as u8,
        _ => b',',
    }
}

/// Reads the header and up to `preview_rows` records of a delimited file
pub fn read_preview(request: &CsvRequest, preview_rows: usize) -> Result<CsvData> {
    let delimiter = resolve_delimiter(&request.path, &request.delimiter)?;
    let file = File::open(&request.path)?;
    let file_size = file.metadata()?.len();

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(file);

    let fields: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut lines = Vec::with_capacity(preview_rows + 1);
    lines.push(fields.clone());
    for record in reader.records().take(preview_rows) {
        lines.push(record?.iter().map(str::to_string).collect());
    }

    Ok(CsvData {
        file_size,
        lines,
        fields,
    })
}

/// The tabular-parsing engine
#[async_trait]
pub trait TabularEngine: Send + Sync {
    async fn open(&self, request: &CsvRequest) -> Result<CsvData>;
}

/// `csv`-crate engine that parses on the blocking pool
#[derive(Debug, Clone, Copy)]
pub struct CsvEngine {
    preview_rows: usize,
}

impl CsvEngine {
    pub fn new(preview_rows: usize) -> Self {
        Self { preview_rows }
    }
}

impl Default for CsvEngine {
    fn default() -> Self {
        Self::new(10)
    }
}

#[async_trait]
impl TabularEngine for CsvEngine {
    async fn open(&self, request: &CsvRequest) -> Result<CsvData> {
        let request = request.clone();
        let preview_rows = self.preview_rows;
        tokio::task::spawn_blocking(move || read_preview(&request, preview_rows)).await?
    }
}

/// The code-execution engine
#[async_trait]
pub trait CodeRunner: Send + Sync {
    /// Captured stdout on success
    async fn execute(&self, code: &str) -> Result<String>;
}

/// Runs code through `<program> -c <code>`
#[derive(Debug, Clone)]
pub struct PythonRunner {
    program: String,
}

impl PythonRunner {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for PythonRunner {
    fn default() -> Self {
        Self::new("python")
    }
}

#[async_trait]
impl CodeRunner for PythonRunner {
    async fn execute(&self, code: &str) -> Result<String> {
        log::debug!("Executing {} bytes of code with {}", code.len(), self.program);
        let output = tokio::process::Command::new(&self.program)
            .arg("-c")
            .arg(code)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(Error::Execution(
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ))
        }
    }
}
