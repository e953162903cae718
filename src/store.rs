//! Persisted key-value settings stores
//!
//! Two named stores are used by the application: one remembering the last
//! opened directory and one holding free-text notes per file. Both are plain
//! JSON objects on disk, loaded lazily and written through on every `set`.

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Key under which the last opened directory is stored
pub const OPENED_DIR_KEY: &str = "openedDir";

/// Async get/set of opaque values keyed by string
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Returns `None` when the key is absent
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Stores the value and persists it before returning
    async fn set(&self, key: &str, value: Value) -> Result<()>;
}

/// Settings store backed by a single JSON object file
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: Mutex<Option<Map<String, Value>>>,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            values: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_from_disk(&self) -> Result<Map<String, Value>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };

        if contents.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str(&contents)? {
            Value::Object(map) => Ok(map),
            other => Err(Error::Store(format!(
                "{} does not hold a JSON object (found {})",
                self.path.display(),
                type_name(&other)
            ))),
        }
    }
}

#[async_trait]
impl SettingsStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let mut guard = self.values.lock().await;
        if guard.is_none() {
            *guard = Some(self.read_from_disk().await?);
        }
        Ok(guard.as_ref().and_then(|map| map.get(key).cloned()))
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut guard = self.values.lock().await;
        let mut map = match guard.take() {
            Some(map) => map,
            None => self.read_from_disk().await?,
        };
        map.insert(key.to_string(), value);

        let serialized = serde_json::to_string_pretty(&map);
        // Keep the in-memory view even if the write below fails
        *guard = Some(map);
        let serialized = serialized?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, serialized).await?;
        Ok(())
    }
}

/// In-process store, used when no persistence is wanted
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn is_empty(&self) -> bool {
        self.values.lock().await.is_empty()
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.values.lock().await.insert(key.to_string(), value);
        Ok(())
    }
}

/// Reads the last opened directory; non-string values are treated as absent
pub async fn load_opened_directory(store: &dyn SettingsStore) -> Result<Option<PathBuf>> {
    match store.get(OPENED_DIR_KEY).await? {
        Some(Value::String(path)) => Ok(Some(PathBuf::from(path))),
        Some(other) => {
            log::warn!(
                "Ignoring {} setting of unexpected type {}",
                OPENED_DIR_KEY,
                type_name(&other)
            );
            Ok(None)
        }
        None => Ok(None),
    }
}

pub async fn save_opened_directory(store: &dyn SettingsStore, path: &Path) -> Result<()> {
    store
        .set(
            OPENED_DIR_KEY,
            Value::String(path.to_string_lossy().into_owned()),
        )
        .await
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
