//! Free-text notes attached to opened files

use crate::error::Result;
use crate::store::SettingsStore;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

/// Notes keyed by the absolute path of the file they describe
#[derive(Clone)]
pub struct NoteBook {
    store: Arc<dyn SettingsStore>,
}

impl NoteBook {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    pub async fn load(&self, file: &Path) -> Result<Option<String>> {
        let note = self.store.get(&note_key(file)).await?;
        Ok(match note {
            Some(Value::String(text)) => Some(text),
            _ => None,
        })
    }

    pub async fn save(&self, file: &Path, text: &str) -> Result<()> {
        self.store
            .set(&note_key(file), Value::String(text.to_string()))
            .await
    }
}

fn note_key(file: &Path) -> String {
    file.to_string_lossy().into_owned()
}
