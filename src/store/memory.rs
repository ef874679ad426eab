//! In-memory store — for tests and pipelines that need no durability.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::traits::SettingsStore;
use crate::error::StoreError;

/// HashMap-backed settings store. Values do not survive the process.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, serde_json::Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn read(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        Ok(self
            .values
            .lock()
            .expect("store mutex poisoned")
            .get(key)
            .cloned())
    }

    async fn write(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError> {
        self.values
            .lock()
            .expect("store mutex poisoned")
            .insert(key.to_string(), value);
        Ok(())
    }
}
