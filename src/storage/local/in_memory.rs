use crate::storage::area::StorageArea;
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::sync::Mutex;

/// In‑memory storage area (no persistence). Used as a default when no durable
/// store is configured, and for private sessions.
#[derive(Default)]
pub struct InMemoryArea {
    map: Mutex<HashMap<String, String>>,
}

impl InMemoryArea {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an area pre-filled with `items`.
    pub fn with_items<'a>(items: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let map = items
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self { map: Mutex::new(map) }
    }
}

impl StorageArea for InMemoryArea {
    fn get_item(&self, key: &str) -> Option<String> {
        self.map.lock().ok()?.get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.map
            .lock()
            .map_err(|_| anyhow!("storage lock poisoned"))?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.map
            .lock()
            .map_err(|_| anyhow!("storage lock poisoned"))?
            .remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.map
            .lock()
            .map_err(|_| anyhow!("storage lock poisoned"))?
            .clear();
        Ok(())
    }

    fn len(&self) -> usize {
        self.map.lock().map(|m| m.len()).unwrap_or(0)
    }

    fn keys(&self) -> Vec<String> {
        let mut v: Vec<String> = match self.map.lock() {
            Ok(m) => m.keys().cloned().collect(),
            Err(_) => return vec![],
        };
        v.sort_unstable();
        v
    }
}
