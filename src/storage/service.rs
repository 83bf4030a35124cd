use super::area::StorageArea;
use super::event::StorageEvent;
use crate::DEFAULT_CHANNEL_CAPACITY;
use anyhow::Result;
use std::fmt::Debug;
use std::sync::Arc;
use tokio::sync::broadcast;

/// A handle for receiving storage change notifications.
pub type Subscription = broadcast::Receiver<StorageEvent>;

#[derive(Debug)]
struct StorageBus {
    tx: broadcast::Sender<StorageEvent>,
}

impl Default for StorageBus {
    fn default() -> Self {
        let (tx, _rx) = broadcast::channel(DEFAULT_CHANNEL_CAPACITY);
        Self { tx }
    }
}

impl StorageBus {
    fn subscribe(&self) -> Subscription {
        self.tx.subscribe()
    }
    fn publish(&self, ev: StorageEvent) {
        // send() only fails when nobody is subscribed
        let _ = self.tx.send(ev);
    }
}

/// Durable storage for one origin, with change notifications.
#[derive(Clone)]
pub struct StorageService {
    area: Arc<dyn StorageArea>,
    bus: Arc<StorageBus>,
}

impl Debug for StorageService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageService").finish_non_exhaustive()
    }
}

impl StorageService {
    /// Wraps `area` so that every mutation is published to subscribers.
    pub fn new(area: Arc<dyn StorageArea>, origin: &url::Origin) -> Self {
        let bus = Arc::new(StorageBus::default());
        let area: Arc<dyn StorageArea> = Arc::new(NotifyingArea {
            inner: area,
            origin: origin.ascii_serialization(),
            bus: bus.clone(),
        });
        Self { area, bus }
    }

    pub fn subscribe(&self) -> Subscription {
        self.bus.subscribe()
    }

    pub fn area(&self) -> Arc<dyn StorageArea> {
        self.area.clone()
    }
}

struct NotifyingArea {
    inner: Arc<dyn StorageArea>,
    origin: String,
    bus: Arc<StorageBus>,
}

impl NotifyingArea {
    fn publish(&self, key: Option<&str>, old_value: Option<String>, new_value: Option<&str>) {
        self.bus.publish(StorageEvent {
            origin: self.origin.clone(),
            key: key.map(str::to_string),
            old_value,
            new_value: new_value.map(str::to_string),
        });
    }
}

impl StorageArea for NotifyingArea {
    fn get_item(&self, key: &str) -> Option<String> {
        self.inner.get_item(key)
    }
    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let old = self.inner.get_item(key);
        self.inner.set_item(key, value)?;
        self.publish(Some(key), old, Some(value));
        Ok(())
    }
    fn remove_item(&self, key: &str) -> Result<()> {
        let old = self.inner.get_item(key);
        self.inner.remove_item(key)?;
        // Removing an absent key is not a change.
        if old.is_some() {
            self.publish(Some(key), old, None);
        }
        Ok(())
    }
    fn clear(&self) -> Result<()> {
        self.inner.clear()?;
        self.publish(None, None, None);
        Ok(())
    }
    fn len(&self) -> usize {
        self.inner.len()
    }
    fn keys(&self) -> Vec<String> {
        self.inner.keys()
    }
}
