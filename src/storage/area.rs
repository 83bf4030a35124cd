use anyhow::Result;

/// One origin's durable key/value store, shaped like the DOM Storage API.
///
/// Values are whole strings; a write always replaces the previous value of
/// the key. Implementations must be shareable across tasks.
pub trait StorageArea: Send + Sync {
    /// Current value of `key`.
    fn get_item(&self, key: &str) -> Option<String>;

    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Removing an absent key is not an error.
    fn remove_item(&self, key: &str) -> Result<()>;

    fn clear(&self) -> Result<()>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys in ascending order.
    fn keys(&self) -> Vec<String>;
}
