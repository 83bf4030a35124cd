/// A change to a persisted key. `key == None` means the whole area was cleared.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageEvent {
    pub origin: String,
    pub key: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

impl StorageEvent {
    pub fn is_clear(&self) -> bool {
        self.key.is_none()
    }

    pub fn is_removal(&self) -> bool {
        self.key.is_some() && self.new_value.is_none()
    }
}
