//! Raw string key-value backends
//!
//! The typed [`Storage`](super::Storage) layer sits on anything that can get,
//! set and remove text values by key.

use std::collections::HashMap;
use std::sync::Mutex;

use super::error::{StoreError, StoreResult};

/// One pending write against a backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KvWrite {
    Set { key: String, value: String },
    Remove { key: String },
}

impl KvWrite {
    pub fn set(key: &str, value: impl Into<String>) -> Self {
        KvWrite::Set {
            key: key.to_string(),
            value: value.into(),
        }
    }

    pub fn remove(key: &str) -> Self {
        KvWrite::Remove {
            key: key.to_string(),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            KvWrite::Set { key, .. } | KvWrite::Remove { key } => key,
        }
    }
}

/// Synchronous text key-value store
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>>;

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Removing a missing key is not an error
    fn remove_item(&self, key: &str) -> StoreResult<()>;

    /// Apply `writes` in order.
    ///
    /// The default applies them one by one, so a failure part way leaves the
    /// earlier writes in place. Backends that can should override this and
    /// apply the whole batch or nothing.
    fn write_batch(&self, writes: &[KvWrite]) -> StoreResult<()> {
        for write in writes {
            match write {
                KvWrite::Set { key, value } => self.set_item(key, value)?,
                KvWrite::Remove { key } => self.remove_item(key)?,
            }
        }
        Ok(())
    }
}

/// Process-local store, lost on exit
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing records
    pub fn with_items<I, K, V>(items: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let items = items
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            items: Mutex::new(items),
        }
    }

    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.items.lock().map_err(|_| StoreError::LockPoisoned)?.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        let items = self.items.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut items = self.items.lock().map_err(|_| StoreError::LockPoisoned)?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StoreResult<()> {
        let mut items = self.items.lock().map_err(|_| StoreError::LockPoisoned)?;
        items.remove(key);
        Ok(())
    }

    // Single lock for the whole batch; nothing in between can fail.
    fn write_batch(&self, writes: &[KvWrite]) -> StoreResult<()> {
        let mut items = self.items.lock().map_err(|_| StoreError::LockPoisoned)?;
        for write in writes {
            match write {
                KvWrite::Set { key, value } => {
                    items.insert(key.clone(), value.clone());
                }
                KvWrite::Remove { key } => {
                    items.remove(key);
                }
            }
        }
        Ok(())
    }
}
