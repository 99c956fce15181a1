//! In-process backends

use std::collections::HashMap;

use super::KvStore;
use crate::error::{Error, Result};

/// Non-durable backend, used for tests and when persistence is switched off
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is stored
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Backend that fails every operation; stands in when the real store
/// cannot be opened
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableStore;

impl KvStore for UnavailableStore {
    fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(Error::StorageUnavailable)
    }

    fn set(&mut self, _key: &str, _value: &str) -> Result<()> {
        Err(Error::StorageUnavailable)
    }

    fn remove(&mut self, _key: &str) -> Result<()> {
        Err(Error::StorageUnavailable)
    }
}
