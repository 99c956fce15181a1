//! Durable JSON-file backend

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, info};

use super::KvStore;
use crate::error::{Error, Result};

/// Key-value store persisted as a single JSON object.
///
/// Every write rewrites the file through a temporary sibling and a rename,
/// so a crash never leaves a half-written store behind. Entries this
/// process did not write are kept as they are.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Map<String, Value>,
}

impl FileStore {
    /// Open the store at `path`, starting empty if the file does not exist
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => Map::new(),
            Ok(raw) => match serde_json::from_str::<Value>(&raw)? {
                Value::Object(map) => map,
                _ => {
                    return Err(Error::storage(format!(
                        "{} does not contain a JSON object",
                        path.display()
                    )))
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(err) => return Err(err.into()),
        };

        info!(path = %path.display(), entries = entries.len(), "opened annotation store");
        Ok(Self { path, entries })
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, serde_json::to_vec_pretty(&self.entries)?)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), "annotation store written");
        Ok(())
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .entries
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let previous = self
            .entries
            .insert(key.to_string(), Value::String(value.to_string()));
        if let Err(err) = self.persist() {
            match previous {
                Some(old) => self.entries.insert(key.to_string(), old),
                None => self.entries.remove(key),
            };
            return Err(err);
        }
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let Some(previous) = self.entries.remove(key) else {
            return Ok(());
        };
        if let Err(err) = self.persist() {
            self.entries.insert(key.to_string(), previous);
            return Err(err);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::AnnotationStore;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_opens_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path().join("annotations.json")).unwrap();
        assert_eq!(store.get("anything").unwrap(), None);
    }

    #[test]
    fn test_annotations_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("annotations.json");

        let mut store = AnnotationStore::new(FileStore::open(&path).unwrap());
        store.set("t-1", "hallucinated the API");
        store.set("t-2", "fine");
        store.set("t-2", "");

        let reopened = AnnotationStore::new(FileStore::open(&path).unwrap());
        assert_eq!(reopened.get("t-1"), "hallucinated the API");
        assert!(!reopened.has("t-2"));
    }

    #[test]
    fn test_unrelated_entries_are_preserved() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("annotations.json");
        fs::write(&path, r#"{"theme": {"dark": true}, "trace-annotation:a": "old"}"#).unwrap();

        let mut store = FileStore::open(&path).unwrap();
        store.set("trace-annotation:a", "new").unwrap();

        let raw: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["theme"], serde_json::json!({"dark": true}));
        assert_eq!(raw["trace-annotation:a"], "new");
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("annotations.json");
        fs::write(&path, "[1, 2]").unwrap();
        assert!(matches!(FileStore::open(&path), Err(Error::Storage(_))));

        fs::write(&path, "{not json").unwrap();
        assert!(matches!(FileStore::open(&path), Err(Error::Serialization(_))));
    }

    #[test]
    fn test_removing_missing_key_does_not_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("annotations.json");
        let mut store = FileStore::open(&path).unwrap();
        store.remove("nope").unwrap();
        assert!(!path.exists());
    }
}
