//! Annotation persistence
//!
//! Annotations live in a durable key-value backend under namespaced keys so
//! they never collide with unrelated entries in the same store.

mod file;
mod memory;

use std::cell::Cell;

pub use file::FileStore;
pub use memory::{MemoryStore, UnavailableStore};

use tracing::{debug, warn};

use crate::config::StorageConfig;
use crate::error::{Error, Result};

/// Key prefix used when none is configured
pub const DEFAULT_KEY_PREFIX: &str = "trace-annotation:";

/// A string key-value backend
pub trait KvStore {
    /// Read a value
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Insert or overwrite a value
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Delete a value; deleting a missing key is not an error
    fn remove(&mut self, key: &str) -> Result<()>;
}

impl<S: KvStore + ?Sized> KvStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

/// Free-text annotations keyed by trace id.
///
/// Whitespace-only text is never stored: saving it deletes the key, so
/// `has(id)` holds exactly when `get(id).trim()` is non-empty. Backend
/// failures are logged and degrade to "no annotation" on read and a no-op on
/// write. Only the first failure is logged at `warn`; later ones go to
/// `debug`.
pub struct AnnotationStore<S = Box<dyn KvStore>> {
    backend: S,
    prefix: String,
    degraded: Cell<bool>,
}

impl<S: KvStore> AnnotationStore<S> {
    /// Create a store with the default key prefix
    pub fn new(backend: S) -> Self {
        Self::with_prefix(backend, DEFAULT_KEY_PREFIX)
    }

    /// Create a store with a custom key prefix
    pub fn with_prefix(backend: S, prefix: impl Into<String>) -> Self {
        Self {
            backend,
            prefix: prefix.into(),
            degraded: Cell::new(false),
        }
    }

    /// Backend key for a trace id
    pub fn key(&self, trace_id: &str) -> String {
        format!("{}{}", self.prefix, trace_id)
    }

    /// Annotation text, `""` when absent or unreadable
    pub fn get(&self, trace_id: &str) -> String {
        match self.backend.get(&self.key(trace_id)) {
            Ok(value) => value.unwrap_or_default(),
            Err(err) => {
                self.report(trace_id, &err, "failed to read annotation");
                String::new()
            }
        }
    }

    /// Save `text` verbatim, or delete the annotation if it is blank
    pub fn set(&mut self, trace_id: &str, text: &str) {
        let key = self.key(trace_id);
        let result = if text.trim().is_empty() {
            debug!(trace_id, "removing annotation");
            self.backend.remove(&key)
        } else {
            debug!(trace_id, len = text.len(), "saving annotation");
            self.backend.set(&key, text)
        };

        if let Err(err) = result {
            self.report(trace_id, &err, "failed to persist annotation");
        }
    }

    /// Whether any backend operation has failed
    pub fn is_degraded(&self) -> bool {
        self.degraded.get()
    }

    /// Whether the trace has a non-blank annotation
    pub fn has(&self, trace_id: &str) -> bool {
        !self.get(trace_id).trim().is_empty()
    }

    /// Number of the given traces that carry a non-blank annotation
    pub fn count_reviewed<'a, I>(&self, trace_ids: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        trace_ids.into_iter().filter(|id| self.has(id)).count()
    }

    /// The underlying backend
    pub fn backend(&self) -> &S {
        &self.backend
    }

    fn report(&self, trace_id: &str, err: &Error, action: &str) {
        if self.degraded.replace(true) {
            debug!(trace_id, error = %err, "{action}");
        } else {
            warn!(trace_id, error = %err, "{action}; further storage errors are logged at debug");
        }
    }
}

/// Open the configured file-backed store.
///
/// If the file cannot be opened the session still runs: annotations are
/// simply not persisted.
pub fn open_annotation_store(config: &StorageConfig) -> AnnotationStore {
    let path = config.resolved_path();
    let backend: Box<dyn KvStore> = match FileStore::open(&path) {
        Ok(store) => Box::new(store),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "annotation storage unavailable");
            Box::new(UnavailableStore)
        }
    };
    AnnotationStore::with_prefix(backend, config.key_prefix.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_set_then_get() {
        let mut store = AnnotationStore::new(MemoryStore::new());
        store.set("t-1", "  needs work\n");
        assert_eq!(store.get("t-1"), "  needs work\n");
        assert!(store.has("t-1"));
        assert_eq!(
            store.backend().get("trace-annotation:t-1").unwrap().as_deref(),
            Some("  needs work\n")
        );
    }

    #[test]
    fn test_blank_text_deletes_key() {
        let mut store = AnnotationStore::new(MemoryStore::new());
        store.set("t-1", "fine");
        store.set("t-1", " \n\t ");
        assert_eq!(store.get("t-1"), "");
        assert!(!store.has("t-1"));
        assert!(store.backend().is_empty());
    }

    #[test]
    fn test_keys_are_namespaced() {
        let mut backend = MemoryStore::new();
        backend.set("t-1", "unrelated").unwrap();
        let mut store = AnnotationStore::with_prefix(backend, "review:");

        assert_eq!(store.get("t-1"), "");
        store.set("t-1", "mine");
        assert_eq!(store.backend().get("t-1").unwrap().as_deref(), Some("unrelated"));
        assert_eq!(store.backend().get("review:t-1").unwrap().as_deref(), Some("mine"));
    }

    #[test]
    fn test_count_reviewed() {
        let mut store = AnnotationStore::new(MemoryStore::new());
        store.set("a", "ok");
        store.set("c", "bad");
        store.set("d", "   ");
        assert_eq!(store.count_reviewed(["a", "b", "c", "d"]), 2);
    }

    #[test]
    fn test_unavailable_backend_degrades() {
        let mut store = AnnotationStore::new(UnavailableStore);
        store.set("t-1", "lost");
        assert_eq!(store.get("t-1"), "");
        assert!(!store.has("t-1"));
        assert_eq!(store.count_reviewed(["t-1"]), 0);
    }

    #[test]
    fn test_open_configured_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            path: Some(dir.path().join("notes.json")),
            key_prefix: "k:".to_string(),
        };
        let mut store = open_annotation_store(&config);
        store.set("t-1", "kept");
        assert_eq!(open_annotation_store(&config).get("t-1"), "kept");
    }

    #[test]
    fn test_open_unreadable_store_degrades() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.json");
        std::fs::write(&path, "[1, 2]").unwrap();
        let config = StorageConfig {
            path: Some(path),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        };
        let mut store = open_annotation_store(&config);
        store.set("t-1", "lost");
        assert_eq!(store.get("t-1"), "");
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn test_unavailable_backend_warns_once() {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .finish();

        let mut store = AnnotationStore::new(UnavailableStore);
        tracing::subscriber::with_default(subscriber, || {
            for _ in 0..100 {
                assert!(!store.has("t-1"));
            }
            store.set("t-1", "lost");
            assert_eq!(store.count_reviewed(["t-1", "t-2"]), 0);
        });

        assert!(store.is_degraded());
        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert_eq!(output.lines().count(), 1, "{output}");
        assert!(output.contains("failed to read annotation"));
    }

    #[test]
    fn test_working_backend_is_not_degraded() {
        let mut store = AnnotationStore::new(MemoryStore::new());
        store.set("t-1", "ok");
        assert_eq!(store.get("t-1"), "ok");
        assert!(!store.is_degraded());
    }

    proptest! {
        #[test]
        fn prop_has_matches_trimmed_emptiness(text in "[ \\t\\na-z]{0,12}") {
            let mut store = AnnotationStore::new(MemoryStore::new());
            store.set("id", &text);
            if text.trim().is_empty() {
                prop_assert!(!store.has("id"));
                prop_assert_eq!(store.get("id"), "");
            } else {
                prop_assert!(store.has("id"));
                prop_assert_eq!(store.get("id"), text);
            }
        }
    }
}
