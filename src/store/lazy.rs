use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::info;

use crate::app::{PipelineError, Result};
use crate::domain::{ArticleRecord, StoredArticle};
use crate::store::{ArticleStore, SqliteStore};

/// Store handle that opens the database on first use and keeps the
/// connection for the rest of the process. A failed open is retried on the
/// next call.
pub struct LazyStore {
    path: PathBuf,
    inner: Mutex<Option<Arc<SqliteStore>>>,
}

impl LazyStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            inner: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.inner.lock().map(|guard| guard.is_some()).unwrap_or(false)
    }

    fn get(&self) -> Result<Arc<SqliteStore>> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|e| PipelineError::Other(format!("Store handle poisoned: {}", e)))?;

        if let Some(store) = guard.as_ref() {
            return Ok(store.clone());
        }

        info!("Opening article store at {}", self.path.display());
        let store = Arc::new(SqliteStore::new(&self.path)?);
        *guard = Some(store.clone());
        Ok(store)
    }
}

impl ArticleStore for LazyStore {
    fn insert_if_absent(&self, record: &ArticleRecord) -> Result<bool> {
        self.get()?.insert_if_absent(record)
    }

    fn get_by_link(&self, link: &str) -> Result<Option<StoredArticle>> {
        self.get()?.get_by_link(link)
    }

    fn contains_link(&self, link: &str) -> Result<bool> {
        self.get()?.contains_link(link)
    }

    fn all_links(&self) -> Result<Vec<String>> {
        self.get()?.all_links()
    }

    fn list(&self, source: Option<&str>, limit: usize) -> Result<Vec<StoredArticle>> {
        self.get()?.list(source, limit)
    }

    fn count(&self) -> Result<u64> {
        self.get()?.count()
    }

    fn count_by_source(&self) -> Result<Vec<(String, u64)>> {
        self.get()?.count_by_source()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opens_on_first_use_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.db");
        let store = LazyStore::new(&path);

        assert!(!store.is_open());
        assert!(!path.exists());

        store
            .insert_if_absent(&ArticleRecord::new("BBC", "Headline", "https://x/a1"))
            .unwrap();
        assert!(store.is_open());
        assert!(path.exists());
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_open_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened as a database file
        let store = LazyStore::new(dir.path());

        assert!(store.count().is_err());
        assert!(!store.is_open());
    }
}
