pub mod lazy;
pub mod sqlite;

use crate::app::Result;
use crate::domain::{ArticleRecord, StoredArticle};

pub use lazy::LazyStore;
pub use sqlite::SqliteStore;

/// Persistent article collection keyed by canonical link.
pub trait ArticleStore {
    /// Set-on-insert upsert: stores the record only when no article with the
    /// same link exists. Returns `true` when a row was inserted.
    fn insert_if_absent(&self, record: &ArticleRecord) -> Result<bool>;

    fn get_by_link(&self, link: &str) -> Result<Option<StoredArticle>>;
    fn contains_link(&self, link: &str) -> Result<bool>;
    fn all_links(&self) -> Result<Vec<String>>;

    /// Newest first. `source` filters on the staged source label.
    fn list(&self, source: Option<&str>, limit: usize) -> Result<Vec<StoredArticle>>;

    fn count(&self) -> Result<u64>;
    fn count_by_source(&self) -> Result<Vec<(String, u64)>>;
}
