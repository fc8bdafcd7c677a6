use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One normalized article as extracted from a source page.
///
/// Optional fields use the empty string for "absent". `link` is the
/// canonical, absolute URL and the natural key of the record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// Staged source label, e.g. `BBC`.
    pub source: String,
    pub section: String,
    pub headline: String,
    pub description: String,
    /// Timestamp text as displayed by the source; not parsed.
    pub time: String,
    pub category: String,
    pub link: String,
    pub image_link: String,
}

impl ArticleRecord {
    pub fn new(source: impl Into<String>, headline: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            headline: headline.into(),
            link: link.into(),
            ..Default::default()
        }
    }

    /// Deterministic id derived from the canonical link
    pub fn id(&self) -> String {
        Self::generate_id(&self.link)
    }

    pub fn generate_id(link: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(link.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Both required fields are present and the link is absolute.
    pub fn is_acceptable(&self) -> bool {
        !self.headline.trim().is_empty()
            && (self.link.starts_with("http://") || self.link.starts_with("https://"))
    }
}

/// An article as persisted by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredArticle {
    pub id: String,
    pub record: ArticleRecord,
    pub first_seen_at: DateTime<Utc>,
}
