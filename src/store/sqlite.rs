use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rusqlite_migration::{Migrations, M};

use crate::app::{PipelineError, Result};
use crate::domain::{ArticleRecord, StoredArticle};
use crate::store::ArticleStore;

const ARTICLE_COLUMNS: &str = "id, source, section, headline, description, displayed_time, \
                               category, link, image_link, first_seen_at";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.conn()?;
        migrations
            .to_latest(&mut conn)
            .map_err(|_| PipelineError::Database(rusqlite::Error::InvalidQuery))?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            PipelineError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| s.parse::<DateTime<Utc>>().ok())
    }

    fn row_to_article(row: &Row<'_>) -> rusqlite::Result<StoredArticle> {
        Ok(StoredArticle {
            id: row.get(0)?,
            record: ArticleRecord {
                source: row.get(1)?,
                section: row.get(2)?,
                headline: row.get(3)?,
                description: row.get(4)?,
                time: row.get(5)?,
                category: row.get(6)?,
                link: row.get(7)?,
                image_link: row.get(8)?,
            },
            first_seen_at: row
                .get::<_, String>(9)
                .ok()
                .and_then(|s| Self::parse_datetime(&s))
                .unwrap_or_else(Utc::now),
        })
    }
}

impl ArticleStore for SqliteStore {
    fn insert_if_absent(&self, record: &ArticleRecord) -> Result<bool> {
        let conn = self.conn()?;

        let inserted = conn.execute(
            "INSERT OR IGNORE INTO articles (id, source, section, headline, description, displayed_time,
                                             category, link, image_link, first_seen_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                record.id(),
                record.source,
                record.section,
                record.headline,
                record.description,
                record.time,
                record.category,
                record.link,
                record.image_link,
                Utc::now().to_rfc3339()
            ],
        )?;

        Ok(inserted > 0)
    }

    fn get_by_link(&self, link: &str) -> Result<Option<StoredArticle>> {
        let conn = self.conn()?;

        let result = conn
            .query_row(
                &format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE link = ?1"),
                params![link],
                Self::row_to_article,
            )
            .optional()?;

        Ok(result)
    }

    fn contains_link(&self, link: &str) -> Result<bool> {
        let conn = self.conn()?;

        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM articles WHERE link = ?1)",
            params![link],
            |row| row.get(0),
        )?;

        Ok(exists)
    }

    fn all_links(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare("SELECT link FROM articles")?;
        let links = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;

        Ok(links)
    }

    fn list(&self, source: Option<&str>, limit: usize) -> Result<Vec<StoredArticle>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles
             WHERE (?1 IS NULL OR source = ?1)
             ORDER BY first_seen_at DESC, rowid DESC
             LIMIT ?2"
        ))?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let articles = stmt
            .query_map(params![source, limit], Self::row_to_article)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(articles)
    }

    fn count(&self) -> Result<u64> {
        let conn = self.conn()?;

        let count: i64 = conn.query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_by_source(&self) -> Result<Vec<(String, u64)>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT source, COUNT(*) FROM articles GROUP BY source ORDER BY source",
        )?;
        let counts = stmt
            .query_map([], |row| {
                let source: String = row.get(0)?;
                let count: i64 = row.get(1)?;
                Ok((source, count as u64))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(counts)
    }
}
