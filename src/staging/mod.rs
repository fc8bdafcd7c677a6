//! Durable staging of accepted records.
//!
//! The staging artifact is a header-first CSV file with exactly eight quoted
//! fields per row:
//!
//! ```text
//! "Source","Section","Headline","Description","Time","Category","Link","ImageLink"
//! ```
//!
//! Field values never contain double quotes (normalized to `'`) or line
//! breaks (collapsed to spaces), so every record occupies exactly one line.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use csv::{QuoteStyle, StringRecord, WriterBuilder};
use tracing::{debug, info};

use crate::app::{PipelineError, Result};
use crate::domain::ArticleRecord;

pub const STAGING_HEADER: [&str; FIELD_COUNT] = [
    "Source",
    "Section",
    "Headline",
    "Description",
    "Time",
    "Category",
    "Link",
    "ImageLink",
];

pub const FIELD_COUNT: usize = 8;

/// Index of the `Link` column.
pub const LINK_COLUMN: usize = 6;

/// Normalize one field so it cannot break the one-record-per-line format.
pub fn sanitize_field(value: &str) -> String {
    value
        .replace('"', "'")
        .replace(['\r', '\n'], " ")
        .trim()
        .to_string()
}

pub fn to_row(record: &ArticleRecord) -> [String; FIELD_COUNT] {
    [
        sanitize_field(&record.source),
        sanitize_field(&record.section),
        sanitize_field(&record.headline),
        sanitize_field(&record.description),
        sanitize_field(&record.time),
        sanitize_field(&record.category),
        sanitize_field(&record.link),
        sanitize_field(&record.image_link),
    ]
}

/// Decode a staged row. Rows with fewer than eight fields are malformed;
/// extra trailing fields are ignored.
pub fn from_row(row: &StringRecord) -> std::result::Result<ArticleRecord, String> {
    if row.len() < FIELD_COUNT {
        return Err(format!(
            "expected {} fields, found {}",
            FIELD_COUNT,
            row.len()
        ));
    }

    let field = |i: usize| row.get(i).unwrap_or("").trim().to_string();
    Ok(ArticleRecord {
        source: field(0),
        section: field(1),
        headline: field(2),
        description: field(3),
        time: field(4),
        category: field(5),
        link: field(LINK_COLUMN),
        image_link: field(7),
    })
}

/// Append-only writer for the staging artifact.
///
/// Every `append` writes and flushes one row, so a crash loses at most the
/// row in flight. Safe to share between threads.
pub struct StagedWriter {
    path: PathBuf,
    inner: Mutex<Option<csv::Writer<File>>>,
    rows: Mutex<u64>,
}

impl StagedWriter {
    /// Create (or truncate) the artifact at `path` and write the header.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(&path)?;
        let mut writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Always)
            .from_writer(file);
        writer.write_record(STAGING_HEADER)?;
        writer.flush()?;

        info!("Staging articles to {}", path.display());

        Ok(Self {
            path,
            inner: Mutex::new(Some(writer)),
            rows: Mutex::new(0),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &ArticleRecord) -> Result<()> {
        let mut guard = self.lock()?;
        let writer = guard
            .as_mut()
            .ok_or_else(|| PipelineError::StagingClosed(self.path.display().to_string()))?;

        writer.write_record(to_row(record))?;
        writer
            .flush()
            .map_err(|e| PipelineError::Staging(e.into()))?;

        if let Ok(mut rows) = self.rows.lock() {
            *rows += 1;
        }
        debug!("Staged {} ({})", record.link, record.source);
        Ok(())
    }

    /// Flush and finalize the artifact. Calling it again is a no-op.
    pub fn close(&self) -> Result<()> {
        let mut guard = self.lock()?;
        if let Some(mut writer) = guard.take() {
            writer
                .flush()
                .map_err(|e| PipelineError::Staging(e.into()))?;
            info!(
                "Closed staging artifact {} ({} rows)",
                self.path.display(),
                self.rows_written()
            );
        }
        Ok(())
    }

    pub fn rows_written(&self) -> u64 {
        self.rows.lock().map(|rows| *rows).unwrap_or(0)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<csv::Writer<File>>>> {
        self.inner
            .lock()
            .map_err(|_| PipelineError::StagingClosed(format!("{} (writer poisoned)", self.path.display())))
    }
}
