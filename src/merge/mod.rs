//! Idempotent bulk merge of a staging artifact into the article store.
//!
//! Each well-formed row is offered to [`ArticleStore::insert_if_absent`]:
//! unknown links are inserted, known links are left untouched
//! (first-seen-wins). Merging the same artifact twice therefore inserts
//! nothing on the second pass.

use std::path::Path;

use csv::ReaderBuilder;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::app::{MergeFailure, PipelineError};
use crate::domain::ArticleRecord;
use crate::staging;
use crate::store::ArticleStore;

/// Malformed rows logged individually before switching to debug level.
const LOGGED_MALFORMED_ROWS: u64 = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Data rows read (header excluded).
    pub processed: u64,
    /// Rows inserted as new articles.
    pub accepted: u64,
    /// Well-formed rows whose link was already stored.
    pub duplicates: u64,
    /// Malformed rows, never persisted.
    pub rejected: u64,
}

pub struct Merger<'a, S: ArticleStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: ArticleStore + ?Sized> Merger<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn merge<P: AsRef<Path>>(&self, path: P) -> std::result::Result<MergeReport, MergeFailure> {
        let path = path.as_ref();
        let mut report = MergeReport::default();

        info!("Merging staged articles from {}", path.display());

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .map_err(|e| MergeFailure {
                partial: report,
                cause: e.into(),
            })?;

        for (index, result) in reader.records().enumerate() {
            // Line 1 is the header
            let line = index as u64 + 2;

            let decoded = match result {
                Ok(row) => staging::from_row(&row).and_then(validate),
                Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => {
                    return Err(MergeFailure {
                        partial: report,
                        cause: e.into(),
                    });
                }
                Err(e) => Err(e.to_string()),
            };

            let record = match decoded {
                Ok(record) => record,
                Err(reason) => {
                    report.processed += 1;
                    report.rejected += 1;
                    let err = PipelineError::MalformedRow { line, reason };
                    if report.rejected <= LOGGED_MALFORMED_ROWS {
                        warn!("Skipping row: {}", err);
                    } else {
                        debug!("Skipping row: {}", err);
                    }
                    continue;
                }
            };

            match self.store.insert_if_absent(&record) {
                Ok(true) => {
                    report.accepted += 1;
                    debug!("Inserted {}", record.link);
                }
                Ok(false) => {
                    report.duplicates += 1;
                }
                Err(cause) => {
                    warn!(
                        "Store failure at line {} after {} rows: {}",
                        line, report.processed, cause
                    );
                    return Err(MergeFailure {
                        partial: report,
                        cause,
                    });
                }
            }
            report.processed += 1;
        }

        info!(
            "Merge complete: {} processed, {} inserted, {} already stored, {} rejected",
            report.processed, report.accepted, report.duplicates, report.rejected
        );

        Ok(report)
    }
}

fn validate(record: ArticleRecord) -> std::result::Result<ArticleRecord, String> {
    if record.headline.is_empty() {
        return Err("empty headline".into());
    }
    if record.link.is_empty() {
        return Err("empty link".into());
    }
    if !record.is_acceptable() {
        return Err(format!("link is not absolute: {}", record.link));
    }
    Ok(record)
}
