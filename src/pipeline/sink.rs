use std::sync::{Arc, Mutex};

use crate::app::Result;
use crate::domain::ArticleRecord;
use crate::pipeline::DedupSet;
use crate::staging::StagedWriter;

/// Outcome of offering a record to the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    Accepted,
    Duplicate,
}

/// Where extractors emit records: claims the link in the shared dedup set
/// and stages the record as one step.
///
/// The emit lock is held across claim and append, so two concurrent offers
/// of the same link can never both pass the claim, and a record whose append
/// failed does not stay claimed.
pub struct RecordSink {
    dedup: Arc<DedupSet>,
    writer: Arc<StagedWriter>,
    emit: Mutex<()>,
}

impl RecordSink {
    pub fn new(dedup: Arc<DedupSet>, writer: Arc<StagedWriter>) -> Self {
        Self {
            dedup,
            writer,
            emit: Mutex::new(()),
        }
    }

    pub fn offer(&self, record: &ArticleRecord) -> Result<Offer> {
        let _emit = self.emit.lock().unwrap_or_else(|p| p.into_inner());

        if !self.dedup.try_claim(&record.link) {
            return Ok(Offer::Duplicate);
        }

        if let Err(e) = self.writer.append(record) {
            self.dedup.release(&record.link);
            return Err(e);
        }

        Ok(Offer::Accepted)
    }

    pub fn dedup(&self) -> &DedupSet {
        &self.dedup
    }

    pub fn writer(&self) -> &StagedWriter {
        &self.writer
    }
}
