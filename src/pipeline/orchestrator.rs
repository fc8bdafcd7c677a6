use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::app::Result;
use crate::browser::BrowserSession;
use crate::extractor::{CrawlSettings, Extractor};
use crate::merge::Merger;
use crate::pipeline::{DedupSet, RecordSink, RunPhase, RunReport};
use crate::staging::StagedWriter;
use crate::store::ArticleStore;

#[derive(Debug, Clone)]
pub struct RunSettings {
    pub staging_path: PathBuf,
    /// Pre-load the dedup set with links already in the store
    pub seed_from_store: bool,
    /// Merge the staging artifact once crawling ends
    pub merge: bool,
    pub crawl: CrawlSettings,
}

/// Stops a run before its next source.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Runs every configured source through one browser session into one
/// staging artifact, then merges that artifact exactly once.
pub struct Orchestrator {
    extractors: Vec<Box<dyn Extractor>>,
    settings: RunSettings,
    cancel: CancelHandle,
}

impl Orchestrator {
    pub fn new(extractors: Vec<Box<dyn Extractor>>, settings: RunSettings) -> Self {
        Self {
            extractors,
            settings,
            cancel: CancelHandle::default(),
        }
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Execute one run.
    ///
    /// Returns `Err` only when the run could not be set up (browser
    /// session or staging artifact) or the staging artifact failed
    /// mid-crawl. The session is launched first, so a failed launch
    /// leaves the previous artifact untouched for a repeat merge. The
    /// session is closed on every path after launch.
    pub async fn run<B, F, S>(&self, launch: F, store: &S) -> Result<RunReport>
    where
        B: BrowserSession,
        F: Future<Output = Result<B>>,
        S: ArticleStore + ?Sized,
    {
        let mut report = RunReport::new(self.settings.staging_path.clone());

        let dedup = Arc::new(DedupSet::new());

        if self.settings.seed_from_store {
            match store.all_links() {
                Ok(links) => {
                    let seeded = dedup.seed(links);
                    tracing::info!("Seeded {} known links from the store", seeded);
                }
                Err(e) => {
                    tracing::warn!("Could not seed known links: {}", e);
                    report.errors.push(format!("seeding: {}", e));
                }
            }
        }

        // The previous artifact stays intact until a session exists
        let session = match launch.await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!("Browser session could not be started: {}", e);
                return Err(e);
            }
        };

        let writer = match StagedWriter::create(&self.settings.staging_path) {
            Ok(writer) => Arc::new(writer),
            Err(e) => {
                tracing::error!("Could not open staging artifact: {}", e);
                close_session(&session).await;
                return Err(e);
            }
        };

        let sink = RecordSink::new(dedup, writer.clone());

        for extractor in &self.extractors {
            if self.cancel.is_cancelled() {
                tracing::info!("Run cancelled before {}", extractor.source());
                report.cancelled = true;
                break;
            }
            report.advance(RunPhase::Crawling(extractor.source()));

            match extractor.extract(&session, &sink, &self.settings.crawl).await {
                Ok(source_report) => {
                    let lost = source_report.session_lost;
                    report.per_source.push(source_report);
                    if lost {
                        report
                            .errors
                            .push(format!("browser session lost during {}", extractor.source()));
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!("Staging failed during {}: {}", extractor.source(), e);
                    close_session(&session).await;
                    let _ = writer.close();
                    return Err(e);
                }
            }
        }

        close_session(&session).await;
        writer.close()?;

        tracing::info!(
            "Staged {} articles to {}",
            writer.rows_written(),
            self.settings.staging_path.display()
        );

        if self.settings.merge {
            report.advance(RunPhase::Merging);
            match Merger::new(store).merge(&self.settings.staging_path) {
                Ok(merge) => report.merge = Some(merge),
                Err(failure) => {
                    tracing::error!("{}", failure);
                    report.merge = Some(failure.partial);
                    report.errors.push(failure.to_string());
                }
            }
        }

        report.advance(RunPhase::Done);
        Ok(report)
    }
}

async fn close_session<B: BrowserSession>(session: &B) {
    if let Err(e) = session.close().await {
        tracing::warn!("Failed to close browser session: {}", e);
    }
}
