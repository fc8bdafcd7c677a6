use std::future::Future;
use std::path::Path;

use crate::app::{AppContext, PipelineError, Result};
use crate::domain::Source;
use crate::merge::{MergeReport, Merger};
use crate::pipeline::{CancelHandle, RunReport};
use crate::store::ArticleStore;

pub async fn crawl(ctx: &AppContext, only: &[Source], no_merge: bool, json: bool) -> Result<()> {
    let merge = ctx.config.pipeline.merge_after_crawl && !no_merge;
    let orchestrator = ctx.orchestrator(only, merge)?;

    let cancel = orchestrator.cancel_handle();
    tokio::spawn(async move {
        if watch_interrupts(tokio::signal::ctrl_c, &cancel).await {
            tracing::warn!("Interrupted again; exiting without merging");
            std::process::exit(130);
        }
    });

    let report = orchestrator
        .run(ctx.launch_browser(), ctx.store.as_ref())
        .await?;

    if json {
        let out = serde_json::to_string_pretty(&report)
            .map_err(|e| PipelineError::Other(e.to_string()))?;
        println!("{}", out);
    } else {
        print_run(&report);
    }
    Ok(())
}

/// First interrupt cancels the run after the current source. Returns
/// `true` on a second interrupt, after which the caller should exit.
async fn watch_interrupts<F, Fut>(mut next_signal: F, cancel: &CancelHandle) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    if next_signal().await.is_err() {
        return false;
    }
    tracing::warn!("Interrupted; stopping after the current source (Ctrl-C again to quit)");
    cancel.cancel();

    next_signal().await.is_ok()
}

fn print_run(report: &RunReport) {
    for source in &report.per_source {
        println!(
            "{:<14} {:>4} new  {:>4} dup  {:>4} invalid  {:>3} pages ({} skipped){}",
            source.source.label(),
            source.accepted,
            source.duplicates,
            source.invalid,
            source.pages_visited,
            source.pages_skipped,
            if source.session_lost { "  session lost" } else { "" }
        );
    }
    println!(
        "Staged {} articles to {}",
        report.total_staged(),
        report.staging_path.display()
    );
    if report.cancelled {
        println!("Run cancelled before all sources were crawled");
    }
    if let Some(ref merge) = report.merge {
        print_merge(merge);
    }
    for error in &report.errors {
        eprintln!("  Error: {}", error);
    }
}

pub fn merge(ctx: &AppContext, path: &Path) -> Result<()> {
    match Merger::new(ctx.store.as_ref()).merge(path) {
        Ok(report) => {
            print_merge(&report);
            Ok(())
        }
        Err(failure) => {
            print_merge(&failure.partial);
            Err(failure.cause)
        }
    }
}

fn print_merge(report: &MergeReport) {
    println!(
        "Merge complete: {} rows, {} new, {} already stored, {} rejected",
        report.processed, report.accepted, report.duplicates, report.rejected
    );
}

pub fn list_articles(ctx: &AppContext, source: Option<&str>, limit: usize) -> Result<()> {
    let articles = ctx.store.list(source, limit)?;

    if articles.is_empty() {
        println!("No articles");
        return Ok(());
    }

    for article in articles {
        let record = &article.record;
        println!(
            "{} [{}] {}\n  {}",
            article.first_seen_at.format("%Y-%m-%d"),
            record.source,
            record.headline,
            record.link
        );
    }

    Ok(())
}

pub fn stats(ctx: &AppContext) -> Result<()> {
    let total = ctx.store.count()?;
    println!("{} articles in {}", total, ctx.store.path().display());

    for (source, count) in ctx.store.count_by_source()? {
        println!("  {:<14} {}", source, count);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn test_second_interrupt_forces_exit() {
        let cancel = CancelHandle::default();
        let signals = AtomicUsize::new(0);

        let forced = watch_interrupts(
            || {
                signals.fetch_add(1, Ordering::SeqCst);
                async { Ok(()) }
            },
            &cancel,
        )
        .await;

        assert!(forced);
        assert!(cancel.is_cancelled());
        assert_eq!(signals.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_signal_setup_failure_leaves_run_alone() {
        let cancel = CancelHandle::default();
        let forced = watch_interrupts(
            || async { Err(std::io::Error::other("no signal handler")) },
            &cancel,
        )
        .await;

        assert!(!forced);
        assert!(!cancel.is_cancelled());
    }
}
