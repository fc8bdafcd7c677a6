//! Shared crawl skeleton for all sources.
//!
//! Per target page, in order:
//!
//! ```text
//! navigate → consent → wait_for(ready) → scroll → candidates
//!     → extract_fields → refine → resolve link → RecordSink::offer
//! ```
//!
//! Sources supply a [`SourceProfile`] and may override the
//! [`Extractor::extract_fields`] and [`Extractor::refine`] hooks.

pub mod consent;
pub mod fields;
pub mod profile;

pub use fields::Candidate;
pub use profile::{ConsentRule, FieldSelectors, GroupRule, PageTarget, ScrollPlan, ScrollStep, SourceProfile};

use std::time::Duration;

use async_trait::async_trait;

use crate::app::Result;
use crate::browser::{BrowserConfig, BrowserSession, Element, ElementHandle};
use crate::domain::Source;
use crate::pipeline::{Offer, RecordSink, SourceReport};

/// Timing and limits shared by every source in a run.
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    pub wait_timeout: Duration,
    pub consent_timeout: Duration,
    /// Overrides every profile's `per_page_cap` when set
    pub max_per_page: Option<usize>,
}

impl CrawlSettings {
    pub fn from_browser(config: &BrowserConfig, max_per_page: Option<usize>) -> Self {
        Self {
            wait_timeout: config.wait_timeout(),
            consent_timeout: config.consent_timeout(),
            max_per_page,
        }
    }
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self::from_browser(&BrowserConfig::default(), None)
    }
}

#[async_trait]
pub trait Extractor: Send + Sync {
    fn profile(&self) -> &SourceProfile;

    fn source(&self) -> Source {
        self.profile().source
    }

    async fn extract_fields(&self, section: &str, element: &dyn ElementHandle) -> Candidate {
        fields::extract_with(&self.profile().fields, section, element).await
    }

    /// Source-specific filtering and cleanup; `None` drops the candidate.
    fn refine(&self, candidate: Candidate) -> Option<Candidate> {
        Some(candidate)
    }

    /// Crawl every target of this source into `sink`.
    ///
    /// Only a staging failure is returned as an error. Page failures are
    /// counted and skipped; a lost session ends the source early with
    /// `session_lost` set.
    async fn extract(
        &self,
        session: &dyn BrowserSession,
        sink: &RecordSink,
        settings: &CrawlSettings,
    ) -> Result<SourceReport> {
        crawl_source(self, session, sink, settings).await
    }
}

async fn crawl_source<E: Extractor + ?Sized>(
    extractor: &E,
    session: &dyn BrowserSession,
    sink: &RecordSink,
    settings: &CrawlSettings,
) -> Result<SourceReport> {
    let profile = extractor.profile();
    let mut report = SourceReport::new(profile.source);
    let mut consent_pending = profile.consent.is_some();

    tracing::info!("Crawling {} ({} pages)", profile.source, profile.targets.len());

    if let Some(ref entry) = profile.entry {
        match session.navigate(entry).await {
            Ok(()) => {
                report.pages_visited += 1;
                consent_pending = handle_consent(profile, session, settings, true).await;
            }
            Err(e) if e.is_session_fatal() => {
                tracing::error!("{}: {}", profile.source, e);
                report.session_lost = true;
                return Ok(report);
            }
            Err(e) => tracing::warn!("{} entry page failed: {}", profile.source, e),
        }
    }

    for target in &profile.targets {
        let before = report.accepted;
        let result = crawl_page(
            extractor,
            session,
            sink,
            settings,
            target,
            &mut consent_pending,
            &mut report,
        )
        .await;

        match result {
            Ok(()) => tracing::info!(
                "{} {}: {} new articles",
                profile.source,
                target.section,
                report.accepted - before
            ),
            Err(e) if e.is_session_fatal() => {
                tracing::error!("{}: {}; abandoning remaining pages", profile.source, e);
                report.session_lost = true;
                break;
            }
            Err(e) if e.is_staging() => return Err(e),
            Err(e) if e.is_transient() => {
                tracing::warn!("Skipping {} {} ({}): {}", profile.source, target.section, target.url, e);
                report.pages_skipped += 1;
            }
            Err(e) => {
                tracing::error!("{} {} ({}) failed: {}", profile.source, target.section, target.url, e);
                report.pages_skipped += 1;
            }
        }
    }

    tracing::info!(
        "Finished {}: {} accepted, {} duplicates, {} invalid, {} pages skipped",
        profile.source,
        report.accepted,
        report.duplicates,
        report.invalid,
        report.pages_skipped
    );
    Ok(report)
}

/// Returns whether later pages still need a consent check.
async fn handle_consent(
    profile: &SourceProfile,
    session: &dyn BrowserSession,
    settings: &CrawlSettings,
    pending: bool,
) -> bool {
    let Some(ref rule) = profile.consent else {
        return false;
    };
    if !pending {
        return false;
    }
    consent::dismiss(session, rule, settings.consent_timeout).await;
    rule.every_page
}

async fn crawl_page<E: Extractor + ?Sized>(
    extractor: &E,
    session: &dyn BrowserSession,
    sink: &RecordSink,
    settings: &CrawlSettings,
    target: &PageTarget,
    consent_pending: &mut bool,
    report: &mut SourceReport,
) -> Result<()> {
    let profile = extractor.profile();

    session.navigate(&target.url).await?;
    report.pages_visited += 1;

    *consent_pending = handle_consent(profile, session, settings, *consent_pending).await;

    session
        .wait_for(profile.ready_selector(target), settings.wait_timeout)
        .await?;

    if let Some(ref plan) = profile.scroll {
        for step in 1..=plan.steps {
            if let Err(e) = session.execute_script(&plan.script(step)).await {
                tracing::debug!("Scroll step {} failed: {}", step, e);
                break;
            }
            tokio::time::sleep(plan.pause).await;
        }
    }

    let cap = settings.max_per_page.unwrap_or(profile.per_page_cap);

    match target.groups {
        None => {
            let candidates = session.query(profile.candidate_selector).await;
            harvest(extractor, sink, &target.section, candidates, cap, report).await
        }
        Some(ref rule) => {
            let groups = session.query(rule.selector).await;
            for group in groups.into_iter().take(rule.max_groups) {
                let title = match group.find_first(rule.title_selector).await {
                    Some(heading) => heading.text().await.unwrap_or_default(),
                    None => String::new(),
                };
                let title = match fields::clean_text(&title) {
                    t if t.is_empty() => rule.fallback_title.to_string(),
                    t => t,
                };
                let candidates = group.find_all(rule.candidate_selector).await;
                harvest(extractor, sink, &title, candidates, cap, report).await?;
            }
            Ok(())
        }
    }
}

async fn harvest<E: Extractor + ?Sized>(
    extractor: &E,
    sink: &RecordSink,
    section: &str,
    candidates: Vec<Element>,
    cap: usize,
    report: &mut SourceReport,
) -> Result<()> {
    let profile = extractor.profile();
    let mut accepted = 0;

    for element in candidates {
        if accepted >= cap {
            break;
        }
        report.candidates += 1;

        let candidate = extractor.extract_fields(section, element.as_ref()).await;
        let record = extractor
            .refine(candidate)
            .and_then(|c| c.into_record(profile.source, &profile.root));
        let Some(record) = record else {
            report.invalid += 1;
            continue;
        };

        match sink.offer(&record)? {
            Offer::Accepted => {
                accepted += 1;
                report.accepted += 1;
                tracing::debug!("✓ {}: {}", profile.source, preview(&record.headline));
            }
            Offer::Duplicate => report.duplicates += 1,
        }
    }
    Ok(())
}

fn preview(headline: &str) -> &str {
    match headline.char_indices().nth(50) {
        Some((idx, _)) => &headline[..idx],
        None => headline,
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;

    use url::Url;

    use super::*;
    use crate::browser::fake::{FakeElement, FakePage, FakeSession};
    use crate::pipeline::DedupSet;
    use crate::staging::StagedWriter;

    struct Simple(SourceProfile);

    impl Extractor for Simple {
        fn profile(&self) -> &SourceProfile {
            &self.0
        }
    }

    fn fields() -> FieldSelectors {
        FieldSelectors {
            headline: Some("h3"),
            description: Some("p"),
            link: Some("a"),
            ..Default::default()
        }
    }

    fn profile(targets: Vec<PageTarget>) -> SourceProfile {
        SourceProfile {
            source: Source::Cbc,
            root: Url::parse("https://x").unwrap(),
            entry: None,
            targets,
            consent: None,
            candidate_selector: "article",
            fields: fields(),
            scroll: None,
            per_page_cap: 10,
        }
    }

    fn card(headline: &str, href: &str) -> FakeElement {
        FakeElement::new()
            .child("h3", FakeElement::new().text(headline))
            .child("a", FakeElement::new().attr("href", href))
    }

    fn sink(dir: &Path) -> RecordSink {
        let writer = StagedWriter::create(dir.join("run.csv")).unwrap();
        RecordSink::new(Arc::new(DedupSet::new()), Arc::new(writer))
    }

    fn settings() -> CrawlSettings {
        CrawlSettings {
            wait_timeout: Duration::from_millis(10),
            consent_timeout: Duration::ZERO,
            max_per_page: None,
        }
    }

    #[tokio::test]
    async fn test_extracts_and_counts_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let sink = sink(dir.path());
        let session = FakeSession::new().page(
            "https://x/world",
            FakePage::new().with_all(
                "article",
                vec![
                    card("First", "/news/a1"),
                    card("", "/news/a2"),
                    card("Third", "javascript:void(0)"),
                    card("Again", "/news/a1#comments"),
                    card("Fifth", "https://x/news/a5"),
                ],
            ),
        );
        let extractor = Simple(profile(vec![PageTarget::new("World", "https://x/world")]));

        let report = extractor.extract(&session, &sink, &settings()).await.unwrap();
        assert_eq!(report.pages_visited, 1);
        assert_eq!(report.candidates, 5);
        assert_eq!(report.accepted, 2);
        assert_eq!(report.invalid, 2);
        assert_eq!(report.duplicates, 1);
        assert!(sink.dedup().contains("https://x/news/a1"));
        assert!(sink.dedup().contains("https://x/news/a5"));
    }

    #[tokio::test]
    async fn test_failed_pages_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let sink = sink(dir.path());
        let session = FakeSession::new()
            .page("https://x/empty", FakePage::new())
            .page(
                "https://x/ok",
                FakePage::new().with("article", card("Survivor", "/news/ok")),
            )
            .failing("https://x/down");
        let extractor = Simple(profile(vec![
            PageTarget::new("Down", "https://x/down"),
            PageTarget::new("Empty", "https://x/empty"),
            PageTarget::new("Ok", "https://x/ok"),
        ]));

        let report = extractor.extract(&session, &sink, &settings()).await.unwrap();
        assert_eq!(report.pages_skipped, 2);
        assert_eq!(report.pages_visited, 2);
        assert_eq!(report.accepted, 1);
        assert!(!report.session_lost);
    }

    #[tokio::test]
    async fn test_session_loss_abandons_remaining_pages() {
        let dir = tempfile::tempdir().unwrap();
        let sink = sink(dir.path());
        let session = FakeSession::new()
            .page("https://x/a", FakePage::new().with("article", card("A", "/news/a")))
            .fatal("https://x/b")
            .page("https://x/c", FakePage::new().with("article", card("C", "/news/c")));
        let extractor = Simple(profile(vec![
            PageTarget::new("A", "https://x/a"),
            PageTarget::new("B", "https://x/b"),
            PageTarget::new("C", "https://x/c"),
        ]));

        let report = extractor.extract(&session, &sink, &settings()).await.unwrap();
        assert!(report.session_lost);
        assert_eq!(report.accepted, 1);
        assert_eq!(session.visited(), vec!["https://x/a", "https://x/b"]);
    }

    #[tokio::test]
    async fn test_cap_limits_accepted_per_page() {
        let dir = tempfile::tempdir().unwrap();
        let sink = sink(dir.path());
        let cards = (0..8)
            .map(|i| card(&format!("Story {i}"), &format!("/news/{i}")))
            .collect();
        let session =
            FakeSession::new().page("https://x/world", FakePage::new().with_all("article", cards));
        let extractor = Simple(profile(vec![PageTarget::new("World", "https://x/world")]));
        let settings = CrawlSettings {
            max_per_page: Some(3),
            ..settings()
        };

        let report = extractor.extract(&session, &sink, &settings).await.unwrap();
        assert_eq!(report.accepted, 3);
        assert_eq!(sink.writer().rows_written(), 3);
    }

    #[tokio::test]
    async fn test_grouped_page_uses_group_titles() {
        let dir = tempfile::tempdir().unwrap();
        let sink = sink(dir.path());
        let titled = FakeElement::new()
            .child("h2", FakeElement::new().text(" Must watch "))
            .child("article", card("Titled", "/news/t"));
        let untitled = FakeElement::new().child("article", card("Untitled", "/news/u"));
        let session = FakeSession::new().page(
            "https://x/",
            FakePage::new().with_all(".section", vec![titled, untitled]),
        );
        let rule = GroupRule {
            selector: ".section",
            title_selector: "h2",
            fallback_title: "Top Stories",
            max_groups: 5,
            candidate_selector: "article",
        };
        let extractor = Simple(profile(vec![PageTarget::grouped("Home", "https://x/", rule)]));

        let report = extractor.extract(&session, &sink, &settings()).await.unwrap();
        assert_eq!(report.accepted, 2);
        sink.writer().close().unwrap();

        let mut reader = csv::Reader::from_path(dir.path().join("run.csv")).unwrap();
        let sections: Vec<String> = reader
            .records()
            .map(|r| r.unwrap()[1].to_string())
            .collect();
        assert_eq!(sections, vec!["Must watch", "Top Stories"]);
    }

    #[tokio::test]
    async fn test_staging_failure_stops_the_source() {
        let dir = tempfile::tempdir().unwrap();
        let sink = sink(dir.path());
        sink.writer().close().unwrap();
        let session = FakeSession::new()
            .page("https://x/a", FakePage::new().with("article", card("A", "/news/a")));
        let extractor = Simple(profile(vec![PageTarget::new("A", "https://x/a")]));

        let err = extractor.extract(&session, &sink, &settings()).await.unwrap_err();
        assert!(err.is_staging());
    }

    #[tokio::test]
    async fn test_scroll_plan_runs_before_harvest() {
        let dir = tempfile::tempdir().unwrap();
        let sink = sink(dir.path());
        let session = FakeSession::new()
            .page("https://x/a", FakePage::new().with("article", card("A", "/news/a")));
        let mut profile = profile(vec![PageTarget::new("A", "https://x/a")]);
        profile.scroll = Some(ScrollPlan {
            step: ScrollStep::By(1000),
            steps: 3,
            pause: Duration::ZERO,
        });

        Simple(profile).extract(&session, &sink, &settings()).await.unwrap();
        assert_eq!(session.scripts(), vec!["window.scrollBy(0, 1000)"; 3]);
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        let long = "é".repeat(60);
        assert_eq!(preview(&long).chars().count(), 50);
        assert_eq!(preview("short"), "short");
    }
}
