use url::Url;

use crate::app::Result;
use crate::domain::Source;
use crate::extractor::{ConsentRule, Extractor, FieldSelectors, GroupRule, PageTarget, SourceProfile};

const ROOT: &str = "https://www.bbc.com";

const TOPICS: [(&str, &str); 12] = [
    ("Israel-Gaza War", "/news/topics/c2vdnvdg6xxt"),
    ("War in Ukraine", "/news/war-in-ukraine"),
    ("US & Canada", "/news/us-canada"),
    ("UK", "/news/uk"),
    ("Africa", "/news/world/africa"),
    ("Asia", "/news/world/asia"),
    ("Australia", "/news/world/australia"),
    ("Europe", "/news/world/europe"),
    ("Latin America", "/news/world/latin_america"),
    ("Middle East", "/news/world/middle_east"),
    ("Business", "/news/business"),
    ("Technology", "/news/technology"),
];

pub struct BbcExtractor {
    profile: SourceProfile,
}

impl BbcExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self::with_root(Url::parse(ROOT)?))
    }

    pub fn with_root(root: Url) -> Self {
        let base = root.as_str().trim_end_matches('/').to_string();

        let mut targets = vec![PageTarget::grouped(
            "Top Stories",
            format!("{}/news", base),
            GroupRule {
                selector: "[data-testid*='section-outer']",
                title_selector: "[data-testid$='-title']",
                fallback_title: "Top Stories",
                max_groups: 5,
                candidate_selector: "[data-testid*='-card']",
            },
        )];
        targets.extend(
            TOPICS
                .iter()
                .map(|(section, path)| PageTarget::new(*section, format!("{}{}", base, path))),
        );

        Self {
            profile: SourceProfile {
                source: Source::Bbc,
                root,
                entry: None,
                targets,
                consent: Some(ConsentRule {
                    selectors: vec!["button[aria-label='Consent']"],
                    button_texts: Vec::new(),
                    every_page: false,
                }),
                candidate_selector: "article, [data-testid*='-card']",
                fields: FieldSelectors {
                    headline: Some("[data-testid='card-headline'], h3, h2"),
                    description: Some("[data-testid='card-description'], p"),
                    time: Some("[data-testid='card-metadata-lastupdated']"),
                    category: Some("[data-testid='card-metadata-tag']"),
                    link: Some("a, [data-testid='internal-link']"),
                    image: Some("[data-testid='card-image-wrapper'] img"),
                },
                scroll: None,
                per_page_cap: 60,
            },
        }
    }
}

impl Extractor for BbcExtractor {
    fn profile(&self) -> &SourceProfile {
        &self.profile
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::browser::fake::{FakeElement, FakePage, FakeSession};
    use crate::extractor::CrawlSettings;
    use crate::pipeline::{DedupSet, RecordSink};
    use crate::staging::StagedWriter;

    fn card(headline: &str, href: &str) -> FakeElement {
        FakeElement::new()
            .child(
                "[data-testid='card-headline'], h3, h2",
                FakeElement::new().text(headline),
            )
            .child(
                "[data-testid='card-description'], p",
                FakeElement::new().text("A summary"),
            )
            .child(
                "[data-testid='card-metadata-lastupdated']",
                FakeElement::new().text("2 hrs ago"),
            )
            .child(
                "a, [data-testid='internal-link']",
                FakeElement::new().attr("href", href),
            )
            .child(
                "[data-testid='card-image-wrapper'] img",
                FakeElement::new().attr("srcset", "https://ichef.bbci.co.uk/a.jpg 240w"),
            )
    }

    #[test]
    fn test_profile_targets() {
        let bbc = BbcExtractor::new().unwrap();
        let profile = bbc.profile();
        assert_eq!(profile.targets.len(), 13);
        assert_eq!(profile.targets[0].url, "https://www.bbc.com/news");
        assert!(profile.targets[0].groups.is_some());
        assert_eq!(profile.targets[4].section, "UK");
        assert_eq!(profile.targets[4].url, "https://www.bbc.com/news/uk");
    }

    #[tokio::test]
    async fn test_home_page_groups_and_consent() {
        let dir = tempfile::tempdir().unwrap();
        let writer = StagedWriter::create(dir.path().join("bbc.csv")).unwrap();
        let sink = RecordSink::new(Arc::new(DedupSet::new()), Arc::new(writer));

        let consent = FakeElement::new();
        let section = FakeElement::new()
            .child("[data-testid$='-title']", FakeElement::new().text("Only from the BBC"))
            .child("[data-testid*='-card']", card("Relative link", "/news/articles/c1"))
            .child("[data-testid*='-card']", card("Headline two", "https://www.bbc.com/news/articles/c2"));

        let session = FakeSession::new().page(
            "https://www.bbc.com/news",
            FakePage::new()
                .with("button[aria-label='Consent']", consent.clone())
                .with("[data-testid*='section-outer']", section),
        );

        let settings = CrawlSettings {
            wait_timeout: std::time::Duration::from_millis(10),
            consent_timeout: std::time::Duration::ZERO,
            max_per_page: None,
        };
        let report = BbcExtractor::new()
            .unwrap()
            .extract(&session, &sink, &settings)
            .await
            .unwrap();

        assert_eq!(consent.clicks(), 1);
        assert_eq!(report.accepted, 2);
        assert_eq!(report.pages_skipped, 12);
        sink.writer().close().unwrap();

        let mut reader = csv::Reader::from_path(dir.path().join("bbc.csv")).unwrap();
        let first = reader.records().next().unwrap().unwrap();
        assert_eq!(&first[0], "BBC");
        assert_eq!(&first[1], "Only from the BBC");
        assert_eq!(&first[2], "Relative link");
        assert_eq!(&first[4], "2 hrs ago");
        assert_eq!(&first[6], "https://www.bbc.com/news/articles/c1");
        assert_eq!(&first[7], "https://ichef.bbci.co.uk/a.jpg");
    }
}
