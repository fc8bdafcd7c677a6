use std::time::Duration;

use url::Url;

use crate::app::Result;
use crate::domain::Source;
use crate::extractor::{
    Candidate, Extractor, FieldSelectors, PageTarget, ScrollPlan, ScrollStep, SourceProfile,
};

const ROOT: &str = "https://www.cbc.ca";

const SECTIONS: [(&str, &str); 10] = [
    ("Top Stories", "/news"),
    ("Canada", "/news/canada"),
    ("World", "/news/world"),
    ("Politics", "/news/politics"),
    ("Business", "/news/business"),
    ("Health", "/news/health"),
    ("Technology", "/news/technology"),
    ("Climate", "/news/climate"),
    ("Entertainment", "/news/entertainment"),
    ("Sports", "/sports"),
];

const EXCLUDED: [&str; 3] = ["/player/", "gem.cbc.ca", "/live/"];

const BOILERPLATE: [&str; 2] = ["advertising partners", "comments on this story"];

pub struct CbcExtractor {
    profile: SourceProfile,
}

impl CbcExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self::with_root(Url::parse(ROOT)?))
    }

    pub fn with_root(root: Url) -> Self {
        let base = root.as_str().trim_end_matches('/').to_string();
        let targets = SECTIONS
            .iter()
            .map(|(section, path)| PageTarget::new(*section, format!("{}{}", base, path)))
            .collect();

        Self {
            profile: SourceProfile {
                source: Source::Cbc,
                root,
                entry: None,
                targets,
                consent: None,
                candidate_selector:
                    "article, .card, [class*='story'], [class*='Card'], div[class*='contentPackage']",
                fields: FieldSelectors {
                    headline: Some("h2, h3, h4, .headline, [class*='headline'], [class*='title']"),
                    description: Some(
                        "p, .description, [class*='description'], [class*='dek'], [class*='summary']",
                    ),
                    time: Some(
                        "time, span[class*='time'], span[class*='timestamp'], span[class*='date'], .timestamp",
                    ),
                    category: None,
                    link: Some("a[href]"),
                    image: Some("img"),
                },
                scroll: Some(ScrollPlan {
                    step: ScrollStep::Fraction,
                    steps: 3,
                    pause: Duration::from_secs(1),
                }),
                per_page_cap: 60,
            },
        }
    }
}

impl Extractor for CbcExtractor {
    fn profile(&self) -> &SourceProfile {
        &self.profile
    }

    fn refine(&self, mut candidate: Candidate) -> Option<Candidate> {
        let link = candidate.link.as_str();
        if EXCLUDED.iter().any(|x| link.contains(x))
            || !(link.contains("/news/") || link.contains("/sports/"))
        {
            return None;
        }

        let lowered = candidate.description.to_lowercase();
        if BOILERPLATE.iter().any(|b| lowered.contains(b)) {
            candidate.description.clear();
        }

        candidate.time = candidate
            .time
            .replace("Posted:", "")
            .replace("Last updated:", "")
            .trim()
            .to_string();

        candidate.category = category_from_link(&candidate.link).unwrap_or_default();
        Some(candidate)
    }
}

/// First path segment after `/news/` or `/sports/`.
fn category_from_link(link: &str) -> Option<String> {
    ["/news/", "/sports/"].iter().find_map(|marker| {
        let (_, rest) = link.split_once(marker)?;
        rest.split('/')
            .next()
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(link: &str) -> Candidate {
        Candidate {
            headline: "Headline".into(),
            link: link.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_category_from_link() {
        assert_eq!(
            category_from_link("https://www.cbc.ca/news/politics/budget-1.7").as_deref(),
            Some("politics")
        );
        assert_eq!(
            category_from_link("https://www.cbc.ca/sports/hockey/nhl/x").as_deref(),
            Some("hockey")
        );
        assert_eq!(category_from_link("https://www.cbc.ca/radio/x"), None);
    }

    #[test]
    fn test_refine_rejects_players_and_live_pages() {
        let cbc = CbcExtractor::new().unwrap();
        assert!(cbc.refine(candidate("https://www.cbc.ca/player/play/1")).is_none());
        assert!(cbc.refine(candidate("https://gem.cbc.ca/news/show")).is_none());
        assert!(cbc.refine(candidate("https://www.cbc.ca/news/live/now")).is_none());
        assert!(cbc.refine(candidate("https://www.cbc.ca/radio/q")).is_none());
        assert!(cbc.refine(candidate("/news/canada/story-1.2")).is_some());
    }

    #[test]
    fn test_refine_cleans_time_and_description() {
        let cbc = CbcExtractor::new().unwrap();
        let mut raw = candidate("https://www.cbc.ca/news/world/story-1.3");
        raw.time = "Posted: Oct 3, 2025 4:00 AM EDT".into();
        raw.description = "Our advertising partners support this site".into();

        let refined = cbc.refine(raw).unwrap();
        assert_eq!(refined.time, "Oct 3, 2025 4:00 AM EDT");
        assert_eq!(refined.description, "");
        assert_eq!(refined.category, "world");
    }

    #[test]
    fn test_scroll_targets_document_fractions() {
        let cbc = CbcExtractor::new().unwrap();
        let plan = cbc.profile().scroll.clone().unwrap();
        let scripts: Vec<_> = (1..=plan.steps).map(|k| plan.script(k)).collect();
        assert_eq!(
            scripts[2],
            "window.scrollTo(0, document.body.scrollHeight * 3 / 3)"
        );
        assert_eq!(cbc.profile().targets.len(), 10);
    }
}
