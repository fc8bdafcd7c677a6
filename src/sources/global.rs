use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::app::Result;
use crate::browser::ElementHandle;
use crate::domain::Source;
use crate::extractor::profile::paginate;
use crate::extractor::{
    fields, Candidate, ConsentRule, Extractor, FieldSelectors, PageTarget, ScrollPlan, ScrollStep,
    SourceProfile,
};

const ROOT: &str = "https://globalnews.ca";

const SECTIONS: [&str; 12] = [
    "world",
    "canada",
    "politics",
    "money",
    "entertainment",
    "sports",
    "health",
    "tech",
    "trending",
    "weather",
    "lifestyle",
    "videos",
];

const PAGES_PER_SECTION: u32 = 3;

pub struct GlobalNewsExtractor {
    profile: SourceProfile,
}

impl GlobalNewsExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self::with_root(Url::parse(ROOT)?))
    }

    pub fn with_root(root: Url) -> Self {
        let mut targets = vec![PageTarget::new("Top Stories", root.as_str())];
        for section in SECTIONS {
            targets.extend(paginate(
                &root,
                &section.to_uppercase(),
                section,
                PAGES_PER_SECTION,
            ));
        }

        Self {
            profile: SourceProfile {
                source: Source::GlobalNews,
                root,
                entry: None,
                targets,
                consent: Some(ConsentRule {
                    selectors: Vec::new(),
                    button_texts: vec!["accept"],
                    every_page: true,
                }),
                candidate_selector: "a.c-posts__inner",
                fields: FieldSelectors {
                    headline: Some(".c-posts__headlineText"),
                    description: Some(".c-posts__excerpt"),
                    time: None,
                    category: Some(".c-posts__info--highlight"),
                    link: None,
                    image: Some("img"),
                },
                scroll: Some(ScrollPlan {
                    step: ScrollStep::By(1000),
                    steps: 5,
                    pause: Duration::from_millis(700),
                }),
                per_page_cap: 100,
            },
        }
    }
}

#[async_trait]
impl Extractor for GlobalNewsExtractor {
    fn profile(&self) -> &SourceProfile {
        &self.profile
    }

    async fn extract_fields(&self, section: &str, element: &dyn ElementHandle) -> Candidate {
        let mut candidate = fields::extract_with(&self.profile.fields, section, element).await;

        // The second info entry holds the timestamp
        if let Some(info) = element.find_all(".c-posts__info").await.get(1) {
            candidate.time = info.text().await.unwrap_or_default();
        }
        candidate
    }

    fn refine(&self, mut candidate: Candidate) -> Option<Candidate> {
        if !candidate.link.contains("/news/") {
            return None;
        }

        if is_numeric(&candidate.time) {
            candidate.time.clear();
        }
        let category = candidate.category.trim();
        if is_numeric(category)
            || category.eq_ignore_ascii_case("READ")
            || category.eq_ignore_ascii_case("WATCH")
        {
            candidate.category.clear();
        }
        candidate.description = strip_numbers(&candidate.description);

        Some(candidate)
    }
}

/// One or more whitespace-separated runs of digits.
fn is_numeric(text: &str) -> bool {
    let mut tokens = text.split_whitespace().peekable();
    tokens.peek().is_some() && tokens.all(|t| t.chars().all(|c| c.is_ascii_digit()))
}

/// Remove standalone numbers (view and comment counters leak into excerpts).
fn strip_numbers(text: &str) -> String {
    text.split_whitespace()
        .filter(|token| {
            let core = token.trim_matches(|c: char| c.is_ascii_punctuation());
            core.is_empty() || !core.chars().all(|c| c.is_ascii_digit())
        })
        .collect::<Vec<_>>()
        .join(" ")
}
