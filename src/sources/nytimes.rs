use async_trait::async_trait;
use url::Url;

use crate::app::Result;
use crate::browser::ElementHandle;
use crate::domain::Source;
use crate::extractor::{fields, Candidate, Extractor, FieldSelectors, PageTarget, SourceProfile};

const ROOT: &str = "https://www.nytimes.com";

const SECTIONS: [&str; 16] = [
    "world",
    "us",
    "politics",
    "business",
    "technology",
    "science",
    "health",
    "sports",
    "arts",
    "books",
    "style",
    "food",
    "travel",
    "opinion",
    "climate",
    "education",
];

pub struct NyTimesExtractor {
    profile: SourceProfile,
}

impl NyTimesExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self::with_root(Url::parse(ROOT)?))
    }

    pub fn with_root(root: Url) -> Self {
        let base = root.as_str().trim_end_matches('/').to_string();
        let mut targets = vec![PageTarget::new("Homepage", root.as_str())];
        targets.extend(SECTIONS.iter().map(|section| {
            PageTarget::new(capitalize(section), format!("{}/section/{}", base, section))
        }));

        Self {
            profile: SourceProfile {
                source: Source::NyTimes,
                root,
                entry: None,
                targets,
                consent: None,
                candidate_selector: "section article",
                fields: FieldSelectors {
                    headline: Some("h2, h3, h4"),
                    description: Some("p, span"),
                    time: Some("time"),
                    category: None,
                    link: Some("a"),
                    image: Some("img"),
                },
                scroll: None,
                per_page_cap: 100,
            },
        }
    }
}

#[async_trait]
impl Extractor for NyTimesExtractor {
    fn profile(&self) -> &SourceProfile {
        &self.profile
    }

    async fn extract_fields(&self, section: &str, element: &dyn ElementHandle) -> Candidate {
        let mut candidate = fields::extract_with(&self.profile.fields, section, element).await;
        if candidate.time.trim().is_empty() {
            candidate.time = crawl_timestamp();
        }
        candidate
    }
}

fn crawl_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
