use async_trait::async_trait;
use url::Url;

use crate::app::Result;
use crate::browser::ElementHandle;
use crate::domain::Source;
use crate::extractor::{
    fields, Candidate, ConsentRule, Extractor, FieldSelectors, PageTarget, SourceProfile,
};

const ROOT: &str = "https://www.theguardian.com";

const SECTIONS: [(&str, &str); 6] = [
    ("News", "/"),
    ("Opinion", "/commentisfree"),
    ("Sport", "/sport"),
    ("Culture", "/culture"),
    ("Lifestyle", "/lifeandstyle"),
    ("Tech", "/technology"),
];

const ARTICLE_LINK: &str = "a[data-link-name='article']";

/// First `div` text beside the link that is not the headline itself.
const SIBLING_DESCRIPTION: &str = "function() { \
    const headline = this.innerText.trim(); \
    if (!this.parentElement) { return null; } \
    for (const div of this.parentElement.querySelectorAll('div')) { \
        const text = div.innerText.trim(); \
        if (text && text !== headline) { return text; } \
    } \
    return null; }";

/// Timestamps on some cards render inside a `gu-island` shadow root.
const SHADOW_TIME: &str = "function() { \
    const t = this.shadowRoot && this.shadowRoot.querySelector('time'); \
    return t ? t.innerText : null; }";

pub struct GuardianExtractor {
    profile: SourceProfile,
}

impl GuardianExtractor {
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
                source: Source::Guardian,
                entry: Some(format!("{}/international", base)),
                root,
                targets,
                consent: Some(ConsentRule {
                    selectors: Vec::new(),
                    button_texts: vec!["Yes, I accept", "Yes, I'm happy", "Yes, I’m happy"],
                    every_page: false,
                }),
                // Each article link is a candidate; its parent holds the description
                candidate_selector: ARTICLE_LINK,
                fields: FieldSelectors {
                    headline: None,
                    description: None,
                    time: Some("time"),
                    category: None,
                    link: None,
                    image: Some("img"),
                },
                scroll: None,
                per_page_cap: 50,
            },
        }
    }
}

#[async_trait]
impl Extractor for GuardianExtractor {
    fn profile(&self) -> &SourceProfile {
        &self.profile
    }

    async fn extract_fields(&self, section: &str, element: &dyn ElementHandle) -> Candidate {
        let mut candidate = fields::extract_with(&self.profile.fields, section, element).await;
        candidate.description = element
            .call_script(SIBLING_DESCRIPTION)
            .await
            .map(|text| fields::clean_text(&text))
            .unwrap_or_default();

        if candidate.time.trim().is_empty() {
            if let Some(island) = element.find_first("gu-island").await {
                candidate.time = island.call_script(SHADOW_TIME).await.unwrap_or_default();
            }
        }

        candidate.category = section.to_string();
        candidate
    }
}
