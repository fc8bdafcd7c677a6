use url::Url;

use crate::browser::ElementHandle;
use crate::domain::{ArticleRecord, Source};
use crate::extractor::profile::FieldSelectors;

/// Raw field values pulled from one candidate element, before cleaning and
/// link resolution. Absent fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidate {
    pub section: String,
    pub headline: String,
    pub description: String,
    pub time: String,
    pub category: String,
    pub link: String,
    pub image_link: String,
}

impl Candidate {
    /// Clean the text fields and canonicalise links.
    ///
    /// Returns `None` when the headline is empty or the link cannot be
    /// resolved to an absolute http(s) URL.
    pub fn into_record(self, source: Source, root: &Url) -> Option<ArticleRecord> {
        let headline = clean_text(&self.headline);
        if headline.is_empty() {
            return None;
        }
        let link = resolve_link(root, &self.link)?;

        Some(ArticleRecord {
            source: source.label().to_string(),
            section: clean_text(&self.section),
            headline,
            description: clean_text(&self.description),
            time: clean_text(&self.time),
            category: clean_text(&self.category),
            link,
            image_link: resolve_link(root, &self.image_link).unwrap_or_default(),
        })
    }
}

/// Default field extraction driven purely by selectors.
pub async fn extract_with(
    fields: &FieldSelectors,
    section: &str,
    element: &dyn ElementHandle,
) -> Candidate {
    let headline = match fields.headline {
        Some(selector) => text_in(element, selector).await,
        None => element.text().await.unwrap_or_default(),
    };
    let link = match fields.link {
        Some(selector) => attr_in(element, selector, "href").await,
        None => element.attribute("href").await.unwrap_or_default(),
    };

    Candidate {
        section: section.to_string(),
        headline,
        description: optional_text(element, fields.description).await,
        time: optional_text(element, fields.time).await,
        category: optional_text(element, fields.category).await,
        link,
        image_link: match fields.image {
            Some(selector) => image_in(element, selector).await,
            None => String::new(),
        },
    }
}

async fn optional_text(element: &dyn ElementHandle, selector: Option<&str>) -> String {
    match selector {
        Some(selector) => text_in(element, selector).await,
        None => String::new(),
    }
}

/// Text of the first descendant matching `selector`, or `""`.
pub async fn text_in(element: &dyn ElementHandle, selector: &str) -> String {
    match element.find_first(selector).await {
        Some(found) => found.text().await.unwrap_or_default(),
        None => String::new(),
    }
}

pub async fn attr_in(element: &dyn ElementHandle, selector: &str, name: &str) -> String {
    match element.find_first(selector).await {
        Some(found) => found.attribute(name).await.unwrap_or_default(),
        None => String::new(),
    }
}

/// Image URL from the first matching `img`: `src`, then `data-src`, then
/// the first `srcset` candidate. Inline `data:` placeholders are skipped.
pub async fn image_in(element: &dyn ElementHandle, selector: &str) -> String {
    let Some(img) = element.find_first(selector).await else {
        return String::new();
    };

    for name in ["src", "data-src"] {
        if let Some(value) = img.attribute(name).await {
            let value = value.trim();
            if !value.is_empty() && !value.starts_with("data:") {
                return value.to_string();
            }
        }
    }

    img.attribute("srcset")
        .await
        .and_then(|srcset| first_srcset_url(&srcset).map(str::to_string))
        .unwrap_or_default()
}

pub fn first_srcset_url(srcset: &str) -> Option<&str> {
    srcset
        .split(',')
        .next()
        .and_then(|entry| entry.split_whitespace().next())
        .filter(|url| !url.is_empty())
}

/// Resolve `href` against `root` into a canonical absolute link.
pub fn resolve_link(root: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let mut url = root.join(href).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_fragment(None);
    Some(url.to_string())
}

/// Decode HTML entities and collapse runs of whitespace.
pub fn clean_text(text: &str) -> String {
    let decoded = html_escape::decode_html_entities(text);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}
