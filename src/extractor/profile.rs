use std::time::Duration;

use url::Url;

use crate::domain::Source;

/// Everything the shared crawl skeleton needs to know about a source.
#[derive(Debug, Clone)]
pub struct SourceProfile {
    pub source: Source,
    /// Base for resolving relative links
    pub root: Url,
    /// Visited once before the targets, for consent dismissal
    pub entry: Option<String>,
    pub targets: Vec<PageTarget>,
    pub consent: Option<ConsentRule>,
    pub candidate_selector: &'static str,
    pub fields: FieldSelectors,
    pub scroll: Option<ScrollPlan>,
    /// Accepted records per page (per group on grouped pages)
    pub per_page_cap: usize,
}

impl SourceProfile {
    /// Selector that signals a target page is ready to harvest.
    pub fn ready_selector<'a>(&'a self, target: &'a PageTarget) -> &'a str {
        target
            .groups
            .as_ref()
            .map(|g| g.selector)
            .unwrap_or(self.candidate_selector)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTarget {
    pub section: String,
    pub url: String,
    pub groups: Option<GroupRule>,
}

impl PageTarget {
    pub fn new(section: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            url: url.into(),
            groups: None,
        }
    }

    pub fn grouped(section: impl Into<String>, url: impl Into<String>, groups: GroupRule) -> Self {
        Self {
            groups: Some(groups),
            ..Self::new(section, url)
        }
    }
}

/// Expand a paginated section into one target per page.
///
/// Page 1 is `root/path/`, later pages are `root/path/page/N/`.
pub fn paginate(root: &Url, section: &str, path: &str, pages: u32) -> Vec<PageTarget> {
    let base = root.as_str().trim_end_matches('/');
    let path = path.trim_matches('/');
    (1..=pages.max(1))
        .map(|page| {
            let url = match page {
                1 => format!("{}/{}/", base, path),
                n => format!("{}/{}/page/{}/", base, path, n),
            };
            PageTarget::new(section, url)
        })
        .collect()
}

/// Section containers on a landing page, each harvested as its own section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRule {
    pub selector: &'static str,
    pub title_selector: &'static str,
    pub fallback_title: &'static str,
    pub max_groups: usize,
    pub candidate_selector: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsentRule {
    /// Buttons clicked directly when visible
    pub selectors: Vec<&'static str>,
    /// Case-insensitive button text fragments, also searched in iframes
    pub button_texts: Vec<&'static str>,
    /// Look for a prompt on every page rather than only the first one
    pub every_page: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollStep {
    /// Scroll down by a fixed number of pixels each step
    By(u32),
    /// Step k of n jumps to k/n of the document height
    Fraction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollPlan {
    pub step: ScrollStep,
    pub steps: u32,
    pub pause: Duration,
}

impl ScrollPlan {
    pub fn script(&self, step: u32) -> String {
        match self.step {
            ScrollStep::By(pixels) => format!("window.scrollBy(0, {})", pixels),
            ScrollStep::Fraction => format!(
                "window.scrollTo(0, document.body.scrollHeight * {} / {})",
                step, self.steps
            ),
        }
    }
}

/// Per-field selectors, evaluated inside a candidate element.
///
/// `None` for `headline`/`link` means the candidate itself carries the
/// value; `None` elsewhere means the source has no such field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSelectors {
    pub headline: Option<&'static str>,
    pub description: Option<&'static str>,
    pub time: Option<&'static str>,
    pub category: Option<&'static str>,
    pub link: Option<&'static str>,
    pub image: Option<&'static str>,
}
