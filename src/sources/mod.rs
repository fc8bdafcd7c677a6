//! Per-source crawl profiles.

pub mod bbc;
pub mod cbc;
pub mod global;
pub mod guardian;
pub mod nytimes;

pub use bbc::BbcExtractor;
pub use cbc::CbcExtractor;
pub use global::GlobalNewsExtractor;
pub use guardian::GuardianExtractor;
pub use nytimes::NyTimesExtractor;

use crate::app::Result;
use crate::domain::Source;
use crate::extractor::Extractor;

pub fn extractor_for(source: Source) -> Result<Box<dyn Extractor>> {
    Ok(match source {
        Source::Bbc => Box::new(BbcExtractor::new()?),
        Source::GlobalNews => Box::new(GlobalNewsExtractor::new()?),
        Source::Guardian => Box::new(GuardianExtractor::new()?),
        Source::Cbc => Box::new(CbcExtractor::new()?),
        Source::NyTimes => Box::new(NyTimesExtractor::new()?),
    })
}

/// Extractors for `sources`, in the given order, skipping repeats.
pub fn extractors(sources: &[Source]) -> Result<Vec<Box<dyn Extractor>>> {
    let mut seen = Vec::with_capacity(sources.len());
    for source in sources {
        if !seen.contains(source) {
            seen.push(*source);
        }
    }
    seen.into_iter().map(extractor_for).collect()
}
