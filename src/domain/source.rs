use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// News outlets the pipeline knows how to crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Bbc,
    #[serde(rename = "global")]
    GlobalNews,
    Guardian,
    Cbc,
    #[serde(rename = "nytimes")]
    NyTimes,
}

impl Source {
    /// Crawl order used when the configuration does not override it.
    pub const ALL: [Source; 5] = [
        Source::Bbc,
        Source::GlobalNews,
        Source::Guardian,
        Source::Cbc,
        Source::NyTimes,
    ];

    /// Label written to the `Source` column of the staging artifact.
    pub fn label(&self) -> &'static str {
        match self {
            Source::Bbc => "BBC",
            Source::GlobalNews => "GlobalNews",
            Source::Guardian => "The Guardian",
            Source::Cbc => "CBC",
            Source::NyTimes => "NYTimes",
        }
    }

    /// Short key used on the command line and in the config file.
    pub fn key(&self) -> &'static str {
        match self {
            Source::Bbc => "bbc",
            Source::GlobalNews => "global",
            Source::Guardian => "guardian",
            Source::Cbc => "cbc",
            Source::NyTimes => "nytimes",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|src| src.key() == needle || src.label().to_lowercase() == needle)
            .ok_or_else(|| {
                format!(
                    "Unknown source: {}. Expected one of: bbc, global, guardian, cbc, nytimes",
                    s
                )
            })
    }
}
