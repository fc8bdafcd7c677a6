use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::domain::Source;
use crate::merge::MergeReport;

/// Where a run is. Phases only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "source", rename_all = "lowercase")]
pub enum RunPhase {
    Idle,
    Crawling(Source),
    Merging,
    Done,
}

impl RunPhase {
    fn rank(&self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Crawling(_) => 1,
            Self::Merging => 2,
            Self::Done => 3,
        }
    }

    /// `Crawling` may follow `Crawling` (next source); nothing moves back.
    pub fn can_advance_to(&self, next: RunPhase) -> bool {
        next.rank() >= self.rank() && (next != *self || matches!(next, Self::Crawling(_)))
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Crawling(source) => write!(f, "crawling {}", source),
            Self::Merging => write!(f, "merging"),
            Self::Done => write!(f, "done"),
        }
    }
}

/// Counters for one source's crawl.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    pub source: Source,
    pub pages_visited: usize,
    pub pages_skipped: usize,
    /// Candidate elements examined
    pub candidates: usize,
    /// Records staged
    pub accepted: usize,
    /// Records whose link another record already claimed this run
    pub duplicates: usize,
    /// Candidates dropped for a missing headline or unusable link
    pub invalid: usize,
    /// The browser session died while this source was crawling
    pub session_lost: bool,
}

impl SourceReport {
    pub fn new(source: Source) -> Self {
        Self {
            source,
            pages_visited: 0,
            pages_skipped: 0,
            candidates: 0,
            accepted: 0,
            duplicates: 0,
            invalid: 0,
            session_lost: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub staging_path: PathBuf,
    pub per_source: Vec<SourceReport>,
    /// `None` when merging was disabled for the run
    pub merge: Option<MergeReport>,
    pub errors: Vec<String>,
    pub cancelled: bool,
    pub phases: Vec<RunPhase>,
}

impl RunReport {
    pub fn new(staging_path: PathBuf) -> Self {
        Self {
            staging_path,
            per_source: Vec::new(),
            merge: None,
            errors: Vec::new(),
            cancelled: false,
            phases: vec![RunPhase::Idle],
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phases.last().copied().unwrap_or(RunPhase::Idle)
    }

    pub(crate) fn advance(&mut self, next: RunPhase) {
        let current = self.phase();
        if !current.can_advance_to(next) {
            tracing::warn!("Ignoring phase change {} -> {}", current, next);
            return;
        }
        tracing::debug!("Run phase: {}", next);
        self.phases.push(next);
    }

    pub fn total_staged(&self) -> usize {
        self.per_source.iter().map(|s| s.accepted).sum()
    }

    pub fn session_lost(&self) -> bool {
        self.per_source.iter().any(|s| s.session_lost)
    }
}
