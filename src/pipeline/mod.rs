//! Run-level plumbing: dedup, emission, orchestration and reporting.

pub mod dedup;
pub mod orchestrator;
pub mod report;
pub mod sink;

pub use dedup::DedupSet;
pub use orchestrator::{CancelHandle, Orchestrator, RunSettings};
pub use report::{RunPhase, RunReport, SourceReport};
pub use sink::{Offer, RecordSink};
