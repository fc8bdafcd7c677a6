//! # newsreel
//!
//! Crawls news sites with a headless browser, stages every article it
//! finds to a CSV file, and merges that file into a local SQLite store.
//!
//! ## Architecture
//!
//! ```text
//! Browser → Extractor → DedupSet → StagedWriter → Merger → Store
//! ```
//!
//! One browser session and one staging artifact cover the whole run. The
//! merge is insert-if-absent, so re-running over the same pages adds
//! nothing.
//!
//! ## Quick Start
//!
//! ```bash
//! # Crawl everything and merge
//! newsreel crawl
//!
//! # Crawl two sources, stage only
//! newsreel crawl --only bbc,cbc --no-merge
//!
//! # Merge a staged file later
//! newsreel merge ~/.local/share/newsreel/staging/all_news_data.csv
//!
//! # Inspect the store
//! newsreel list --source BBC
//! newsreel stats
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together configuration
/// and the lazily opened store.
pub mod app;

/// Headless browser boundary.
///
/// - [`BrowserSession`](browser::BrowserSession) / [`ElementHandle`](browser::ElementHandle): what extractors drive
/// - [`ChromeSession`](browser::ChromeSession): chromiumoxide implementation
pub mod browser;

/// Command-line interface using clap.
///
/// - `crawl [--only] [--no-merge]` - Run the pipeline
/// - `merge <path>` - Merge a staging file
/// - `list [--source] [--limit]` - List stored articles
/// - `stats` - Article counts per source
pub mod cli;

/// Configuration loaded from `~/.config/newsreel/config.toml`.
pub mod config;

/// Core domain models.
///
/// - [`ArticleRecord`](domain::ArticleRecord): one extracted article
/// - [`Source`](domain::Source): the outlets newsreel crawls
pub mod domain;

/// Shared per-page crawl skeleton and field extraction helpers.
pub mod extractor;

/// Idempotent merge of a staging file into the store.
pub mod merge;

/// Run orchestration: dedup set, record sink, reports.
pub mod pipeline;

/// Source profiles for BBC, Global News, The Guardian, CBC and the New York Times.
pub mod sources;

/// The eight-column staging CSV format and its writer.
pub mod staging;

/// SQLite persistence layer.
///
/// - [`ArticleStore`](store::ArticleStore): Trait defining storage operations
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
/// - [`LazyStore`](store::lazy::LazyStore): opens the database on first use
pub mod store;
