use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app::error::Result;
use crate::browser::ChromeSession;
use crate::config::Config;
use crate::domain::Source;
use crate::extractor::CrawlSettings;
use crate::pipeline::{Orchestrator, RunSettings};
use crate::sources;
use crate::store::lazy::LazyStore;

pub struct AppContext {
    pub config: Config,
    pub store: Arc<LazyStore>,
}

impl AppContext {
    /// Load configuration (default path unless `config_path` is given) and
    /// prepare a store handle. The database is opened on first use.
    pub fn new(config_path: Option<&Path>, db_path: Option<PathBuf>) -> Result<Self> {
        let config = match config_path {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };
        Self::with_config(config, db_path)
    }

    pub fn with_config(config: Config, db_path: Option<PathBuf>) -> Result<Self> {
        let db_path = match db_path {
            Some(p) => p,
            None => config.database_path()?,
        };

        Ok(Self {
            config,
            store: Arc::new(LazyStore::new(db_path)),
        })
    }

    /// Sources for a crawl: `only` when non-empty, else the configured list.
    pub fn crawl_sources(&self, only: &[Source]) -> Vec<Source> {
        if only.is_empty() {
            self.config.sources.enabled.clone()
        } else {
            only.to_vec()
        }
    }

    pub fn orchestrator(&self, only: &[Source], merge: bool) -> Result<Orchestrator> {
        let extractors = sources::extractors(&self.crawl_sources(only))?;
        let settings = RunSettings {
            staging_path: self.config.staging_path()?,
            seed_from_store: self.config.pipeline.seed_from_store,
            merge,
            crawl: CrawlSettings::from_browser(
                &self.config.browser,
                self.config.sources.max_per_page,
            ),
        };
        Ok(Orchestrator::new(extractors, settings))
    }

    pub async fn launch_browser(&self) -> Result<ChromeSession> {
        ChromeSession::launch(self.config.browser.clone()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::PipelineError;

    fn config_in(dir: &Path) -> Config {
        let mut config = Config::default();
        config.pipeline.staging_path = Some(dir.join("run.csv"));
        config.pipeline.database_path = Some(dir.join("news.db"));
        config
    }

    #[test]
    fn test_store_opens_lazily() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = AppContext::with_config(config_in(dir.path()), None).unwrap();
        assert!(!ctx.store.is_open());
        assert_eq!(ctx.store.path(), dir.path().join("news.db"));
        assert!(!dir.path().join("news.db").exists());
    }

    #[test]
    fn test_database_override_wins() {
        let dir = tempfile::tempdir().unwrap();
        let ctx =
            AppContext::with_config(config_in(dir.path()), Some(dir.path().join("other.db"))).unwrap();
        assert_eq!(ctx.store.path(), dir.path().join("other.db"));
    }

    #[test]
    fn test_only_narrows_configured_sources() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = AppContext::with_config(config_in(dir.path()), None).unwrap();
        assert_eq!(ctx.crawl_sources(&[]), Source::ALL.to_vec());
        assert_eq!(ctx.crawl_sources(&[Source::Guardian]), vec![Source::Guardian]);
        assert!(ctx.orchestrator(&[Source::Cbc], false).is_ok());
    }

    #[test]
    fn test_missing_config_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppContext::new(Some(&dir.path().join("nope.toml")), None)
            .err()
            .unwrap();
        assert!(matches!(err, PipelineError::Config(_)));
    }
}
