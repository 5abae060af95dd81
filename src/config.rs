//! Runtime settings: YAML file values, then command-line overrides.
//!
//! ```yaml
//! cache: true
//! look_for_new_articles: false   # with cache: true, rebuild from disk only
//! cache_dir: articles-cached
//! headline_limit: 10
//! site_url: https://www.hltv.org
//! browserless_url: http://localhost:3000
//! template: match_news
//! ```

use crate::cache::DEFAULT_CACHE_DIR;
use crate::cli::Cli;
use crate::discovery::DEFAULT_LIMIT;
use crate::error::{Error, Result};
use crate::summarizer::DEFAULT_TEMPLATE;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

pub const DEFAULT_SITE_URL: &str = "https://www.hltv.org";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Read and write summary records on disk.
    pub cache: bool,
    /// When false (and `cache` is on), skip discovery and load everything
    /// from the cache directory.
    pub look_for_new_articles: bool,
    pub cache_dir: PathBuf,
    pub headline_limit: usize,
    pub site_url: String,
    pub browserless_url: Option<String>,
    pub template: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache: true,
            look_for_new_articles: true,
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            headline_limit: DEFAULT_LIMIT,
            site_url: DEFAULT_SITE_URL.to_string(),
            browserless_url: None,
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

impl Settings {
    pub fn from_yaml(raw: &str) -> Result<Self> {
        serde_yaml::from_str(raw).map_err(|e| Error::Config(e.to_string()))
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path).await?;
        Self::from_yaml(&raw).map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    /// File settings (if any) with the command line applied on top.
    pub async fn resolve(cli: &Cli) -> Result<Self> {
        let mut settings = match &cli.config {
            Some(path) => Self::load(Path::new(path)).await?,
            None => Self::default(),
        };
        settings.apply(cli);
        settings.validate()?;
        Ok(settings)
    }

    pub fn apply(&mut self, cli: &Cli) {
        if cli.no_cache {
            self.cache = false;
        }
        if cli.cache_only {
            self.cache = true;
            self.look_for_new_articles = false;
        }
        if let Some(dir) = &cli.cache_dir {
            self.cache_dir = PathBuf::from(dir);
        }
        if let Some(limit) = cli.limit {
            self.headline_limit = limit;
        }
        if let Some(url) = &cli.browserless_url {
            self.browserless_url = Some(url.clone());
        }
        if let Some(template) = &cli.template {
            self.template = template.clone();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.headline_limit == 0 {
            return Err(Error::Config("headline_limit must be at least 1".to_string()));
        }
        self.site_url()?;
        Ok(())
    }

    pub fn site_url(&self) -> Result<Url> {
        Ok(Url::parse(&self.site_url)?)
    }

    /// Bulk-cache mode: no discovery, no navigation.
    pub fn cache_only(&self) -> bool {
        self.cache && !self.look_for_new_articles
    }
}
