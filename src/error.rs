//! Error taxonomy for the discovery and caching pipeline.
//!
//! Two kinds of failure leave [`crate::repo::ArticleRepo::find_by_teams`]:
//! an unknown team ([`Error::TeamNotFound`]) and a cache record that no
//! longer parses ([`Error::CacheCorrupt`]). Everything else raised while
//! fetching a single article is recorded as a skip by the repo.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("team not found: {team}")]
    TeamNotFound { team: String },

    #[error("article title not found at {url}")]
    ArticleTitleMissing { url: String },

    #[error("corrupt cache record at {}: {source}", path.display())]
    CacheCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("page {url} never matched ready selector `{selector}`")]
    NotReady { url: String, selector: String },

    #[error("summarizer error: {0}")]
    Summarize(String),

    #[error("invalid selector `{0}`")]
    Selector(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
