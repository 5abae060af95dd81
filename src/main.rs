//! # Match News
//!
//! Collects recent news for both teams of an upcoming match, keeps only the
//! headlines that are about the team or its players, and summarizes each
//! article with an LLM. Summaries are cached on disk so later runs only pay
//! for new articles.
//!
//! ## Usage
//!
//! ```sh
//! match_news NAVI FaZe -o ./reports
//! ```
//!
//! ## Architecture
//!
//! 1. **Discovery**: resolve each team, read its roster and news tab, filter
//!    headlines for relevance
//! 2. **Fetching**: load each article page, one page at a time
//! 3. **Summarizing**: send title and body to the LLM, cache the result
//! 4. **Output**: write the articles as JSON for the reporting tool

use chrono::Utc;
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod browser;
mod cache;
mod cli;
mod config;
mod discovery;
mod error;
mod models;
mod outputs;
mod relevance;
mod repo;
mod summarizer;
mod utils;

use browser::HttpBrowser;
use cache::ArticleCache;
use cli::Cli;
use config::Settings;
use models::MatchNews;
use outputs::json;
use repo::{ArticleRepo, RepoOptions};
use summarizer::LlmSummarizer;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("match_news starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let settings = Settings::resolve(&args).await?;
    info!(
        cache = settings.cache,
        look_for_new_articles = settings.look_for_new_articles,
        cache_dir = %settings.cache_dir.display(),
        limit = settings.headline_limit,
        "Resolved settings"
    );

    // Early check: ensure JSON output dir is writable
    if let Some(dir) = &args.output_dir {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(path = %dir, error = %e, "JSON output directory is not writable");
            return Err(e);
        }
    }

    let summarizer = if settings.cache_only() {
        info!("Cache-only mode; summarizer not loaded");
        None
    } else {
        Some(LlmSummarizer::load(&settings.template).await?)
    };

    let browser = HttpBrowser::new(settings.browserless_url.as_deref())?;
    let cache = ArticleCache::new(settings.cache_dir.clone());
    let mut repo = ArticleRepo::new(browser, summarizer, cache, RepoOptions::from_settings(&settings)?);

    let teams = args.teams();
    let articles = match repo.find_by_teams(&teams).await {
        Ok(articles) => articles,
        Err(e) => {
            error!(error = %e, "Could not collect articles");
            return Err(e.into());
        }
    };
    info!(count = articles.len(), "Collected articles");

    let match_news = MatchNews {
        teams,
        generated_at: Utc::now(),
        articles,
    };

    match &args.output_dir {
        Some(dir) => {
            json::write_match_news(&match_news, dir).await?;
        }
        None => println!("{}", serde_json::to_string_pretty(&match_news)?),
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
