//! JSON output for the reporting tool.
//!
//! One file per match, named after both teams:
//! ```text
//! json_output_dir/
//! └── navi-vs-faze.json
//! ```

use crate::models::MatchNews;
use crate::utils::slugify;
use std::error::Error;
use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info, instrument};

pub fn output_path(json_output_dir: &str, match_news: &MatchNews) -> PathBuf {
    let [a, b] = &match_news.teams;
    PathBuf::from(json_output_dir).join(format!("{}-vs-{}.json", slugify(a), slugify(b)))
}

/// Write `match_news` as pretty JSON under `json_output_dir`, creating the
/// directory when needed.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir))]
pub async fn write_match_news(
    match_news: &MatchNews,
    json_output_dir: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(match_news)?;

    if let Err(e) = fs::create_dir_all(json_output_dir).await {
        error!(error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let path = output_path(json_output_dir, match_news);
    fs::write(&path, json).await?;
    info!(path = %path.display(), articles = match_news.articles.len(), "Wrote JSON file");

    Ok(path)
}
