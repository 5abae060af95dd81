//! Command-line interface definitions for Match News.
//!
//! Every option except the two team names can also come from the YAML file
//! given with `--config`; flags given here win.

use clap::Parser;

/// Collect relevant, summarized news for both teams of a match.
///
/// # Examples
///
/// ```sh
/// # Live discovery, results printed to stdout
/// match_news NAVI FaZe
///
/// # Write JSON for the reporting tool
/// match_news NAVI FaZe -o ./reports
///
/// # Rebuild from previously cached summaries only
/// match_news NAVI FaZe --cache-only
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// First team, as listed on the site
    pub team_a: String,

    /// Second team, as listed on the site
    pub team_b: String,

    /// Output directory for the JSON result (stdout when omitted)
    #[arg(short, long)]
    pub output_dir: Option<String>,

    /// Optional path to a YAML settings file
    #[arg(short, long, env = "MATCH_NEWS_CONFIG")]
    pub config: Option<String>,

    /// Neither read nor write cached summaries
    #[arg(long, conflicts_with = "cache_only")]
    pub no_cache: bool,

    /// Only rebuild articles from the cache directory; no page loads
    #[arg(long)]
    pub cache_only: bool,

    /// Directory holding cached summaries
    #[arg(long, env = "MATCH_NEWS_CACHE_DIR")]
    pub cache_dir: Option<String>,

    /// Maximum number of headlines per team
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Browserless endpoint used to render pages
    #[arg(long, env = "BROWSERLESS_URL")]
    pub browserless_url: Option<String>,

    /// Name of the awful_aj chat template used for summaries
    #[arg(long)]
    pub template: Option<String>,
}

impl Cli {
    pub fn teams(&self) -> [String; 2] {
        [self.team_a.clone(), self.team_b.clone()]
    }
}
