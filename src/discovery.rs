//! Headline discovery for a single team.
//!
//! Discovery runs in three page-level steps, all through the shared
//! [`SessionSlot`]:
//!
//! 1. **Resolve**: search the site for the team and pick the link whose text
//!    equals the team name, ignoring case
//! 2. **Roster**: read player names (from `title` attributes) and the coach
//!    from the team profile page
//! 3. **Headlines**: read the news tab anchors on the same page, filter them
//!    with [`crate::relevance`] and keep the first `limit`
//!
//! The listing is over-fetched (`limit × 6` anchors) because most anchors are
//! filtered out; truncation to `limit` happens after filtering.

use crate::browser::{BrowserSession, Document, SessionSlot};
use crate::error::{Error, Result};
use crate::models::{CandidateHeadline, TeamRoster};
use crate::relevance::{RawHeadline, is_relevant};
use tracing::{debug, info, instrument, warn};
use url::Url;

pub const DEFAULT_LIMIT: usize = 10;
/// Raw anchors read per requested headline.
const OVERFETCH_FACTOR: usize = 6;

const WAIT_FOR_SEARCH: &str = ".contentCol";
const SELECTOR_SEARCH: &str = r#"td a[href^="/team"]"#;

const WAIT_FOR_TEAM: &str = ".contentCol";
const SELECTOR_MEMBERS: &str = r#".bodyshot-team a[href^="/player"]"#;
const SELECTOR_COACH: &str = r#".profile-team-stat a[href^="/coach"] .a-default"#;
const SELECTOR_HEADLINES: &str = "a.subTab-newsArticle";
const NEWS_TAB: &str = "tab-newsBox";

pub struct HeadlineDiscovery<'a, B> {
    session: &'a SessionSlot<B>,
    base_url: &'a Url,
}

impl<'a, B: BrowserSession> HeadlineDiscovery<'a, B> {
    pub fn new(session: &'a SessionSlot<B>, base_url: &'a Url) -> Self {
        Self { session, base_url }
    }

    /// Find up to `limit` relevant headlines for `team`, in page order.
    ///
    /// # Errors
    ///
    /// [`Error::TeamNotFound`] when the search has no exact match; navigation
    /// errors from the session are passed through.
    #[instrument(level = "info", skip(self))]
    pub async fn discover(&self, team: &str, limit: usize) -> Result<Vec<CandidateHeadline>> {
        info!("Fetching headlines for team");
        let team_path = self.resolve_team_page(team).await?;

        let mut team_url = self.base_url.join(&team_path)?;
        team_url.set_fragment(Some(NEWS_TAB));
        let page = self.session.navigate(team_url.as_str(), WAIT_FOR_TEAM).await?;

        let roster = extract_roster(&page)?;
        debug!(members = ?roster.members(), "Extracted roster");

        let raw = extract_headlines(&page, limit.saturating_mul(OVERFETCH_FACTOR))?;
        let raw_count = raw.len();

        let mut candidates = Vec::with_capacity(limit.min(raw_count));
        for headline in raw.into_iter().filter(|h| is_relevant(team, &roster, h)) {
            if candidates.len() == limit {
                break;
            }
            let href = headline.href.as_deref().unwrap_or_default();
            match self.base_url.join(href) {
                Ok(url) => candidates.push(CandidateHeadline {
                    url,
                    title: headline.title,
                }),
                Err(e) => warn!(%href, error = %e, "Dropping headline with unusable link"),
            }
        }

        info!(raw = raw_count, kept = candidates.len(), "Discovered headlines");
        Ok(candidates)
    }

    async fn resolve_team_page(&self, team: &str) -> Result<String> {
        let mut search_url = self.base_url.join("/search")?;
        search_url.set_query(Some(&format!("query={}", urlencoding::encode(team))));

        let page = self.session.navigate(search_url.as_str(), WAIT_FOR_SEARCH).await?;
        let wanted = team.to_lowercase();

        let href = page
            .query(SELECTOR_SEARCH)?
            .into_iter()
            .find(|link| link.text().trim().to_lowercase() == wanted)
            .and_then(|link| link.attribute("href"))
            .filter(|href| !href.is_empty())
            .map(str::to_string);

        href.ok_or_else(|| Error::TeamNotFound {
            team: team.to_string(),
        })
    }
}

/// Player names from `title` attributes plus the coach, when listed.
pub fn extract_roster(page: &Document) -> Result<TeamRoster> {
    let mut roster: TeamRoster = page
        .query(SELECTOR_MEMBERS)?
        .into_iter()
        .filter_map(|a| a.attribute("title"))
        .filter(|name| !name.is_empty())
        .collect();

    if let Some(coach) = page.query_one(SELECTOR_COACH)? {
        let name = coach.text().replace('\'', "").trim().to_string();
        if !name.is_empty() {
            roster.push(name);
        }
    }

    Ok(roster)
}

/// The first `max` news tab anchors as `(second text line, href)` pairs.
pub fn extract_headlines(page: &Document, max: usize) -> Result<Vec<RawHeadline>> {
    Ok(page
        .query(SELECTOR_HEADLINES)?
        .into_iter()
        .take(max)
        .map(|a| RawHeadline {
            // line one is the category label
            title: a.lines().into_iter().nth(1),
            href: a.attribute("href").map(str::to_string),
        })
        .collect())
}
