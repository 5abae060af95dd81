//! Keep/drop decision for raw headlines on a team's news tab.
//!
//! A headline is kept when its link is not one of the known non-news page
//! kinds and its title names the team or one of its members. The team name
//! is matched case-sensitively here, unlike team resolution in
//! [`crate::discovery`], which ignores case.

use crate::models::TeamRoster;

/// Link fragments marking pages without relevant content.
const EXCLUDED_FRAGMENTS: &[&str] = &[
    "former-00nation",
    "invited",
    "fantasy",
    "announced",
    "schedule",
    "team-list",
    "live-updates",
    "short",
    // unrelated to the major
    "bestia",
];

/// Link endings for reveal posts and general guides.
const EXCLUDED_SUFFIXES: &[&str] = &["revealed", "guide"];

/// A `(title, href)` pair as pulled from a listing anchor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawHeadline {
    pub title: Option<String>,
    pub href: Option<String>,
}

impl RawHeadline {
    /// Build a headline from borrowed anchor parts.
    pub fn new(title: Option<&str>, href: Option<&str>) -> Self {
        Self {
            title: title.map(str::to_string),
            href: href.map(str::to_string),
        }
    }
}

/// Whether a link points at a page kind that never carries team news.
///
/// # Arguments
///
/// * `href` - The anchor's `href`, relative or absolute
///
/// # Returns
///
/// `true` if the link contains an excluded fragment or ends with an
/// excluded suffix.
pub fn is_excluded_link(href: &str) -> bool {
    EXCLUDED_FRAGMENTS.iter().any(|f| href.contains(f))
        || EXCLUDED_SUFFIXES.iter().any(|s| href.ends_with(s))
}

/// Decide whether a listing headline is worth fetching for `team`.
///
/// # Arguments
///
/// * `team` - The team name, matched case-sensitively against the title
/// * `roster` - Players and coach; any of them named in the title counts
/// * `headline` - The raw anchor pair
///
/// # Returns
///
/// `false` when the title or href is missing or empty, or the link is
/// excluded; otherwise whether the title mentions the team or a member.
pub fn is_relevant(team: &str, roster: &TeamRoster, headline: &RawHeadline) -> bool {
    let (Some(title), Some(href)) = (headline.title.as_deref(), headline.href.as_deref()) else {
        return false;
    };
    if title.is_empty() || href.is_empty() {
        return false;
    }
    if is_excluded_link(href) {
        return false;
    }

    title.contains(team) || roster.mentioned_in(title)
}
