//! Data models shared across the pipeline.
//!
//! - [`CandidateHeadline`]: a relevant headline found on a team page, not yet fetched
//! - [`TeamRoster`]: member names used as a relevance signal
//! - [`Article`]: a summarized article attributed to one team
//! - [`CacheRecord`]: the on-disk form of a summary
//! - [`MatchNews`]: the document written for the reporting tool

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// A headline that survived relevance filtering on a team's news tab.
///
/// The title is optional because the listing markup does not always render
/// one; candidates without a title are skipped by the repo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateHeadline {
    /// Absolute link to the article page.
    pub url: Url,
    /// Headline text as rendered in the listing.
    pub title: Option<String>,
}

/// Ordered list of player and coach display names for a team.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamRoster {
    members: Vec<String>,
}

impl TeamRoster {
    pub fn new(members: Vec<String>) -> Self {
        Self { members }
    }

    pub fn push(&mut self, member: String) {
        self.members.push(member);
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    /// True when any member name occurs verbatim inside `text`.
    pub fn mentioned_in(&self, text: &str) -> bool {
        self.members.iter().any(|m| !m.is_empty() && text.contains(m.as_str()))
    }
}

impl<S: Into<String>> FromIterator<S> for TeamRoster {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

/// A summarized news article, attributed to the team it was fetched under.
///
/// The same story may exist once per team since fetching is keyed by team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub summary: String,
    pub primary_team: String,
}

impl Article {
    pub fn new(title: impl Into<String>, summary: impl Into<String>, team: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            summary: summary.into(),
            primary_team: team.into(),
        }
    }

    pub fn belongs_to_any(&self, teams: &[String]) -> bool {
        teams.iter().any(|t| *t == self.primary_team)
    }
}

/// Summary record persisted per `(team, title)`.
///
/// Only `summary` is required so that older records holding nothing else
/// still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached_at: Option<DateTime<Utc>>,
}

impl CacheRecord {
    pub fn from_article(article: &Article) -> Self {
        Self {
            summary: article.summary.clone(),
            title: Some(article.title.clone()),
            team: Some(article.primary_team.clone()),
            cached_at: Some(Utc::now()),
        }
    }
}

/// Result document handed to the reporting tool.
#[derive(Debug, Serialize, Deserialize)]
pub struct MatchNews {
    pub teams: [String; 2],
    pub generated_at: DateTime<Utc>,
    pub articles: Vec<Article>,
}
