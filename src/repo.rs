//! Article repository: turns a pair of teams into summarized articles.
//!
//! # Resolution order
//!
//! 1. **Store**: if the repo already holds an article for either team, the
//!    stored articles for both teams are returned as-is. The other team is
//!    not fetched even when it has nothing stored.
//! 2. **Bulk cache**: with `cache` on and `look_for_new_articles` off, every
//!    cache record prefixed by a requested team is loaded; nothing is fetched.
//! 3. **Live**: discovery and fetching for the first team, then the second.
//!    Each candidate comes from the cache when a record exists, otherwise it
//!    is fetched, summarized and written back.
//!
//! A failing candidate never stops the loop; it is recorded in the
//! [`FetchReport`] as a skip. Only an unknown team or a corrupt cache record
//! fails the call.
//!
//! # Concurrency
//!
//! All page loads go through one [`SessionSlot`], one after another.
//! [`ArticleRepo::find_by_teams`] takes `&mut self`, so a repo shared between
//! callers has to sit behind a lock.

use crate::browser::{BrowserSession, Document, SessionSlot};
use crate::cache::ArticleCache;
use crate::config::Settings;
use crate::discovery::HeadlineDiscovery;
use crate::error::{Error, Result};
use crate::models::{Article, CacheRecord, CandidateHeadline};
use crate::summarizer::Summarizer;
use crate::utils::truncate_for_log;
use std::fmt;
use tracing::{debug, info, instrument, warn};
use url::Url;

const WAIT_FOR_ARTICLE: &str = "article.newsitem";
const ARTICLE_TITLE: &str = "h1.headline";
const ARTICLE_CONTENT: &str = ".newstext-con p";

/// Append-only collection of every article produced by one repo.
#[derive(Debug, Default)]
pub struct ArticleStore {
    articles: Vec<Article>,
}

impl ArticleStore {
    pub fn push(&mut self, article: Article) {
        self.articles.push(article);
    }

    pub fn has_any_for(&self, teams: &[String]) -> bool {
        self.articles.iter().any(|a| a.belongs_to_any(teams))
    }

    pub fn for_teams(&self, teams: &[String]) -> Vec<Article> {
        self.articles
            .iter()
            .filter(|a| a.belongs_to_any(teams))
            .cloned()
            .collect()
    }

    pub fn all(&self) -> &[Article] {
        &self.articles
    }
}

/// Where the articles of a call came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Store,
    BulkCache,
    Live,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingTitle,
    Failed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingTitle => write!(f, "headline has no title"),
            SkipReason::Failed(e) => write!(f, "{e}"),
        }
    }
}

/// What happened to one candidate headline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateOutcome {
    Fetched(Article),
    Cached(Article),
    Skipped(SkipReason),
}

impl CandidateOutcome {
    pub fn article(&self) -> Option<&Article> {
        match self {
            CandidateOutcome::Fetched(a) | CandidateOutcome::Cached(a) => Some(a),
            CandidateOutcome::Skipped(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub team: String,
    pub url: Url,
    pub outcome: CandidateOutcome,
}

/// Per-call account of every candidate, including the skipped ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchReport {
    pub resolution: Resolution,
    pub entries: Vec<ReportEntry>,
    /// Articles rebuilt in bulk-cache mode.
    pub loaded_from_cache: usize,
}

impl FetchReport {
    fn new(resolution: Resolution) -> Self {
        Self {
            resolution,
            entries: Vec::new(),
            loaded_from_cache: 0,
        }
    }

    pub fn fetched(&self) -> usize {
        self.count(|o| matches!(o, CandidateOutcome::Fetched(_)))
    }

    pub fn cached(&self) -> usize {
        self.count(|o| matches!(o, CandidateOutcome::Cached(_)))
    }

    pub fn skipped(&self) -> impl Iterator<Item = (&ReportEntry, &SkipReason)> {
        self.entries.iter().filter_map(|e| match &e.outcome {
            CandidateOutcome::Skipped(reason) => Some((e, reason)),
            _ => None,
        })
    }

    fn count(&self, pred: impl Fn(&CandidateOutcome) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(&e.outcome)).count()
    }
}

/// Repo behaviour switches, usually taken from [`Settings`].
#[derive(Debug, Clone)]
pub struct RepoOptions {
    pub cache: bool,
    pub look_for_new_articles: bool,
    pub headline_limit: usize,
    pub site_url: Url,
}

impl RepoOptions {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            cache: settings.cache,
            look_for_new_articles: settings.look_for_new_articles,
            headline_limit: settings.headline_limit,
            site_url: settings.site_url()?,
        })
    }

    fn cache_only(&self) -> bool {
        self.cache && !self.look_for_new_articles
    }
}

pub struct ArticleRepo<B, S> {
    session: SessionSlot<B>,
    summarizer: S,
    cache: ArticleCache,
    options: RepoOptions,
    store: ArticleStore,
    last_report: Option<FetchReport>,
}

impl<B: BrowserSession, S: Summarizer> ArticleRepo<B, S> {
    pub fn new(session: B, summarizer: S, cache: ArticleCache, options: RepoOptions) -> Self {
        Self {
            session: SessionSlot::new(session),
            summarizer,
            cache,
            options,
            store: ArticleStore::default(),
            last_report: None,
        }
    }

    #[cfg(test)]
    pub fn store(&self) -> &ArticleStore {
        &self.store
    }

    /// Report of the most recent [`Self::find_by_teams`] call, also kept when
    /// that call failed part-way.
    #[cfg(test)]
    pub fn last_report(&self) -> Option<&FetchReport> {
        self.last_report.as_ref()
    }

    /// Articles for both teams of a match.
    ///
    /// # Errors
    ///
    /// [`Error::TeamNotFound`] when a team cannot be resolved and
    /// [`Error::CacheCorrupt`] when a cache record does not parse. Articles
    /// gathered before the failure stay in the store.
    #[instrument(level = "info", skip(self))]
    pub async fn find_by_teams(&mut self, teams: &[String; 2]) -> Result<Vec<Article>> {
        if self.store.has_any_for(teams) {
            info!(stored = self.store.all().len(), "Returning stored articles");
            self.last_report = Some(FetchReport::new(Resolution::Store));
            return Ok(self.store.for_teams(teams));
        }

        let cache_only = self.options.cache_only();
        let mut report = FetchReport::new(if cache_only {
            Resolution::BulkCache
        } else {
            Resolution::Live
        });
        let result = if cache_only {
            self.load_from_cache(teams, &mut report).await
        } else {
            self.fetch_from_match_teams(teams, &mut report).await
        };

        log_report(&report);
        self.last_report = Some(report);
        result?;

        Ok(self.store.for_teams(teams))
    }

    async fn load_from_cache(&mut self, teams: &[String; 2], report: &mut FetchReport) -> Result<()> {
        for team in teams {
            for (title, record) in self.cache.list_for(team).await? {
                self.store.push(Article::new(title, record.summary, team.as_str()));
                report.loaded_from_cache += 1;
            }
        }
        info!(loaded = report.loaded_from_cache, "Returning cached articles");
        Ok(())
    }

    async fn fetch_from_match_teams(&mut self, teams: &[String; 2], report: &mut FetchReport) -> Result<()> {
        for team in teams {
            let candidates = HeadlineDiscovery::new(&self.session, &self.options.site_url)
                .discover(team, self.options.headline_limit)
                .await?;
            let titles: Vec<&str> = candidates
                .iter()
                .map(|c| c.title.as_deref().unwrap_or_default())
                .collect();
            debug!(%team, ?titles, "Articles list");

            for candidate in candidates {
                let outcome = self.fetch_one(&candidate, team).await?;
                if let Some(article) = outcome.article() {
                    self.store.push(article.clone());
                }
                report.entries.push(ReportEntry {
                    team: team.clone(),
                    url: candidate.url,
                    outcome,
                });
            }
        }
        Ok(())
    }

    /// Resolve one candidate. Only cache corruption is returned as an error;
    /// fetch failures come back as [`CandidateOutcome::Skipped`].
    #[instrument(level = "info", skip(self, candidate), fields(url = %candidate.url))]
    async fn fetch_one(&self, candidate: &CandidateHeadline, team: &str) -> Result<CandidateOutcome> {
        let Some(title) = candidate.title.as_deref() else {
            warn!("Skipping headline without a title");
            return Ok(CandidateOutcome::Skipped(SkipReason::MissingTitle));
        };

        if self.options.cache && self.cache.has(team, title).await {
            let record = self.cache.read(team, title).await?;
            debug!("Returning cached file for article");
            return Ok(CandidateOutcome::Cached(Article::new(title, record.summary, team)));
        }

        match self.fetch_live(&candidate.url, team).await {
            Ok(article) => {
                if self.options.cache {
                    let record = CacheRecord::from_article(&article);
                    if let Err(e) = self.cache.write(team, title, &record).await {
                        warn!(error = %e, "Failed to cache article summary");
                    }
                }
                Ok(CandidateOutcome::Fetched(article))
            }
            // timeouts and ads posing as headlines end up here
            Err(e) => {
                warn!(error = %e, "Skipping article");
                Ok(CandidateOutcome::Skipped(SkipReason::Failed(e.to_string())))
            }
        }
    }

    async fn fetch_live(&self, url: &Url, team: &str) -> Result<Article> {
        let (title, content) = {
            let page = self.session.navigate(url.as_str(), WAIT_FOR_ARTICLE).await?;
            (article_title(&page)?, article_content(&page)?)
        };
        debug!(%title, content = %truncate_for_log(&content, 200), "Scraped article");

        let summary = self.summarizer.summarize(&title, &content, team).await?;
        Ok(Article::new(title, summary.summary, team))
    }
}

fn article_title(page: &Document) -> Result<String> {
    let title = page
        .query_one(ARTICLE_TITLE)?
        .map(|h| h.text().trim().to_string())
        .unwrap_or_default();

    if title.is_empty() {
        return Err(Error::ArticleTitleMissing {
            url: page.url().to_string(),
        });
    }
    Ok(title)
}

fn article_content(page: &Document) -> Result<String> {
    let paragraphs: Vec<String> = page.query(ARTICLE_CONTENT)?.iter().map(|p| p.text()).collect();
    Ok(paragraphs.join("\n\n"))
}

fn log_report(report: &FetchReport) {
    info!(
        resolution = ?report.resolution,
        fetched = report.fetched(),
        cached = report.cached(),
        skipped = report.skipped().count(),
        loaded_from_cache = report.loaded_from_cache,
        "Finished resolving articles"
    );
    for (entry, reason) in report.skipped() {
        info!(team = %entry.team, url = %entry.url, %reason, "Skipped candidate");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::testing::FakeBrowser;
    use crate::discovery::fixtures::*;
    use crate::summarizer::testing::FakeSummarizer;
    use tempfile::TempDir;

    fn teams() -> [String; 2] {
        ["NAVI".to_string(), "FaZe".to_string()]
    }

    fn article_url(id: u32) -> String {
        format!("{BASE}/news/{id}/story")
    }

    fn article_page(title: &str, paragraphs: &[&str]) -> String {
        let body: String = paragraphs.iter().map(|p| format!("<p>{p}</p>")).collect();
        format!(
            r#"<html><body><article class="newsitem"><h1 class="headline">{title}</h1>
<div class="newstext-con">{body}</div></article></body></html>"#
        )
    }

    /// NAVI has stories 1-3, FaZe has 11-12. Pages for articles in
    /// `missing` are not served.
    fn browser(missing: &[u32]) -> FakeBrowser {
        let navi_news = [
            ("NAVI story one", "/news/1/story"),
            ("s1mple story two", "/news/2/story"),
            ("NAVI story three", "/news/3/story"),
        ];
        let faze_news = [("FaZe story one", "/news/11/story"), ("ropz story two", "/news/12/story")];

        let mut b = FakeBrowser::new()
            .page(&search_url("NAVI"), &search_page(&[("NAVI", "/team/4608/navi")]))
            .page(&search_url("FaZe"), &search_page(&[("FaZe", "/team/6667/faze")]))
            .page(&team_url("/team/4608/navi"), &team_page(&["s1mple"], None, &navi_news))
            .page(&team_url("/team/6667/faze"), &team_page(&["ropz"], None, &faze_news));

        for (title, href) in navi_news.iter().chain(faze_news.iter()) {
            let id: u32 = href.split('/').nth(2).unwrap().parse().unwrap();
            if !missing.contains(&id) {
                b = b.page(&format!("{BASE}{href}"), &article_page(title, &["First.", "Second."]));
            }
        }
        b
    }

    fn options(cache: bool, look_for_new_articles: bool) -> RepoOptions {
        RepoOptions {
            cache,
            look_for_new_articles,
            headline_limit: 10,
            site_url: Url::parse(BASE).unwrap(),
        }
    }

    fn repo(
        browser: FakeBrowser,
        summarizer: FakeSummarizer,
        opts: RepoOptions,
    ) -> (ArticleRepo<FakeBrowser, FakeSummarizer>, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let cache = ArticleCache::new(dir.path());
        (ArticleRepo::new(browser, summarizer, cache, opts), dir)
    }

    fn titles(articles: &[Article]) -> Vec<&str> {
        articles.iter().map(|a| a.title.as_str()).collect()
    }

    #[tokio::test]
    async fn test_live_fetch_both_teams_in_order() {
        let summarizer = FakeSummarizer::new();
        let calls = summarizer.call_log();
        let (mut repo, _dir) = repo(browser(&[]), summarizer, options(true, true));

        let articles = repo.find_by_teams(&teams()).await.unwrap();
        assert_eq!(
            titles(&articles),
            vec!["NAVI story one", "s1mple story two", "NAVI story three", "FaZe story one", "ropz story two"]
        );
        assert_eq!(articles[0].summary, "NAVI: NAVI story one");
        assert_eq!(articles[4].primary_team, "FaZe");

        let calls = calls.borrow();
        assert_eq!(calls[0].1, "First.\n\nSecond.");
        assert_eq!(calls[0].2, "NAVI");

        let report = repo.last_report().unwrap();
        assert_eq!(report.resolution, Resolution::Live);
        assert_eq!(report.fetched(), 5);
    }

    #[tokio::test]
    async fn test_second_call_uses_store() {
        let browser = browser(&[]);
        let visits = browser.visit_log();
        let (mut repo, _dir) = repo(browser, FakeSummarizer::new(), options(false, true));

        let first = repo.find_by_teams(&teams()).await.unwrap();
        let loads = visits.borrow().len();
        let second = repo.find_by_teams(&teams()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(visits.borrow().len(), loads);
        assert_eq!(repo.last_report().unwrap().resolution, Resolution::Store);
    }

    #[tokio::test]
    async fn test_store_hit_for_one_team_skips_the_other() {
        let browser = browser(&[]);
        let visits = browser.visit_log();
        let (mut repo, _dir) = repo(browser, FakeSummarizer::new(), options(false, true));
        repo.find_by_teams(&teams()).await.unwrap();
        let loads = visits.borrow().len();

        let pair = ["NAVI".to_string(), "Vitality".to_string()];
        let articles = repo.find_by_teams(&pair).await.unwrap();

        assert_eq!(articles.len(), 3);
        assert!(articles.iter().all(|a| a.primary_team == "NAVI"));
        assert_eq!(visits.borrow().len(), loads);
    }

    #[tokio::test]
    async fn test_failing_candidate_does_not_stop_the_rest() {
        let (mut repo, _dir) = repo(browser(&[2]), FakeSummarizer::new(), options(true, true));

        let articles = repo.find_by_teams(&teams()).await.unwrap();
        assert_eq!(
            titles(&articles),
            vec!["NAVI story one", "NAVI story three", "FaZe story one", "ropz story two"]
        );

        let report = repo.last_report().unwrap();
        let skipped: Vec<_> = report.skipped().collect();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].0.url.as_str(), article_url(2));
        assert!(matches!(skipped[0].1, SkipReason::Failed(_)));
    }

    #[tokio::test]
    async fn test_summarizer_failure_is_skipped() {
        let summarizer = FakeSummarizer::new().failing_on("FaZe story one");
        let (mut repo, dir) = repo(browser(&[]), summarizer, options(true, true));

        let articles = repo.find_by_teams(&teams()).await.unwrap();
        assert_eq!(articles.len(), 4);
        assert!(!ArticleCache::new(dir.path()).has("FaZe", "FaZe story one").await);
    }

    #[tokio::test]
    async fn test_page_without_headline_is_skipped() {
        let browser = browser(&[1]).page(&article_url(1), &article_page("", &["Ad copy."]));
        let (mut repo, _dir) = repo(browser, FakeSummarizer::new(), options(false, true));

        let articles = repo.find_by_teams(&teams()).await.unwrap();
        assert_eq!(articles.len(), 4);

        let report = repo.last_report().unwrap();
        let (_, reason) = report.skipped().next().unwrap();
        assert!(reason.to_string().contains("article title not found"));
    }

    #[tokio::test]
    async fn test_live_fetch_writes_cache_and_later_reads_it() {
        let (mut repo, dir) = repo(browser(&[]), FakeSummarizer::new(), options(true, true));
        repo.find_by_teams(&teams()).await.unwrap();

        let cache = ArticleCache::new(dir.path());
        let record = cache.read("NAVI", "s1mple story two").await.unwrap();
        assert_eq!(record.summary, "NAVI: s1mple story two");

        // a fresh repo finds every summary on disk and calls the model for none
        let summarizer = FakeSummarizer::new();
        let calls = summarizer.call_log();
        let browser = browser(&[]);
        let visits = browser.visit_log();
        let mut fresh = ArticleRepo::new(browser, summarizer, cache, options(true, true));

        let articles = fresh.find_by_teams(&teams()).await.unwrap();
        assert_eq!(articles.len(), 5);
        assert!(calls.borrow().is_empty());
        assert_eq!(fresh.last_report().unwrap().cached(), 5);
        assert!(!visits.borrow().contains(&article_url(1)));
    }

    #[tokio::test]
    async fn test_cache_disabled_neither_reads_nor_writes() {
        let (mut repo, dir) = repo(browser(&[]), FakeSummarizer::new(), options(false, true));
        let cache = ArticleCache::new(dir.path());
        cache
            .write("NAVI", "NAVI story one", &CacheRecord::from_article(&Article::new("x", "stale", "NAVI")))
            .await
            .unwrap();

        let articles = repo.find_by_teams(&teams()).await.unwrap();
        assert_eq!(articles[0].summary, "NAVI: NAVI story one");
        assert!(!cache.has("FaZe", "FaZe story one").await);
    }

    #[tokio::test]
    async fn test_bulk_cache_mode_never_navigates() {
        let browser = FakeBrowser::new();
        let visits = browser.visit_log();
        let (mut repo, dir) = repo(browser, FakeSummarizer::new(), options(true, false));

        let cache = ArticleCache::new(dir.path());
        for (team, title) in [("NAVI", "Old NAVI news"), ("FaZe", "Old FaZe news"), ("Vitality", "Other")] {
            let record = CacheRecord::from_article(&Article::new(title, format!("{title} summary"), team));
            cache.write(team, title, &record).await.unwrap();
        }

        let articles = repo.find_by_teams(&teams()).await.unwrap();
        assert_eq!(titles(&articles), vec!["Old NAVI news", "Old FaZe news"]);
        assert_eq!(articles[1].summary, "Old FaZe news summary");
        assert!(visits.borrow().is_empty());

        let report = repo.last_report().unwrap();
        assert_eq!(report.resolution, Resolution::BulkCache);
        assert_eq!(report.loaded_from_cache, 2);
    }

    #[tokio::test]
    async fn test_bulk_cache_mode_ignores_broken_records_of_other_teams() {
        let (mut repo, dir) = repo(FakeBrowser::new(), FakeSummarizer::new(), options(true, false));

        let cache = ArticleCache::new(dir.path());
        let record = CacheRecord::from_article(&Article::new("Old NAVI news", "kept", "NAVI"));
        cache.write("NAVI", "Old NAVI news", &record).await.unwrap();
        std::fs::write(cache.path_for("Vitality", "broken"), "{ not json").unwrap();

        let articles = repo.find_by_teams(&teams()).await.unwrap();
        assert_eq!(titles(&articles), vec!["Old NAVI news"]);
        assert_eq!(repo.last_report().unwrap().loaded_from_cache, 1);
    }

    #[tokio::test]
    async fn test_unknown_team_fails_the_call() {
        let browser = browser(&[]).page(&search_url("Nobody"), &search_page(&[("Nobody Else", "/team/1/else")]));
        let (mut repo, _dir) = repo(browser, FakeSummarizer::new(), options(false, true));
        let pair = ["NAVI".to_string(), "Nobody".to_string()];

        let err = repo.find_by_teams(&pair).await.unwrap_err();
        assert!(matches!(err, Error::TeamNotFound { .. }));
        // the first team was finished before the second was looked up
        assert_eq!(repo.store().all().len(), 3);
        assert_eq!(repo.last_report().unwrap().fetched(), 3);
    }

    #[tokio::test]
    async fn test_corrupt_cache_record_fails_the_call() {
        let (mut repo, dir) = repo(browser(&[]), FakeSummarizer::new(), options(true, true));
        let cache = ArticleCache::new(dir.path());
        std::fs::write(cache.path_for("NAVI", "s1mple story two"), "not json").unwrap();

        let err = repo.find_by_teams(&teams()).await.unwrap_err();
        assert!(matches!(err, Error::CacheCorrupt { .. }));
        assert_eq!(titles(repo.store().all()), vec!["NAVI story one"]);
    }

    #[tokio::test]
    async fn test_untitled_candidate_is_skipped() {
        let (repo, _dir) = repo(FakeBrowser::new(), FakeSummarizer::new(), options(true, true));
        let candidate = CandidateHeadline {
            url: Url::parse(&article_url(7)).unwrap(),
            title: None,
        };
        let outcome = repo.fetch_one(&candidate, "NAVI").await.unwrap();
        assert_eq!(outcome, CandidateOutcome::Skipped(SkipReason::MissingTitle));
    }
}
