//! On-disk cache of article summaries, one JSON file per `(team, title)`.
//!
//! # Layout
//!
//! ```text
//! articles-cached/
//! ├── NAVI-s1mple opens up about future.json
//! └── FaZe-ropz on the Major%2FCologne double.json
//! ```
//!
//! The file stem is `<team>-<title>`. In both parts `%`, `/` and `\` are
//! percent-encoded so every key maps to exactly one flat file and decodes
//! back to itself.

use crate::error::{Error, Result};
use crate::models::CacheRecord;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument, warn};

pub const DEFAULT_CACHE_DIR: &str = "articles-cached";
const EXTENSION: &str = "json";

/// A cache file found by [`ArticleCache::list_all`]. The record itself is
/// not read until asked for.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// File name without extension, still encoded.
    pub stem: String,
    pub path: PathBuf,
}

impl CacheEntry {
    /// Title of this entry when read as belonging to `team`.
    ///
    /// Team names may themselves contain `-`, so the split point depends on
    /// which team is asking.
    ///
    /// # Returns
    ///
    /// The decoded title, or `None` when the file is not prefixed by
    /// `<team>-`.
    pub fn title_for(&self, team: &str) -> Option<String> {
        self.stem
            .strip_prefix(encode_key(team).as_str())
            .and_then(|rest| rest.strip_prefix('-'))
            .map(decode_key)
    }
}

#[derive(Debug, Clone)]
pub struct ArticleCache {
    dir: PathBuf,
}

impl ArticleCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File that holds the record for `(team, title)`.
    ///
    /// # Arguments
    ///
    /// * `team` - The team the article was fetched for
    /// * `title` - The headline as seen in the team's news listing
    pub fn path_for(&self, team: &str, title: &str) -> PathBuf {
        self.dir.join(format!(
            "{}-{}.{EXTENSION}",
            encode_key(team),
            encode_key(title)
        ))
    }

    /// Whether a record exists for `(team, title)`. Unreadable directories
    /// count as a miss.
    pub async fn has(&self, team: &str, title: &str) -> bool {
        fs::try_exists(self.path_for(team, title))
            .await
            .unwrap_or(false)
    }

    /// # Errors
    ///
    /// [`Error::CacheCorrupt`] when the file is not a valid record.
    #[instrument(level = "debug", skip(self))]
    pub async fn read(&self, team: &str, title: &str) -> Result<CacheRecord> {
        let path = self.path_for(team, title);
        read_record(&path).await
    }

    /// Store `record` under `(team, title)`, replacing any earlier one. The
    /// cache directory is created on first write.
    ///
    /// # Errors
    ///
    /// I/O and serialization failures are returned as-is.
    #[instrument(level = "debug", skip(self, record))]
    pub async fn write(&self, team: &str, title: &str, record: &CacheRecord) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(team, title);
        let json = serde_json::to_string_pretty(record)?;
        fs::write(&path, json).await?;
        debug!(path = %path.display(), "Cached article summary");
        Ok(())
    }

    /// Every cache file in the directory, sorted by stem. A missing
    /// directory is an empty cache; files with other extensions are ignored.
    /// No record is parsed here.
    #[instrument(level = "debug", skip(self), fields(dir = %self.dir.display()))]
    pub async fn list_all(&self) -> Result<Vec<CacheEntry>> {
        let mut dir = match fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Cache directory does not exist");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        while let Some(item) = dir.next_entry().await? {
            let path = item.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };
            if !stem.contains('-') {
                warn!(path = %path.display(), "Skipping cache file without team prefix");
                continue;
            }
            entries.push(CacheEntry { stem, path });
        }

        entries.sort_by(|a, b| a.stem.cmp(&b.stem));
        Ok(entries)
    }

    /// All cached `(title, record)` pairs for `team`, in file name order.
    /// Only files prefixed by `<team>-` are parsed, so a broken record of
    /// another team does not get in the way.
    ///
    /// # Errors
    ///
    /// [`Error::CacheCorrupt`] when one of this team's files is not a valid
    /// record.
    #[instrument(level = "info", skip(self))]
    pub async fn list_for(&self, team: &str) -> Result<Vec<(String, CacheRecord)>> {
        let mut found = Vec::new();
        for entry in self.list_all().await? {
            if let Some(title) = entry.title_for(team) {
                found.push((title, read_record(&entry.path).await?));
            }
        }
        info!(count = found.len(), "Listed cached articles");
        Ok(found)
    }
}

async fn read_record(path: &Path) -> Result<CacheRecord> {
    let raw = fs::read_to_string(path).await?;
    serde_json::from_str(&raw).map_err(|source| Error::CacheCorrupt {
        path: path.to_path_buf(),
        source,
    })
}

fn encode_key(key: &str) -> String {
    key.replace('%', "%25")
        .replace('/', "%2F")
        .replace('\\', "%5C")
}

fn decode_key(encoded: &str) -> String {
    encoded
        .replace("%2F", "/")
        .replace("%5C", "\\")
        .replace("%25", "%")
}
