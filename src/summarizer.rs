//! Article summarization through an OpenAI-compatible LLM.
//!
//! [`Summarizer`] is the seam the repo depends on. [`LlmSummarizer`] is the
//! production implementation: it wraps `awful_aj::api::ask` with a chat
//! template that asks the model for a JSON object of the form
//! `{"summary": "..."}`.

use crate::error::{Error, Result};
use crate::utils::{looks_truncated, truncate_for_log};
use awful_aj::api::ask;
use awful_aj::{config, config::AwfulJadeConfig, config_dir, template, template::ChatTemplate};
use serde::Deserialize;
use std::time::Instant;
use tracing::{info, instrument, warn};

pub const DEFAULT_TEMPLATE: &str = "match_news";

/// Model output for one article.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Summary {
    pub summary: String,
}

/// Produces a short, team-focused summary of an article.
pub trait Summarizer {
    async fn summarize(&self, title: &str, content: &str, team: &str) -> Result<Summary>;
}

/// [`Summarizer`] backed by `awful_aj`.
pub struct LlmSummarizer {
    config: AwfulJadeConfig,
    template: ChatTemplate,
}

impl LlmSummarizer {
    /// Load the named chat template and the user's `config.yaml` from the
    /// `awful_aj` config directory.
    #[instrument(level = "info")]
    pub async fn load(template_name: &str) -> Result<Self> {
        let template = template::load_template(template_name)
            .await
            .map_err(|e| Error::Config(format!("template {template_name}: {e}")))?;
        info!(template = template_name, "Loaded template");

        let conf_file = config_dir()
            .map_err(|e| Error::Config(e.to_string()))?
            .join("config.yaml");
        let config_path = conf_file
            .to_str()
            .ok_or_else(|| Error::Config(format!("not a valid config filename: {}", conf_file.display())))?;
        let config = config::load_config(config_path)
            .map_err(|e| Error::Config(format!("{config_path}: {e}")))?;
        info!(config_path, "Loaded configuration");

        Ok(Self { config, template })
    }
}

impl Summarizer for LlmSummarizer {
    #[instrument(level = "info", skip(self, content), fields(bytes = content.len()))]
    async fn summarize(&self, title: &str, content: &str, team: &str) -> Result<Summary> {
        let t0 = Instant::now();
        let prompt = build_prompt(title, content, team);
        let reply = ask(&self.config, prompt, &self.template, None, None)
            .await
            .map_err(|e| Error::Summarize(e.to_string()))?;

        info!(elapsed_ms = t0.elapsed().as_millis(), "Summarizer replied");
        parse_reply(&reply)
    }
}

/// Lets bulk-cache runs skip loading the model configuration.
impl<S: Summarizer> Summarizer for Option<S> {
    async fn summarize(&self, title: &str, content: &str, team: &str) -> Result<Summary> {
        match self {
            Some(inner) => inner.summarize(title, content, team).await,
            None => Err(Error::Summarize("no summarizer configured".to_string())),
        }
    }
}

pub fn build_prompt(title: &str, content: &str, team: &str) -> String {
    format!("Team: {team}\nTitle: {title}\n\n{content}")
}

/// Accept a `{"summary": ..}` object, or plain prose when the model ignored
/// the format. Truncated JSON is an error.
pub fn parse_reply(reply: &str) -> Result<Summary> {
    let trimmed = reply.trim();
    match serde_json::from_str::<Summary>(trimmed) {
        Ok(summary) => Ok(summary),
        Err(e) if looks_truncated(&e) => {
            warn!(error = %e, reply = %truncate_for_log(trimmed, 300), "Summarizer reply was cut off");
            Err(Error::Summarize(format!("truncated reply: {e}")))
        }
        Err(e) if trimmed.starts_with('{') || trimmed.is_empty() => {
            warn!(error = %e, reply = %truncate_for_log(trimmed, 300), "Summarizer returned non-conforming JSON");
            Err(Error::Summarize(format!("non-conforming reply: {e}")))
        }
        Err(_) => Ok(Summary {
            summary: trimmed.to_string(),
        }),
    }
}
