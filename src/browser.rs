//! Browser session abstraction used for every page load.
//!
//! Pages are loaded through a [`BrowserSession`] and come back as a
//! [`Document`]: an immutable snapshot that can be queried with CSS
//! selectors any number of times without touching the network again.
//!
//! The session is a shared, stateful resource. [`SessionSlot`] owns it behind
//! a single async mutex so that at most one navigation is in flight at a time,
//! no matter how many components hold a reference to the slot.

use crate::error::{Error, Result};
use scraper::{ElementRef, Html, Selector};
use serde_json::json;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

/// Loads a page and hands back its rendered HTML as a [`Document`].
pub trait BrowserSession {
    async fn navigate(&self, url: &str) -> Result<Document>;
}

/// Parsed snapshot of a loaded page.
pub struct Document {
    url: String,
    html: Html,
}

impl Document {
    pub fn parse(url: impl Into<String>, body: &str) -> Self {
        Self {
            url: url.into(),
            html: Html::parse_document(body),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// All elements matching `selector`, in document order.
    pub fn query(&self, selector: &str) -> Result<Vec<ElementHandle<'_>>> {
        let selector = parse_selector(selector)?;
        Ok(self.html.select(&selector).map(ElementHandle).collect())
    }

    /// First element matching `selector`, if any.
    pub fn query_one(&self, selector: &str) -> Result<Option<ElementHandle<'_>>> {
        let selector = parse_selector(selector)?;
        Ok(self.html.select(&selector).next().map(ElementHandle))
    }

    pub fn matches(&self, selector: &str) -> Result<bool> {
        Ok(self.query_one(selector)?.is_some())
    }
}

/// A single element inside a [`Document`].
#[derive(Clone, Copy)]
pub struct ElementHandle<'a>(ElementRef<'a>);

impl<'a> ElementHandle<'a> {
    /// Concatenated text content of the element and its descendants.
    pub fn text(&self) -> String {
        self.0.text().collect::<String>()
    }

    /// Text content split the way a browser renders it: block elements and
    /// `<br>` start a new line, inline markup stays on the current one.
    /// Lines are trimmed and blank ones dropped.
    pub fn lines(&self) -> Vec<String> {
        let mut rendered = String::new();
        render_text(self.0, &mut rendered);
        rendered
            .lines()
            .map(|l| l.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|l| !l.is_empty())
            .collect()
    }

    pub fn attribute(&self, name: &str) -> Option<&'a str> {
        self.0.value().attr(name)
    }
}

const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hr", "li", "main", "nav", "ol", "p", "pre", "section", "table", "tr", "ul",
];

fn render_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            // source newlines inside a text node are plain whitespace
            out.push_str(&text.replace('\n', " "));
        } else if let Some(child) = ElementRef::wrap(child) {
            let block = BLOCK_ELEMENTS.contains(&child.value().name());
            if block {
                out.push('\n');
            }
            render_text(child, out);
            if block {
                out.push('\n');
            }
        }
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| Error::Selector(format!("{selector}: {e}")))
}

/// Single-slot token around a [`BrowserSession`].
///
/// Every navigation acquires the slot; the ready selector is checked before
/// the document is handed back.
pub struct SessionSlot<B> {
    session: Mutex<B>,
}

impl<B: BrowserSession> SessionSlot<B> {
    pub fn new(session: B) -> Self {
        Self {
            session: Mutex::new(session),
        }
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn navigate(&self, url: &str, ready_selector: &str) -> Result<Document> {
        let session = self.session.lock().await;
        let document = session.navigate(url).await?;
        drop(session);

        if !document.matches(ready_selector)? {
            return Err(Error::NotReady {
                url: url.to_string(),
                selector: ready_selector.to_string(),
            });
        }
        debug!(%url, "Page ready");
        Ok(document)
    }

    pub fn into_inner(self) -> B {
        self.session.into_inner()
    }
}

/// Plain HTTP session, optionally rendering through a Browserless
/// `/content` endpoint.
#[derive(Debug)]
pub struct HttpBrowser {
    client: reqwest::Client,
    browserless_url: Option<String>,
}

impl HttpBrowser {
    pub fn new(browserless_url: Option<&str>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("match_news/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            browserless_url: browserless_url.map(|u| u.trim_end_matches('/').to_string()),
        })
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        let request = match &self.browserless_url {
            Some(endpoint) => self
                .client
                .post(format!("{endpoint}/content"))
                .json(&json!({ "url": url })),
            None => self.client.get(url),
        };

        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Navigation {
                url: url.to_string(),
                message: format!("status {}", status.as_u16()),
            });
        }
        Ok(resp.text().await?)
    }
}

impl BrowserSession for HttpBrowser {
    #[instrument(level = "info", skip(self))]
    async fn navigate(&self, url: &str) -> Result<Document> {
        let body = self.fetch(url).await?;
        info!(bytes = body.len(), "Fetched page");
        Ok(Document::parse(url, &body))
    }
}
