//! A [`PageHandle`] over server-rendered HTML.
//!
//! Fetches markup with `reqwest` and answers locator queries with the
//! `scraper` crate. No JavaScript runs, so this only works for storefronts
//! that render the price server-side (many VTEX stores do). Markup never
//! changes after load: a locator with no visible match fails immediately
//! instead of waiting out its timeout.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use pricewatch_core::Locator;
use scraper::{ElementRef, Html, Node, Selector};

use crate::error::PageError;
use crate::page::{BrowserSession, PageHandle};

/// Elements whose content is never rendered as text.
const NON_RENDERED_TAGS: &[&str] = &["script", "style", "template", "noscript", "head"];

/// Hands out [`StaticPage`]s that share one HTTP client.
pub struct StaticSession {
    client: reqwest::Client,
}

impl StaticSession {
    /// # Errors
    ///
    /// Returns [`PageError::Session`] if the HTTP client cannot be built.
    pub fn new(user_agent: &str) -> Result<Self, PageError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .connect_timeout(Duration::from_secs(10))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| PageError::Session(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl BrowserSession for StaticSession {
    type Page = StaticPage;

    async fn new_page(&self) -> Result<StaticPage, PageError> {
        Ok(StaticPage {
            client: Some(self.client.clone()),
            url: None,
            html: None,
        })
    }

    async fn close_page(&self, page: StaticPage) -> Result<(), PageError> {
        tracing::debug!(url = ?page.url, "closing static page");
        Ok(())
    }
}

pub struct StaticPage {
    client: Option<reqwest::Client>,
    url: Option<String>,
    html: Option<String>,
}

impl StaticPage {
    /// A page preloaded with `html`, with no HTTP client. `goto` on it fails.
    #[must_use]
    pub fn from_html(url: &str, html: &str) -> Self {
        Self {
            client: None,
            url: Some(url.to_owned()),
            html: Some(html.to_owned()),
        }
    }

    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    fn html(&self) -> Result<&str, PageError> {
        self.html.as_deref().ok_or(PageError::NoPage)
    }
}

#[async_trait]
impl PageHandle for StaticPage {
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<(), PageError> {
        let client = self.client.as_ref().ok_or_else(|| PageError::Navigation {
            url: url.to_owned(),
            reason: "page has no HTTP client".to_owned(),
        })?;

        let classify = |e: reqwest::Error| {
            if e.is_timeout() {
                PageError::Timeout(timeout)
            } else {
                PageError::Navigation {
                    url: url.to_owned(),
                    reason: e.to_string(),
                }
            }
        };

        let response = client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(PageError::Navigation {
                url: url.to_owned(),
                reason: format!("HTTP {}", status.as_u16()),
            });
        }

        let body = response.text().await.map_err(classify)?;
        tracing::debug!(url, bytes = body.len(), "static page loaded");
        self.url = Some(url.to_owned());
        self.html = Some(body);
        Ok(())
    }

    async fn wait_for_visible(
        &mut self,
        locator: &Locator,
        _timeout: Duration,
    ) -> Result<(), PageError> {
        first_visible_text(self.html()?, locator).map(|_| ())
    }

    async fn read_visible_text(&mut self, locator: &Locator) -> Result<String, PageError> {
        first_visible_text(self.html()?, locator)
    }

    async fn capture_diagnostic(&mut self, path: &Path) -> Result<(), PageError> {
        let html = self.html()?;
        tokio::fs::write(path, html)
            .await
            .map_err(|e| PageError::Capture {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
    }

    fn diagnostic_extension(&self) -> &'static str {
        "html"
    }
}

/// Visible text of the first visible element in document order matching
/// `locator`.
///
/// A CSS match is returned even when its text is empty; the caller decides
/// what an empty price means. A has-text match must contain its text.
fn first_visible_text(html: &str, locator: &Locator) -> Result<String, PageError> {
    let document = Html::parse_document(html);
    let (css, needle) = match locator {
        Locator::Css(css) => (css.as_str(), None),
        Locator::HasText { scope, text } => (scope.as_str(), Some(text.as_str())),
    };
    let selector = Selector::parse(css).map_err(|e| PageError::InvalidLocator {
        locator: locator.to_string(),
        reason: e.to_string(),
    })?;

    let mut texts = document
        .select(&selector)
        .filter(|el| is_visible(*el))
        .map(visible_text);
    let found = match needle {
        None => texts.next(),
        Some(needle) => texts.find(|text| !text.is_empty() && text.contains(needle)),
    };
    found.ok_or_else(|| PageError::NotFound {
        locator: locator.to_string(),
    })
}

/// Concatenates the element's rendered text nodes in document order,
/// skipping hidden and non-rendered subtrees, and collapses whitespace.
fn visible_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(element, &mut raw);
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    if !is_hidden(child_el) {
                        collect_text(child_el, out);
                    }
                }
            }
            _ => {}
        }
    }
}

fn is_visible(element: ElementRef<'_>) -> bool {
    !is_hidden(element)
        && element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .all(|ancestor| !is_hidden(ancestor))
}

fn is_hidden(element: ElementRef<'_>) -> bool {
    let el = element.value();
    if NON_RENDERED_TAGS.contains(&el.name()) || el.attr("hidden").is_some() {
        return true;
    }
    el.attr("style").is_some_and(|style| {
        let style = style
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        style.contains("display:none") || style.contains("visibility:hidden")
    })
}

#[cfg(test)]
#[path = "static_page_test.rs"]
mod tests;
