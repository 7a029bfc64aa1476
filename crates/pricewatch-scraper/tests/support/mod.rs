//! A scripted in-memory [`PageHandle`] for pipeline tests.
//!
//! Navigation and locator behaviour is declared per URL up front; every call
//! the pipeline makes is recorded so tests can assert on side effects.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use pricewatch_core::{Locator, PriceQuery, SelectorStrategy};
use pricewatch_scraper::{PageError, PageHandle};
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub enum Nav {
    Ok,
    Fail,
    /// Fails this many times, then loads.
    FailTimes(u32),
    Panic,
}

#[derive(Debug, Clone)]
pub enum Element {
    /// Visible, with text split across child nodes.
    Fragments(Vec<&'static str>),
    /// Never becomes visible; reports its own timeout.
    Timeout,
    /// Ignores its timeout and never returns.
    Hang,
    /// Becomes visible after this many milliseconds, then never returns
    /// its text.
    HangOnRead(u64),
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Goto(String),
    Wait(String),
    Read(String),
    Capture(PathBuf),
}

#[derive(Default)]
pub struct ScriptedPage {
    navs: HashMap<String, Nav>,
    elements: HashMap<(String, String), Element>,
    nav_failures: HashMap<String, u32>,
    current: Option<String>,
    pub calls: Vec<Call>,
    pub fail_capture: bool,
}

impl ScriptedPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nav(mut self, url: &str, nav: Nav) -> Self {
        self.navs.insert(url.to_owned(), nav);
        self
    }

    pub fn element(mut self, url: &str, locator: &str, element: Element) -> Self {
        self.elements
            .insert((url.to_owned(), locator.to_owned()), element);
        self
    }

    pub fn captures(&self) -> Vec<&PathBuf> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Capture(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    pub fn gotos(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::Goto(_)))
            .count()
    }

    fn lookup(&self, locator: &Locator) -> Result<Element, PageError> {
        let url = self.current.clone().ok_or(PageError::NoPage)?;
        Ok(self
            .elements
            .get(&(url, locator.to_string()))
            .cloned()
            .unwrap_or(Element::Missing))
    }
}

#[async_trait]
impl PageHandle for ScriptedPage {
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<(), PageError> {
        self.calls.push(Call::Goto(url.to_owned()));
        match self.navs.get(url).cloned().unwrap_or(Nav::Ok) {
            Nav::Ok => {}
            Nav::Fail => return Err(PageError::Timeout(timeout)),
            Nav::FailTimes(n) => {
                let seen = self.nav_failures.entry(url.to_owned()).or_insert(0);
                if *seen < n {
                    *seen += 1;
                    return Err(PageError::Navigation {
                        url: url.to_owned(),
                        reason: "connection reset".to_owned(),
                    });
                }
            }
            Nav::Panic => panic!("browser crashed while loading {url}"),
        }
        self.current = Some(url.to_owned());
        Ok(())
    }

    async fn wait_for_visible(
        &mut self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<(), PageError> {
        self.calls.push(Call::Wait(locator.to_string()));
        match self.lookup(locator)? {
            Element::Fragments(_) => Ok(()),
            Element::HangOnRead(ms) => {
                tokio::time::sleep(Duration::from_millis(ms)).await;
                Ok(())
            }
            Element::Timeout => Err(PageError::Timeout(timeout)),
            Element::Hang => std::future::pending().await,
            Element::Missing => Err(PageError::NotFound {
                locator: locator.to_string(),
            }),
        }
    }

    async fn read_visible_text(&mut self, locator: &Locator) -> Result<String, PageError> {
        self.calls.push(Call::Read(locator.to_string()));
        match self.lookup(locator)? {
            Element::Fragments(parts) => Ok(parts.concat()),
            Element::HangOnRead(_) => std::future::pending().await,
            _ => Err(PageError::NotFound {
                locator: locator.to_string(),
            }),
        }
    }

    async fn capture_diagnostic(&mut self, path: &Path) -> Result<(), PageError> {
        self.calls.push(Call::Capture(path.to_owned()));
        if self.fail_capture {
            return Err(PageError::Capture {
                path: path.display().to_string(),
                reason: "disk full".to_owned(),
            });
        }
        Ok(())
    }
}

pub fn css(selector: &str, timeout_ms: u64) -> SelectorStrategy {
    SelectorStrategy::CssSelector {
        selector: selector.to_owned(),
        timeout: Duration::from_millis(timeout_ms),
    }
}

pub fn text_contains(scope: &str, text: &str, timeout_ms: u64) -> SelectorStrategy {
    SelectorStrategy::TextContainsFallback {
        scope: scope.to_owned(),
        text: text.to_owned(),
        timeout: Duration::from_millis(timeout_ms),
    }
}

pub fn query(
    site_id: &str,
    url: &str,
    strategies: Vec<SelectorStrategy>,
    divisor: &str,
) -> PriceQuery {
    PriceQuery {
        site_id: site_id.to_owned(),
        url: url.to_owned(),
        currency: "MXN".to_owned(),
        unit_label: Some("m".to_owned()),
        strategies,
        unit_divisor: divisor.parse::<Decimal>().expect("valid divisor"),
        navigation_timeout: Duration::from_millis(200),
    }
}

pub fn dec(s: &str) -> Decimal {
    s.parse().expect("valid decimal")
}
