//! Rendered-page snapshots queried locally with `scraper`.
//!
//! `scraper::Html` is not `Send`, so pages keep their markup as a string and
//! parse it inside each synchronous query.
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::fetch::{CardHandle, RenderedPage};

/// Full page source captured after navigation.
#[derive(Debug, Clone)]
pub struct HtmlPage {
    html: String,
    base: Option<Url>,
}

impl HtmlPage {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            base: None,
        }
    }

    /// Resolve relative `href`/`src` values against `base`, the way the
    /// browser's DOM properties do.
    pub fn with_base(mut self, base: Url) -> Self {
        self.base = Some(base);
        self
    }

    /// Outer HTML of every element matching `selector`.
    pub fn card_fragments(&self, selector: &str) -> Result<Vec<String>> {
        let selector = parse_selector(selector)?;
        let document = Html::parse_document(&self.html);
        Ok(document.select(&selector).map(|el| el.html()).collect())
    }
}

#[async_trait]
impl RenderedPage for HtmlPage {
    async fn cards(&self, selector: &str) -> Result<Vec<Box<dyn CardHandle>>> {
        Ok(self
            .card_fragments(selector)?
            .into_iter()
            .map(|html| {
                Box::new(HtmlCard {
                    html,
                    base: self.base.clone(),
                }) as Box<dyn CardHandle>
            })
            .collect())
    }
}

/// One card's markup.
#[derive(Debug, Clone)]
pub struct HtmlCard {
    html: String,
    base: Option<Url>,
}

impl HtmlCard {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            base: None,
        }
    }

    fn with_first<T>(
        &self,
        selector: &str,
        f: impl FnOnce(ElementRef<'_>) -> T,
    ) -> Result<Option<T>> {
        let selector = parse_selector(selector)?;
        let fragment = Html::parse_fragment(&self.html);
        Ok(fragment.select(&selector).next().map(f))
    }

    /// Text content of the first match with whitespace runs collapsed.
    pub fn text(&self, selector: &str) -> Result<Option<String>> {
        self.with_first(selector, |el| {
            el.text()
                .flat_map(str::split_whitespace)
                .collect::<Vec<_>>()
                .join(" ")
        })
    }

    pub fn attr(&self, selector: &str, attribute: &str) -> Result<Option<String>> {
        let value = self
            .with_first(selector, |el| el.value().attr(attribute).map(str::to_string))?
            .flatten();
        Ok(value.map(|raw| self.resolve(attribute, raw)))
    }

    fn resolve(&self, attribute: &str, raw: String) -> String {
        match &self.base {
            Some(base) if matches!(attribute, "href" | "src") => {
                base.join(&raw).map(String::from).unwrap_or(raw)
            }
            _ => raw,
        }
    }
}

#[async_trait]
impl CardHandle for HtmlCard {
    async fn text_of(&self, selector: &str) -> Result<Option<String>> {
        self.text(selector)
    }

    async fn attr_of(&self, selector: &str, attribute: &str) -> Result<Option<String>> {
        self.attr(selector, attribute)
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| anyhow!("invalid CSS selector {selector:?}: {e}"))
}
