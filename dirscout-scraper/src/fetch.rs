//! Page acquisition seam between the run loop and the browser.
//!
//! The loop only sees [`PageFetcher`], [`RenderedPage`] and [`CardHandle`].
//! Production wires them to a WebDriver session ([`LiveFetcher`]); tests feed
//! canned HTML through [`crate::snapshot::HtmlPage`].
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use dirscout_config::{BrowserConfig, ElementSource};
use dirscout_drivers::scout_browser::{
    driver::{BrowserSettings, ScoutDriver},
    page::{ScoutElement, ScoutPage},
    stealth::StealthProfile,
};
use tracing::{debug, warn};
use url::Url;

use crate::snapshot::HtmlPage;

/// Loads result pages one at a time. Owned exclusively by one run.
#[async_trait]
pub trait PageFetcher: Send {
    /// Navigate to `url` and hand back the rendered page.
    async fn fetch(&mut self, url: &Url) -> Result<Box<dyn RenderedPage>>;

    /// Release the underlying session. Calling it twice is a no-op.
    async fn close(&mut self) -> Result<()>;
}

/// A fetched page that can be searched for business cards.
#[async_trait]
pub trait RenderedPage: Send + Sync {
    /// Every element matching `selector`, in document order. No match is an
    /// empty vector.
    async fn cards(&self, selector: &str) -> Result<Vec<Box<dyn CardHandle>>>;
}

/// One business card on a rendered page.
#[async_trait]
pub trait CardHandle: Send + Sync {
    /// Text of the first descendant matching `selector`, `None` when absent.
    async fn text_of(&self, selector: &str) -> Result<Option<String>>;

    /// `attribute` of the first descendant matching `selector`.
    async fn attr_of(&self, selector: &str, attribute: &str) -> Result<Option<String>>;
}

/// Opens one fetcher (browser session) per run.
#[async_trait]
pub trait FetcherFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn PageFetcher>>;
}

/// Driver settings for the configured browser.
pub fn browser_settings(config: &BrowserConfig) -> BrowserSettings {
    BrowserSettings {
        webdriver_url: config.webdriver_url.clone(),
        headless: config.headless,
        stealth: StealthProfile::from(config.stealth),
    }
}

/// Connects a fresh [`ScoutDriver`] for every run.
#[derive(Debug, Clone)]
pub struct LiveFetcherFactory {
    settings: BrowserSettings,
    source: ElementSource,
}

impl LiveFetcherFactory {
    pub fn new(config: &BrowserConfig) -> Self {
        Self {
            settings: browser_settings(config),
            source: config.element_source,
        }
    }
}

#[async_trait]
impl FetcherFactory for LiveFetcherFactory {
    async fn open(&self) -> Result<Box<dyn PageFetcher>> {
        let driver = ScoutDriver::connect(&self.settings).await?;
        Ok(Box::new(LiveFetcher::new(driver, self.source)))
    }
}

/// [`PageFetcher`] over a live browser session.
pub struct LiveFetcher {
    driver: Option<ScoutDriver>,
    source: ElementSource,
}

impl LiveFetcher {
    pub fn new(driver: ScoutDriver, source: ElementSource) -> Self {
        Self {
            driver: Some(driver),
            source,
        }
    }
}

#[async_trait]
impl PageFetcher for LiveFetcher {
    async fn fetch(&mut self, url: &Url) -> Result<Box<dyn RenderedPage>> {
        let driver = self
            .driver
            .as_mut()
            .ok_or_else(|| anyhow!("browser session already closed"))?;
        let page = driver.goto(url.as_str()).await?;
        debug!(target: "browser.driver", url = %url, "page loaded");

        match self.source {
            ElementSource::Live => Ok(Box::new(LivePage { page })),
            ElementSource::Snapshot => {
                let html = page.get_content().await?;
                let base = page.get_url().await.unwrap_or_else(|_| url.clone());
                Ok(Box::new(HtmlPage::new(html).with_base(base)))
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        match self.driver.take() {
            Some(driver) => driver.close().await,
            None => {
                warn!(target: "browser.driver", "close called on a closed session");
                Ok(())
            }
        }
    }
}

struct LivePage {
    page: ScoutPage,
}

#[async_trait]
impl RenderedPage for LivePage {
    async fn cards(&self, selector: &str) -> Result<Vec<Box<dyn CardHandle>>> {
        let elements = self.page.find_elements(selector).await?;
        Ok(elements
            .into_iter()
            .map(|element| Box::new(LiveCard { element }) as Box<dyn CardHandle>)
            .collect())
    }
}

struct LiveCard {
    element: ScoutElement,
}

#[async_trait]
impl CardHandle for LiveCard {
    async fn text_of(&self, selector: &str) -> Result<Option<String>> {
        match self.element.first(selector).await? {
            Some(child) => Ok(Some(child.get_inner_text().await?)),
            None => Ok(None),
        }
    }

    async fn attr_of(&self, selector: &str, attribute: &str) -> Result<Option<String>> {
        match self.element.first(selector).await? {
            Some(child) => child.get_property(attribute).await,
            None => Ok(None),
        }
    }
}
