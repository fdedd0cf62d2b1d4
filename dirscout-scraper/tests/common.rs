#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use dirscout_common::observability::{LogConfig, LogFormat};
use dirscout_config::{PacingConfig, ScoutConfig};
use dirscout_scraper::snapshot::HtmlPage;
use dirscout_scraper::{
    CardHandle, FetcherFactory, PageFetcher, RenderedPage, RunEvent, RunSettings,
};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;
use url::Url;

static INIT_PATH: OnceLock<PathBuf> = OnceLock::new();

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let config = LogConfig {
            app_name: "dirscout-tests",
            log_dir: Some(std::env::temp_dir().join("dirscout-tests")),
            emit_stderr: true,
            format: LogFormat::Text,
            default_filter: "debug".to_string(),
        };
        dirscout_common::observability::init_logging(config).unwrap_or_default()
    });
}

/// One scripted response of [`FakeFetcher`].
#[derive(Clone)]
pub enum FakePage {
    Html(String),
    FetchError,
    CardLookupError,
}

/// What a fake session saw.
#[derive(Debug, Default)]
pub struct FetchLog {
    pub urls: Vec<Url>,
    pub closed: u32,
}

/// Serves scripted pages in order; any fetch past the script is an empty
/// results page.
pub struct FakeFetcher {
    pages: Vec<FakePage>,
    served: usize,
    log: Arc<Mutex<FetchLog>>,
    on_fetch: Option<(usize, Box<dyn FnMut() + Send>)>,
}

impl FakeFetcher {
    pub fn new(pages: Vec<FakePage>) -> (Self, Arc<Mutex<FetchLog>>) {
        let log = Arc::new(Mutex::new(FetchLog::default()));
        (
            Self {
                pages,
                served: 0,
                log: Arc::clone(&log),
                on_fetch: None,
            },
            log,
        )
    }

    /// Run `hook` while serving page `page` (1-based).
    pub fn on_fetch(mut self, page: usize, hook: impl FnMut() + Send + 'static) -> Self {
        self.on_fetch = Some((page, Box::new(hook)));
        self
    }

    /// Cancel `token` while serving page `page` (1-based).
    pub fn cancel_during(self, page: usize, token: CancellationToken) -> Self {
        self.on_fetch(page, move || token.cancel())
    }
}

#[async_trait]
impl PageFetcher for FakeFetcher {
    async fn fetch(&mut self, url: &Url) -> Result<Box<dyn RenderedPage>> {
        self.log.lock().unwrap().urls.push(url.clone());
        self.served += 1;
        if let Some((page, hook)) = &mut self.on_fetch {
            if *page == self.served {
                hook();
            }
        }
        match self.pages.get(self.served - 1).cloned() {
            Some(FakePage::Html(html)) => Ok(Box::new(HtmlPage::new(html))),
            Some(FakePage::FetchError) => Err(anyhow!("net::ERR_CONNECTION_RESET")),
            Some(FakePage::CardLookupError) => Ok(Box::new(BrokenPage)),
            None => Ok(Box::new(HtmlPage::new(no_results()))),
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.log.lock().unwrap().closed += 1;
        Ok(())
    }
}

struct BrokenPage;

#[async_trait]
impl RenderedPage for BrokenPage {
    async fn cards(&self, _selector: &str) -> Result<Vec<Box<dyn CardHandle>>> {
        Err(anyhow!("no such window: target window already closed"))
    }
}

/// Hands out one prepared fetcher, or fails to connect.
pub struct FakeFactory {
    fetcher: Mutex<Option<Box<dyn PageFetcher>>>,
}

impl FakeFactory {
    pub fn with(fetcher: impl PageFetcher + 'static) -> Self {
        Self {
            fetcher: Mutex::new(Some(Box::new(fetcher))),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            fetcher: Mutex::new(None),
        }
    }
}

#[async_trait]
impl FetcherFactory for FakeFactory {
    async fn open(&self) -> Result<Box<dyn PageFetcher>> {
        self.fetcher
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| anyhow!("failed to open a WebDriver session at http://localhost:9515"))
    }
}

pub fn settings_in(dir: &std::path::Path) -> RunSettings {
    let mut settings = RunSettings::from(&ScoutConfig::default());
    settings.pacing = PacingConfig {
        min_delay_ms: 0,
        max_delay_ms: 0,
    };
    settings.output_dir = dir.to_path_buf();
    settings
}

pub fn card(
    name: Option<&str>,
    street: Option<&str>,
    locality: Option<&str>,
    phone: Option<&str>,
    website: Option<&str>,
) -> String {
    let mut html = String::from(r#"<div class="result"><div class="info">"#);
    if let Some(name) = name {
        html.push_str(&format!(
            r#"<h2 class="n"><a class="business-name" href="/biz"><span>{name}</span></a></h2>"#
        ));
    }
    if let Some(street) = street {
        html.push_str(&format!(r#"<div class="street-address">{street}</div>"#));
    }
    if let Some(locality) = locality {
        html.push_str(&format!(r#"<div class="locality">{locality}</div>"#));
    }
    if let Some(phone) = phone {
        html.push_str(&format!(r#"<div class="phones phone primary">{phone}</div>"#));
    }
    if let Some(website) = website {
        html.push_str(&format!(
            r#"<a class="track-visit-website" href="{website}">Website</a>"#
        ));
    }
    html.push_str("</div></div>");
    html
}

pub fn results_page(cards: &[String]) -> FakePage {
    FakePage::Html(format!(
        r#"<html><body><div class="search-results organic">{}</div></body></html>"#,
        cards.concat()
    ))
}

pub fn no_results() -> String {
    r#"<html><body><div class="search-results organic"></div><p>No results found</p></body></html>"#.to_string()
}

/// Drain events up to and including `Finished`.
pub async fn collect_until_finished(rx: &mut UnboundedReceiver<RunEvent>) -> Vec<RunEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        let done = matches!(event, RunEvent::Finished(_));
        events.push(event);
        if done {
            break;
        }
    }
    events
}

pub fn statuses(events: &[RunEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            RunEvent::Status(line) => Some(line.clone()),
            _ => None,
        })
        .collect()
}
