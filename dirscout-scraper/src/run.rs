//! The pagination loop: fetch, pace, extract, persist, repeat.
use anyhow::{Context, Result};
use chrono::Local;
use dirscout_config::{PacingConfig, ScoutConfig, SelectorConfig};
use dirscout_drivers::scout_browser::behavioral::BehavioralEngine;
use std::path::PathBuf;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::extract::extract_page;
use crate::fetch::PageFetcher;
use crate::query::SearchQuery;
use crate::record::ListingRecord;
use crate::sink::ListingSink;

pub const FINISHED_STATUS: &str = "Scraping finished.";

/// Everything a run needs besides the query and the browser.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub search_url: String,
    pub selectors: SelectorConfig,
    pub pacing: PacingConfig,
    pub output_dir: PathBuf,
    pub file_prefix: String,
}

impl From<&ScoutConfig> for RunSettings {
    fn from(config: &ScoutConfig) -> Self {
        Self {
            search_url: config.site.search_url.clone(),
            selectors: config.site.selectors.clone(),
            pacing: config.pacing,
            output_dir: config.output.directory.clone(),
            file_prefix: config.output.file_prefix.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// A page came back with no business cards.
    Exhausted,
    Cancelled,
    Failed,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    /// Output file, if the run wrote at least one row.
    pub output_path: Option<PathBuf>,
    pub pages_fetched: u32,
    pub records_written: usize,
    pub records: Vec<ListingRecord>,
    pub outcome: RunOutcome,
    /// What stopped a failed run.
    pub error: Option<String>,
}

impl RunReport {
    /// Report for a run that failed before its first page.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            output_path: None,
            pages_fetched: 0,
            records_written: 0,
            records: Vec::new(),
            outcome: RunOutcome::Failed,
            error: Some(error.into()),
        }
    }
}

/// What the loop tells the shell.
#[derive(Debug, Clone)]
pub enum RunEvent {
    Status(String),
    BatchSaved {
        page: u32,
        records: Vec<ListingRecord>,
        path: PathBuf,
    },
    Finished(RunReport),
}

enum PageStep {
    Saved,
    Exhausted,
}

struct RunState<'a> {
    query: SearchQuery,
    current_page: u32,
    pages_fetched: u32,
    records: Vec<ListingRecord>,
    sink: ListingSink,
    settings: &'a RunSettings,
    events: &'a UnboundedSender<RunEvent>,
    pacing: BehavioralEngine,
}

/// Scrape result pages until they run out, the token is cancelled, or a page
/// cannot be acquired. Always closes `fetcher` and always ends with
/// [`RunEvent::Finished`].
pub async fn run_scrape(
    query: SearchQuery,
    fetcher: Box<dyn PageFetcher>,
    settings: RunSettings,
    events: UnboundedSender<RunEvent>,
    cancel: CancellationToken,
) -> RunReport {
    let run_id = Uuid::new_v4();
    let span = info_span!(
        target: "scraper.run",
        "scrape_run",
        %run_id,
        term = %query.term(),
        location = %query.location()
    );
    drive(query, fetcher, &settings, &events, cancel)
        .instrument(span)
        .await
}

async fn drive(
    query: SearchQuery,
    mut fetcher: Box<dyn PageFetcher>,
    settings: &RunSettings,
    events: &UnboundedSender<RunEvent>,
    cancel: CancellationToken,
) -> RunReport {
    emit_status(
        events,
        format!(
            "Searching for '{}' in '{}'...",
            query.term(),
            query.location()
        ),
    );

    let sink = match ListingSink::reserve(
        &settings.output_dir,
        &settings.file_prefix,
        Local::now().naive_local(),
    ) {
        Ok(sink) => sink,
        Err(e) => {
            let message = format!("{:#}", anyhow::Error::from(e));
            error!(target: "scraper.run", error = %message, "cannot reserve output file");
            emit_status(events, format!("Scraping error: {message}"));
            close_fetcher(fetcher.as_mut()).await;
            return finish(events, RunReport::failed(message));
        }
    };
    info!(target: "scraper.run", path = %sink.path().display(), "run started");

    let mut state = RunState {
        query,
        current_page: 1,
        pages_fetched: 0,
        records: Vec::new(),
        sink,
        settings,
        events,
        pacing: BehavioralEngine::new(),
    };

    let mut failure = None;
    let outcome = loop {
        if cancel.is_cancelled() {
            info!(target: "scraper.run", page = state.current_page, "cancellation observed");
            emit_status(events, "Scraping cancelled.");
            break RunOutcome::Cancelled;
        }
        match state.scrape_page(fetcher.as_mut()).await {
            Ok(PageStep::Saved) => state.current_page += 1,
            Ok(PageStep::Exhausted) => break RunOutcome::Exhausted,
            Err(e) => {
                let message = format!("{e:#}");
                error!(target: "scraper.run", page = state.current_page, error = %message, "run aborted");
                emit_status(events, format!("Scraping error: {message}"));
                failure = Some(message);
                break RunOutcome::Failed;
            }
        }
    };

    close_fetcher(fetcher.as_mut()).await;

    let output_path = match state.sink.discard_if_empty() {
        Ok(true) => None,
        Ok(false) if state.sink.written() == 0 => None,
        Ok(false) => Some(state.sink.path().to_path_buf()),
        Err(e) => {
            warn!(target: "scraper.sink", error = %e, "could not remove empty output file");
            None
        }
    };

    info!(
        target: "scraper.run",
        outcome = ?outcome,
        pages = state.pages_fetched,
        records = state.sink.written(),
        "run finished"
    );

    let report = RunReport {
        output_path,
        pages_fetched: state.pages_fetched,
        records_written: state.sink.written(),
        records: state.records,
        outcome,
        error: failure,
    };
    finish(events, report)
}

impl RunState<'_> {
    async fn scrape_page(&mut self, fetcher: &mut dyn PageFetcher) -> Result<PageStep> {
        let page = self.current_page;
        let url = self.query.page_url(&self.settings.search_url, page)?;

        emit_status(self.events, format!("Loading page {page}..."));
        let rendered = fetcher
            .fetch(&url)
            .await
            .with_context(|| format!("failed to load page {page}"))?;
        self.pages_fetched += 1;

        let pacing = self.settings.pacing;
        let waited = self
            .pacing
            .random_delay(pacing.min_delay_ms, pacing.max_delay_ms)
            .await;
        debug!(target: "scraper.run", page, waited_ms = waited.as_millis() as u64, "paced after load");

        let cards = rendered
            .cards(&self.settings.selectors.card)
            .await
            .with_context(|| format!("failed to locate business cards on page {page}"))?;
        if cards.is_empty() {
            info!(target: "scraper.run", page, "no business cards; results exhausted");
            emit_status(self.events, format!("No more results on page {page}."));
            return Ok(PageStep::Exhausted);
        }

        let extraction = extract_page(&cards, &self.settings.selectors).await;
        for skipped in &extraction.skipped {
            emit_status(
                self.events,
                format!("Skipped a business on page {page}: {skipped}"),
            );
        }

        if !extraction.records.is_empty() {
            self.sink
                .append(&extraction.records)
                .context("failed to save results")?;
            let path = self.sink.path().to_path_buf();
            emit_status(
                self.events,
                format!(
                    "Saved {} records from page {page} to {}",
                    extraction.records.len(),
                    path.display()
                ),
            );
            let _ = self.events.send(RunEvent::BatchSaved {
                page,
                records: extraction.records.clone(),
                path,
            });
            self.records.extend(extraction.records);
        }
        Ok(PageStep::Saved)
    }
}

async fn close_fetcher(fetcher: &mut dyn PageFetcher) {
    if let Err(e) = fetcher.close().await {
        warn!(target: "browser.driver", error = %e, "failed to close browser session");
    }
}

pub(crate) fn emit_status(events: &UnboundedSender<RunEvent>, message: impl Into<String>) {
    let _ = events.send(RunEvent::Status(message.into()));
}

pub(crate) fn finish(events: &UnboundedSender<RunEvent>, report: RunReport) -> RunReport {
    emit_status(events, FINISHED_STATUS);
    let _ = events.send(RunEvent::Finished(report.clone()));
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_follow_config() {
        let mut config = ScoutConfig::default();
        config.output.file_prefix = "austin".into();
        config.pacing.min_delay_ms = 10;
        let settings = RunSettings::from(&config);
        assert_eq!(settings.file_prefix, "austin");
        assert_eq!(settings.pacing.min_delay_ms, 10);
        assert_eq!(settings.selectors.card, ".result");
    }

    #[test]
    fn failed_report_has_no_output() {
        let report = RunReport::failed("no browser");
        assert_eq!(report.outcome, RunOutcome::Failed);
        assert!(report.output_path.is_none());
        assert_eq!(report.error.as_deref(), Some("no browser"));
    }
}
