use dirscout_common::{Result, ScoutError};
use dirscout_runtime::ScoutHandle;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::fetch::FetcherFactory;
use crate::query::SearchQuery;
use crate::run::{emit_status, finish, run_scrape, RunEvent, RunReport, RunSettings};

struct ActiveRun {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Starts and cancels background runs on behalf of a shell. At most one run
/// is active at a time.
pub struct ScrapeController {
    handle: ScoutHandle,
    factory: Arc<dyn FetcherFactory>,
    settings: RunSettings,
    active: Option<ActiveRun>,
}

impl ScrapeController {
    pub fn new(
        handle: ScoutHandle,
        factory: Arc<dyn FetcherFactory>,
        settings: RunSettings,
    ) -> Self {
        Self {
            handle,
            factory,
            settings,
            active: None,
        }
    }

    /// Validate the query and spawn a run that reports through `events`.
    pub fn start(
        &mut self,
        term: &str,
        location: &str,
        events: UnboundedSender<RunEvent>,
    ) -> Result<()> {
        if self.is_running() {
            return Err(ScoutError::RunInProgress);
        }
        let query = SearchQuery::new(term, location)?;

        let cancel = self.handle.child_token();
        let token = cancel.clone();
        let factory = Arc::clone(&self.factory);
        let settings = self.settings.clone();

        info!(target: "scraper.run", term = %query.term(), location = %query.location(), "starting run");
        let task = self.handle.spawn(async move {
            emit_status(&events, "Opening browser session...");
            let fetcher = match factory.open().await {
                Ok(fetcher) => fetcher,
                Err(e) => {
                    let message = ScoutError::Driver(e).to_string();
                    error!(target: "browser.driver", error = %message, "could not open browser session");
                    emit_status(&events, format!("Scraping error: {message}"));
                    finish(&events, RunReport::failed(message));
                    return;
                }
            };
            run_scrape(query, fetcher, settings, events, token).await;
        });

        self.active = Some(ActiveRun { cancel, task });
        Ok(())
    }

    /// Ask the active run to stop after its current page. Returns whether a
    /// run was active.
    pub fn cancel(&self) -> bool {
        match &self.active {
            Some(run) if !run.task.is_finished() => {
                info!(target: "scraper.run", "cancellation requested");
                run.cancel.cancel();
                true
            }
            _ => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|run| !run.task.is_finished())
    }

    /// Wait for the active run, if any, to finish.
    pub async fn wait(&mut self) {
        if let Some(run) = self.active.take() {
            if let Err(e) = run.task.await {
                error!(target: "scraper.run", error = %e, "run task ended abnormally");
            }
        }
    }
}
