use anyhow::{anyhow, Result};
use dirscout_scraper::{RunEvent, RunOutcome, ScrapeController};
use std::process::ExitCode;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Run one search to completion, echoing status lines to stdout. Ctrl-C
/// stops the run after its current page.
pub(crate) async fn run_batch(
    mut controller: ScrapeController,
    term: &str,
    location: &str,
) -> Result<ExitCode> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    controller.start(term, location, tx)?;

    let mut interrupted = false;
    let report = loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(RunEvent::Status(line)) => println!("{line}"),
                Some(RunEvent::BatchSaved { .. }) => {}
                Some(RunEvent::Finished(report)) => break Some(report),
                None => break None,
            },
            signal = tokio::signal::ctrl_c(), if !interrupted => {
                interrupted = true;
                match signal {
                    Ok(()) => {
                        info!("interrupt received; cancelling run");
                        println!("Stopping after the current page...");
                        controller.cancel();
                    }
                    Err(e) => warn!(error = %e, "cannot listen for Ctrl-C"),
                }
            }
        }
    };
    controller.wait().await;

    let report = report.ok_or_else(|| anyhow!("run ended without a report"))?;
    match &report.output_path {
        Some(path) => println!(
            "{} records from {} pages saved to {}",
            report.records_written,
            report.pages_fetched,
            path.display()
        ),
        None => println!("No records were saved."),
    }

    Ok(match report.outcome {
        RunOutcome::Failed => ExitCode::FAILURE,
        RunOutcome::Exhausted | RunOutcome::Cancelled => ExitCode::SUCCESS,
    })
}
