use anyhow::Result;
use clap::Parser;
use dirscout_common::observability::{init_logging, LogConfig};
use dirscout_config::{ScoutConfig, ScoutConfigLoader};
use dirscout_runtime::ScoutRuntime;
use dirscout_scraper::{LiveFetcherFactory, RunSettings, ScrapeController};
use dirscout_tui::run_tui;
use std::{process::ExitCode, sync::Arc, time::Duration};
use tracing::info;

mod batch;
mod cli;

use cli::Cli;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

fn load_config(cli: &Cli) -> Result<ScoutConfig> {
    let mut loader = ScoutConfigLoader::new().with_default_locations();
    if let Some(path) = &cli.config {
        loader = loader.with_file(path);
    }
    let mut config = loader.load()?;
    if cli.headless {
        config.browser.headless = true;
    }
    Ok(config)
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    if cli.print_config {
        print!("{}", config.to_yaml()?);
        return Ok(ExitCode::SUCCESS);
    }

    let batch = cli.batch_query()?;
    let log_path = init_logging(LogConfig {
        log_dir: config.logging.directory.clone(),
        emit_stderr: batch.is_some(),
        format: config.logging.format,
        default_filter: config.logging.filter.clone(),
        ..LogConfig::default()
    })?;
    info!(log = %log_path.display(), "dirscout starting");

    let runtime = ScoutRuntime::build("dirscout-worker", None)?;
    let handle = runtime.handle();
    let controller = ScrapeController::new(
        handle.clone(),
        Arc::new(LiveFetcherFactory::new(&config.browser)),
        RunSettings::from(&config),
    );

    let result = match batch {
        Some((term, location)) => runtime.block_on(batch::run_batch(controller, &term, &location)),
        None => runtime
            .block_on(run_tui(controller, handle.cancellation()))
            .map(|()| ExitCode::SUCCESS),
    };

    info!("dirscout shutting down");
    runtime.shutdown(SHUTDOWN_GRACE);
    result
}
