use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;

/// Scrape business listings from directory search results into CSV.
///
/// With no search arguments the interactive terminal UI starts. Passing both
/// `--term` and `--location` runs one search and exits.
#[derive(Parser, Debug)]
#[command(name = "dirscout", author, version, about, long_about = None)]
pub(crate) struct Cli {
    /// YAML config file, layered over the default locations.
    #[arg(short, long, env = "DIRSCOUT_CONFIG")]
    pub config: Option<PathBuf>,

    /// What to search for, e.g. "plumber".
    #[arg(short, long)]
    pub term: Option<String>,

    /// Where to search, e.g. "Austin, TX".
    #[arg(short, long)]
    pub location: Option<String>,

    /// Run the browser without a window.
    #[arg(long)]
    pub headless: bool,

    /// Print the effective configuration as YAML and exit.
    #[arg(long)]
    pub print_config: bool,
}

impl Cli {
    /// The batch-mode query, if one was requested.
    pub fn batch_query(&self) -> Result<Option<(String, String)>> {
        match (&self.term, &self.location) {
            (Some(term), Some(location)) => Ok(Some((term.clone(), location.clone()))),
            (None, None) => Ok(None),
            _ => bail!("--term and --location must be given together"),
        }
    }
}
