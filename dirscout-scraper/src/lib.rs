//! Business-directory scraping core.
//!
//! A run walks the result pages of one search, turns every business card
//! into a [`ListingRecord`], and appends each page's batch to a CSV file
//! before moving on. Shells drive runs through [`ScrapeController`] and
//! listen to [`RunEvent`]s.
//!
//! - [`query`]: search term/location and page URLs
//! - [`fetch`]: page acquisition traits and the WebDriver-backed fetcher
//! - [`snapshot`]: locally parsed page source
//! - [`extract`]: card to record
//! - [`sink`]: CSV output
//! - [`run`]: the pagination loop
//! - [`controller`]: one background run at a time

pub mod controller;
pub mod extract;
pub mod fetch;
pub mod query;
pub mod record;
pub mod run;
pub mod sink;
pub mod snapshot;

pub use controller::ScrapeController;
pub use fetch::{CardHandle, FetcherFactory, LiveFetcherFactory, PageFetcher, RenderedPage};
pub use query::SearchQuery;
pub use record::ListingRecord;
pub use run::{run_scrape, RunEvent, RunOutcome, RunReport, RunSettings, FINISHED_STATUS};
pub use sink::{read_listings, ListingSink, SinkError};
