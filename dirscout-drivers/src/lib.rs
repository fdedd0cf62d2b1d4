//! Driver layer for browser automation.
//!
//! This crate exposes the browser driver and page/element helpers the
//! scraper uses to load result pages in a real Chrome session without
//! looking like automation.
//!
//! - [`scout_browser::driver::ScoutDriver`]: WebDriver client wrapper
//! - [`scout_browser::page::ScoutPage`]: navigation and DOM queries
//! - [`scout_browser::behavioral::BehavioralEngine`]: human-like timings
//! - [`scout_browser::stealth`]: stealth profiles and JS evasions
pub mod scout_browser;
