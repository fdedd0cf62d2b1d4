//! Common types and utilities shared across dirscout crates.
//!
//! This crate defines the shared error type, the browser stealth level, and
//! the observability helpers used throughout the dirscout workspace. It is
//! intentionally lightweight so that every crate can depend on it without
//! introducing heavy transitive costs.
//!
//! # Overview
//!
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`ScoutError`] and [`Result`]: Shared error handling
//! - [`StealthLevel`]: how aggressively the browser hides automation signals
//!
//! # Examples
//!
//! ```rust
//! use dirscout_common::{ScoutError, StealthLevel};
//!
//! let level = StealthLevel::default();
//! assert_eq!(level, StealthLevel::Balanced);
//!
//! let err = ScoutError::InvalidQuery("location is empty".into());
//! assert_eq!(err.to_string(), "Invalid search query: location is empty");
//!
//! let err = ScoutError::from(anyhow::anyhow!("connection refused").context("no session"));
//! assert_eq!(err.to_string(), "Driver error: no session: connection refused");
//! ```
use serde::{Deserialize, Serialize};

pub mod observability;

/// Browser automation stealth level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StealthLevel {
    Lightweight,
    #[default]
    Balanced,
    Maximum,
}

/// Error types used across the dirscout system.
#[derive(thiserror::Error, Debug)]
pub enum ScoutError {
    /// The search term or location could not be used to build a page URL.
    #[error("Invalid search query: {0}")]
    InvalidQuery(String),

    /// The browser session could not be opened.
    #[error("Driver error: {0:#}")]
    Driver(#[from] anyhow::Error),

    /// A run was requested while another one is still active.
    #[error("A scraping run is already in progress")]
    RunInProgress,
}

/// Convenient alias for results that use [`ScoutError`].
pub type Result<T> = std::result::Result<T, ScoutError>;
