//! Strongly typed configuration. Every field has a default so an empty
//! source set yields a working YellowPages setup.
use config::ConfigError;
use dirscout_common::{observability::LogFormat, StealthLevel};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_SEARCH_URL: &str = "https://www.yellowpages.com/search?search_terms={term}&geo_location_terms={location}&page={page}";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoutConfig {
    pub site: SiteConfig,
    pub browser: BrowserConfig,
    pub pacing: PacingConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

/// Target site: where result pages live and how listings are marked up.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Result page URL with `{term}`, `{location}` and `{page}` placeholders.
    pub search_url: String,
    pub selectors: SelectorConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            search_url: DEFAULT_SEARCH_URL.to_string(),
            selectors: SelectorConfig::default(),
        }
    }
}

/// CSS selectors for one business card and the fields inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub card: String,
    pub name: String,
    pub street: String,
    pub locality: String,
    pub phone: String,
    /// Anchor whose `href` is the business website.
    pub website: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            card: ".result".into(),
            name: ".business-name".into(),
            street: ".street-address".into(),
            locality: ".locality".into(),
            phone: ".phones".into(),
            website: ".track-visit-website".into(),
        }
    }
}

/// Where card fields are read from once a page is loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementSource {
    /// Query elements through WebDriver on the live page.
    #[default]
    Live,
    /// Pull the rendered page source once and query it locally.
    Snapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub webdriver_url: String,
    pub headless: bool,
    pub stealth: StealthLevel,
    pub element_source: ElementSource,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".into(),
            headless: false,
            stealth: StealthLevel::Balanced,
            element_source: ElementSource::Live,
        }
    }
}

/// Randomized wait after each page load, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 3_000,
            max_delay_ms: 6_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
    pub file_prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            file_prefix: "yellowpages_data".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: Option<PathBuf>,
    pub format: LogFormat,
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: None,
            format: LogFormat::Text,
            filter: "info".into(),
        }
    }
}

impl ScoutConfig {
    /// Reject settings the scraper cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for placeholder in ["{term}", "{location}", "{page}"] {
            if !self.site.search_url.contains(placeholder) {
                return Err(ConfigError::Message(format!(
                    "site.search_url must contain {placeholder}"
                )));
            }
        }

        let selectors = &self.site.selectors;
        let named = [
            ("card", &selectors.card),
            ("name", &selectors.name),
            ("street", &selectors.street),
            ("locality", &selectors.locality),
            ("phone", &selectors.phone),
            ("website", &selectors.website),
        ];
        if let Some((field, _)) = named.iter().find(|(_, sel)| sel.trim().is_empty()) {
            return Err(ConfigError::Message(format!(
                "site.selectors.{field} must not be empty"
            )));
        }

        if self.pacing.min_delay_ms > self.pacing.max_delay_ms {
            return Err(ConfigError::Message(format!(
                "pacing.min_delay_ms ({}) exceeds pacing.max_delay_ms ({})",
                self.pacing.min_delay_ms, self.pacing.max_delay_ms
            )));
        }

        if self.output.file_prefix.trim().is_empty() {
            return Err(ConfigError::Message(
                "output.file_prefix must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Render the effective configuration as YAML.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::Message(e.to_string()))
    }
}
