//! Loader for dirscout configuration with YAML + environment overlays.
//!
//! Precedence, lowest first: built-in defaults, the user config file
//! (`<config_dir>/dirscout/dirscout.yaml`), `./dirscout.yaml`, any file or
//! inline YAML added explicitly, then `DIRSCOUT__SECTION__KEY` environment
//! variables. String values may reference `${VAR}`; expansion runs after
//! all sources are merged.
use config::{Config, ConfigError, Environment, File};
use serde_json::Value;
use std::path::{Path, PathBuf};

mod model;

pub use model::{
    BrowserConfig, ElementSource, LoggingConfig, OutputConfig, PacingConfig, ScoutConfig,
    SelectorConfig, SiteConfig, DEFAULT_SEARCH_URL,
};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const CONFIG_FILE_NAME: &str = "dirscout.yaml";

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Per-user config file location, if the platform has a config directory.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("dirscout").join(CONFIG_FILE_NAME))
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct ScoutConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    env_prefix: String,
}

impl Default for ScoutConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoutConfigLoader {
    /// Start from built-in defaults; `DIRSCOUT__` env overrides are applied at load time.
    ///
    /// ```
    /// use dirscout_config::ScoutConfigLoader;
    ///
    /// let config = ScoutConfigLoader::new()
    ///     .with_yaml_str("pacing:\n  min_delay_ms: 1000\n  max_delay_ms: 2000")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.pacing.min_delay_ms, 1000);
    /// assert_eq!(config.site.selectors.card, ".result");
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
            env_prefix: "DIRSCOUT".to_string(),
        }
    }

    /// Use a different environment prefix (tests use this to stay isolated).
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = prefix.to_string();
        self
    }

    /// Attach a YAML/TOML/JSON file that must exist; the format is inferred by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that is silently skipped when absent.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Layer the per-user file and `./dirscout.yaml`, both optional.
    pub fn with_default_locations(mut self) -> Self {
        if let Some(user) = user_config_path() {
            self = self.with_optional_file(user);
        }
        self.with_optional_file(CONFIG_FILE_NAME)
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    ///
    /// ```
    /// use dirscout_config::{ElementSource, ScoutConfigLoader};
    ///
    /// let cfg = ScoutConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// browser:
    ///   headless: true
    ///   element_source: snapshot
    /// output:
    ///   file_prefix: "plumbers"
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert!(cfg.browser.headless);
    /// assert_eq!(cfg.browser.element_source, ElementSource::Snapshot);
    /// assert_eq!(cfg.output.file_prefix, "plumbers");
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into a validated config.
    ///
    /// ```
    /// use dirscout_config::ScoutConfigLoader;
    ///
    /// std::env::set_var("SCOUT_DOC_OUT", "/tmp/leads");
    ///
    /// let config = ScoutConfigLoader::new()
    ///     .with_yaml_str("output:\n  directory: \"${SCOUT_DOC_OUT}/yp\"")
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.output.directory, std::path::PathBuf::from("/tmp/leads/yp"));
    ///
    /// std::env::remove_var("SCOUT_DOC_OUT");
    /// ```
    pub fn load(self) -> Result<ScoutConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(&self.env_prefix)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: ScoutConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;
        typed.validate()?;

        Ok(typed)
    }
}
