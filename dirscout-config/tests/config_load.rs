use dirscout_common::StealthLevel;
use dirscout_config::{ElementSource, ScoutConfigLoader};
use serial_test::serial;
use std::{fs, path::PathBuf};
use tempfile::TempDir;

/// Helper to write a YAML file in a temp dir and return its path.
fn write_yaml(tmp: &TempDir, name: &str, yaml: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, yaml).expect("write yaml");
    p
}

#[test]
#[serial]
fn test_config_load() {
    let tmp = TempDir::new().unwrap();

    let file_yaml = r#"
site:
  selectors:
    phone: ".phone-number"
browser:
  webdriver_url: "http://chrome:4444"
  stealth: maximum
  element_source: snapshot
pacing:
  min_delay_ms: 2500
  max_delay_ms: 5000
output:
  directory: "${SCOUT_TEST_OUTPUT}/csv"
logging:
  format: json
  "#;
    let p = write_yaml(&tmp, "dirscout.yaml", file_yaml);

    temp_env::with_var("SCOUT_TEST_OUTPUT", Some("/srv/leads"), || {
        let config = ScoutConfigLoader::new()
            .with_env_prefix("SCOUTTEST_FILE")
            .with_file(&p)
            .load()
            .expect("load system config");

        assert_eq!(config.site.selectors.phone, ".phone-number");
        assert_eq!(config.site.selectors.card, ".result");
        assert_eq!(config.browser.webdriver_url, "http://chrome:4444");
        assert_eq!(config.browser.stealth, StealthLevel::Maximum);
        assert_eq!(config.browser.element_source, ElementSource::Snapshot);
        assert_eq!(config.pacing.min_delay_ms, 2500);
        assert_eq!(config.output.directory, PathBuf::from("/srv/leads/csv"));
    });
}

#[test]
#[serial]
fn required_file_must_exist() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("nope.yaml");

    let result = ScoutConfigLoader::new()
        .with_env_prefix("SCOUTTEST_REQUIRED")
        .with_file(missing)
        .load();

    assert!(result.is_err());
}

#[test]
#[serial]
fn later_sources_override_earlier_files() {
    let tmp = TempDir::new().unwrap();
    let base = write_yaml(&tmp, "base.yaml", "output:\n  file_prefix: base\n");
    let local = write_yaml(&tmp, "local.yaml", "output:\n  file_prefix: local\n");

    let config = ScoutConfigLoader::new()
        .with_env_prefix("SCOUTTEST_LAYERS")
        .with_file(base)
        .with_optional_file(local)
        .load()
        .unwrap();

    assert_eq!(config.output.file_prefix, "local");
}
