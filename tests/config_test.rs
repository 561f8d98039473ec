//! Loading splitter configuration from files and environment overrides.
//!
//! Every test that extracts a configuration is `#[serial]` because the
//! environment overrides are process-global.

use daq_splitter::config::{SplitterConfig, ENV_PREFIX};
use daq_splitter::{DaqError, SplitterCallbacks};
use serial_test::serial;
use std::io::Write;
use tempfile::NamedTempFile;

const LOG_LEVEL_VAR: &str = "DAQ_SPLIT_APPLICATION__LOG_LEVEL";

fn write_config(text: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[derive(Default)]
struct CountBrackets(usize);

impl SplitterCallbacks for CountBrackets {
    fn end_event(&mut self, _event_index: usize) {
        self.0 += 1;
    }
}

#[test]
#[serial]
fn test_shipped_config_builds_splitter() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/splitter.toml");
    let config = SplitterConfig::load_from(path).unwrap();

    assert_eq!(config.events.len(), 2);
    assert_eq!(config.events[0].name, "main");

    let splitter = config.build_splitter().unwrap();
    assert_eq!(splitter.event_count(), 2);
    assert_eq!(splitter.module_count(0), Some(3));
    assert_eq!(splitter.is_splitting_enabled(0), Some(true));
    assert_eq!(splitter.is_splitting_enabled(1), Some(false));
}

#[test]
#[serial]
fn test_load_from_temp_file_and_split() {
    let file = write_config(
        r#"
[application]
name = "bench crate"
log_level = "debug"

[[events]]
name = "main"
modules = [
    { name = "mdpp16", header_filter = "0100 XXXX XXXX XXXX XXXX SSSS SSSS SSSS" },
]
"#,
    );

    let config = SplitterConfig::load_from(file.path()).unwrap();
    assert_eq!(config.application.name, "bench crate");
    assert_eq!(config.application.log_level, "debug");

    let mut splitter = config.build_splitter().unwrap();
    let words = [0x4000_0001, 0xAA, 0x4000_0000];
    let mut brackets = CountBrackets::default();
    let mut cycle = splitter.begin_event(0).unwrap();
    cycle.module_data(0, &words).unwrap();
    assert_eq!(cycle.end_event(&mut brackets), 2);
    assert_eq!(brackets.0, 2);
}

#[test]
#[serial]
fn test_missing_sections_use_defaults() {
    let config = SplitterConfig::from_toml_str("").unwrap();
    assert_eq!(config.application.log_level, "info");
    assert!(config.events.is_empty());

    let splitter = config.build_splitter().unwrap();
    assert_eq!(splitter.event_count(), 0);
}

#[test]
#[serial]
fn test_module_without_filter_disables_splitting() {
    let config = SplitterConfig::from_toml_str(
        r#"
[[events]]
name = "periodic"
modules = [{ name = "scaler" }]
"#,
    )
    .unwrap();

    assert_eq!(config.events[0].modules[0].header_filter, "");
    let splitter = config.build_splitter().unwrap();
    assert_eq!(splitter.is_splitting_enabled(0), Some(false));
}

#[test]
#[serial]
fn test_env_overrides_file_value() {
    assert!(LOG_LEVEL_VAR.starts_with(ENV_PREFIX));
    let file = write_config(
        r#"
[application]
log_level = "info"
"#,
    );

    std::env::set_var(LOG_LEVEL_VAR, "trace");
    let loaded = SplitterConfig::load_from(file.path());
    std::env::remove_var(LOG_LEVEL_VAR);

    assert_eq!(loaded.unwrap().application.log_level, "trace");
}

#[test]
#[serial]
fn test_invalid_log_level_from_env_fails_validation() {
    std::env::set_var(LOG_LEVEL_VAR, "chatty");
    let loaded = SplitterConfig::from_toml_str("");
    std::env::remove_var(LOG_LEVEL_VAR);

    let result = loaded.unwrap().validate();
    assert!(matches!(result, Err(DaqError::Configuration(_))));
    let err_msg = result.unwrap_err().to_string();
    assert!(err_msg.contains("chatty"));
}

#[test]
#[serial]
fn test_overlong_filter_in_file_rejected() {
    let file = write_config(
        r#"
[[events]]
name = "main"
modules = [{ name = "wide", header_filter = "1111 1111 1111 1111 1111 1111 1111 1111 1" }]
"#,
    );

    let config = SplitterConfig::load_from(file.path()).unwrap();
    let err = config.build_splitter().unwrap_err();
    assert!(matches!(err, DaqError::Filter(_)));
    assert!(err.to_string().contains("33"));
}

#[test]
#[serial]
fn test_malformed_toml_is_config_error() {
    let file = write_config("[[events]]\nname = 42\n");
    let result = SplitterConfig::load_from(file.path());
    assert!(matches!(result, Err(DaqError::Config(_))));
}
