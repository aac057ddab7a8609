//! Unit tests for common-config crate

use std::io::Write;

use common_config::{EngineOptions, OptionName, QuarryConfig, StorageOptions};

#[test]
fn test_quarry_config_default() {
    let config = QuarryConfig::default();

    assert!(config.engine.filter_record_fields);
    assert!(config.engine.swap_dimensions);
    assert!(!config.engine.time_unit_days);
    assert!(config.engine.verbose);

    assert!(config.storage.use_special_types);
    assert!(config.storage.perform_conversions);
    assert!(config.storage.perform_boundary_checks);
    assert!(config.storage.use_mmap);
}

#[test]
fn test_every_option_round_trips_through_set() {
    let mut config = QuarryConfig::default();
    for name in OptionName::ALL {
        let before = config.get(name);
        let previous = config.set(name, !before);
        assert_eq!(previous, before, "{name}");
        assert_eq!(config.get(name), !before, "{name}");
    }
}

#[test]
fn test_option_names_display_and_parse() {
    for name in OptionName::ALL {
        let text = name.to_string();
        assert_eq!(text.parse::<OptionName>().unwrap(), name);
        assert_eq!(text.to_lowercase().parse::<OptionName>().unwrap(), name);
    }
}

#[test]
fn test_quarry_config_serialization() {
    let mut config = QuarryConfig::default();
    config.set(OptionName::TimeUnitDays, true);
    config.set(OptionName::UseSpecialTypes, false);

    let json = serde_json::to_string(&config).unwrap();
    assert!(json.contains("time_unit_days"));

    let deserialized: QuarryConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(deserialized, config);
}

#[test]
fn test_config_partial_json() {
    let json = r#"{"engine": {"swap_dimensions": false}}"#;
    let config: QuarryConfig = serde_json::from_str(json).unwrap();

    assert!(!config.engine.swap_dimensions);
    assert!(config.engine.filter_record_fields);
    assert_eq!(config.storage, StorageOptions::default());
}

#[test]
fn test_engine_options_debug_format() {
    let options = EngineOptions {
        verbose: false,
        ..EngineOptions::default()
    };
    let debug_str = format!("{:?}", options);
    assert!(debug_str.contains("EngineOptions"));
    assert!(debug_str.contains("verbose: false"));
}

#[test]
fn test_config_from_json_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"storage": {{"perform_conversions": false}}}}"#).unwrap();

    let config = QuarryConfig::from_json_file(file.path()).unwrap();
    assert!(!config.storage.perform_conversions);
    assert!(config.storage.use_special_types);
}

#[test]
fn test_config_from_missing_file() {
    let err = QuarryConfig::from_json_file("/definitely/not/here.json").unwrap_err();
    assert_eq!(err.code(), -20);
}
