//! Integration tests for config loading and validation
//!
//! These tests go through TOML files on disk rather than constructing Config
//! structs directly.

use audio_toggle::classify::{Category, classify_name};
use audio_toggle::config::Config;
use std::fs;
use tempfile::TempDir;

/// Helper to create a temporary config directory
fn setup_temp_config() -> (TempDir, std::path::PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_dir = temp_dir.path().join("audio-toggle");
    fs::create_dir_all(&config_dir).expect("Failed to create config dir");
    let config_path = config_dir.join("config.toml");
    (temp_dir, config_path)
}

#[test]
fn test_config_load_toml() {
    let (_temp, config_path) = setup_temp_config();

    let toml_content = r#"
[settings]
notify = false
log_level = "debug"

[keywords]
speaker = ["Built-in", "HDMI"]
headset = ["Bluetooth", "Jabra"]
"#;

    fs::write(&config_path, toml_content).expect("Failed to write TOML");

    let loaded = Config::load_from_path(&config_path).expect("Failed to load config");

    assert!(!loaded.settings.notify);
    assert_eq!(loaded.settings.log_level, "debug");
    assert_eq!(loaded.keywords.speaker(), ["built-in", "hdmi"]);
    assert_eq!(loaded.keywords.headset(), ["bluetooth", "jabra"]);

    assert_eq!(
        classify_name("alsa_output.usb-GN_Jabra_Evolve-00.analog-stereo", &loaded.keywords),
        Category::Headset
    );
    assert_eq!(
        classify_name("alsa_output.pci-0000_01_00.1.hdmi-stereo", &loaded.keywords),
        Category::Speaker
    );
    // "usb" is no longer a headset keyword in this config
    assert_eq!(
        classify_name("alsa_output.usb-speakers", &loaded.keywords),
        Category::Unknown
    );
}

#[test]
fn test_partial_config_keeps_defaults() {
    let (_temp, config_path) = setup_temp_config();
    fs::write(&config_path, "[settings]\nnotify = false\n").expect("Failed to write TOML");

    let loaded = Config::load_from_path(&config_path).expect("Failed to load config");

    assert!(!loaded.settings.notify);
    assert_eq!(loaded.keywords.speaker(), ["built-in", "analog"]);
    assert_eq!(
        loaded.keywords.headset(),
        ["usb", "bluetooth", "headset", "headphone"]
    );
}

#[test]
fn test_overlapping_keyword_counts_as_headset() {
    let (_temp, config_path) = setup_temp_config();
    fs::write(
        &config_path,
        "[keywords]\nspeaker = [\"usb\"]\nheadset = [\"usb\"]\n",
    )
    .expect("Failed to write TOML");

    let loaded = Config::load_from_path(&config_path).expect("Overlap is a warning, not an error");
    assert_eq!(
        classify_name("alsa_output.usb-device", &loaded.keywords),
        Category::Headset
    );
}

#[test]
fn test_invalid_configs_rejected() {
    let cases = [
        ("malformed toml", "[keywords\nspeaker = ["),
        ("bad log level", "[settings]\nlog_level = \"verbose\"\n"),
        ("empty speaker list", "[keywords]\nspeaker = []\n"),
        ("blank pattern", "[keywords]\nheadset = [\"\"]\n"),
        ("unknown section", "[rules]\napp_id = \"firefox\"\n"),
    ];

    for (name, contents) in cases {
        let (_temp, config_path) = setup_temp_config();
        fs::write(&config_path, contents).expect("Failed to write TOML");
        assert!(
            Config::load_from_path(&config_path).is_err(),
            "{name} should be rejected"
        );
    }
}

#[test]
fn test_missing_file_is_an_error() {
    let (_temp, config_path) = setup_temp_config();
    let err = Config::load_from_path(&config_path).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to read config"));
}
