//! Configuration management
//!
//! Handles loading, parsing, and validating the TOML configuration file.
//! Holds global settings and the keyword sets used to classify sinks.

use color_eyre::eyre::{self, Context, ContextCompat, Result};
use crossterm::style::Stylize;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::classify::{DEFAULT_HEADSET_KEYWORDS, DEFAULT_SPEAKER_KEYWORDS, Keywords};
use crate::style::ToggleStyle;

// ============================================================================
// Public Configuration Types
// ============================================================================

/// Main configuration structure
#[derive(Debug, Clone)]
pub struct Config {
    pub settings: Settings,
    pub keywords: Keywords,
}

/// Global settings
#[derive(Debug, Clone)]
pub struct Settings {
    /// Desktop notification after every switch
    pub notify: bool,
    pub log_level: String,
}

// ============================================================================
// Config File Deserialization (TOML)
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    settings: SettingsFile,
    #[serde(default)]
    keywords: KeywordsFile,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    #[serde(default = "default_true")]
    notify: bool,
    #[serde(default = "default_log_level")]
    log_level: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct KeywordsFile {
    #[serde(default = "default_speaker_keywords")]
    speaker: Vec<String>,
    #[serde(default = "default_headset_keywords")]
    headset: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_speaker_keywords() -> Vec<String> {
    DEFAULT_SPEAKER_KEYWORDS.iter().map(ToString::to_string).collect()
}

fn default_headset_keywords() -> Vec<String> {
    DEFAULT_HEADSET_KEYWORDS.iter().map(ToString::to_string).collect()
}

impl Default for SettingsFile {
    fn default() -> Self {
        Self {
            notify: true,
            log_level: default_log_level(),
        }
    }
}

impl Default for KeywordsFile {
    fn default() -> Self {
        Self {
            speaker: default_speaker_keywords(),
            headset: default_headset_keywords(),
        }
    }
}

const DEFAULT_CONFIG: &str = r#"# Audio Toggle Configuration
#
# Switches the default audio sink between speakers and a headset.
# Sinks are classified by case-insensitive substring match on the sink name.
# If a sink matches both lists, it counts as a headset.

[settings]
notify = true          # Desktop notification after each switch
log_level = "info"     # error, warn, info, debug, trace

# Keywords
# Find sink names with: audio-toggle list-sinks
[keywords]
speaker = ["built-in", "analog"]
headset = ["usb", "bluetooth", "headset", "headphone"]
"#;

// ============================================================================
// Config Implementation
// ============================================================================

impl Default for Config {
    fn default() -> Self {
        Self {
            settings: Settings {
                notify: true,
                log_level: default_log_level(),
            },
            keywords: Keywords::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default XDG config path
    ///
    /// Creates a commented default config on first use.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed, or fails validation.
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            info!("Creating default config at {:?}", config_path);
            Self::create_default_config(&config_path)?;
        }

        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed, or fails validation.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {path:?}"))?;

        Self::from_toml(&contents).with_context(|| format!("Invalid config: {path:?}"))
    }

    /// Parse and validate configuration from TOML text
    ///
    /// # Errors
    /// Returns an error if the TOML is malformed or fails validation.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config_file: ConfigFile =
            toml::from_str(contents).context("Failed to parse config TOML")?;
        Self::from_config_file(config_file)
    }

    fn from_config_file(config_file: ConfigFile) -> Result<Self> {
        validate_log_level(&config_file.settings.log_level)?;
        validate_patterns("speaker", &config_file.keywords.speaker)?;
        validate_patterns("headset", &config_file.keywords.headset)?;

        for pattern in &config_file.keywords.speaker {
            if config_file
                .keywords
                .headset
                .iter()
                .any(|h| h.trim().eq_ignore_ascii_case(pattern.trim()))
            {
                warn!(
                    "Keyword '{}' is in both lists; matching sinks count as headset",
                    pattern.trim()
                );
            }
        }

        Ok(Config {
            settings: Settings {
                notify: config_file.settings.notify,
                log_level: config_file.settings.log_level,
            },
            keywords: Keywords::new(&config_file.keywords.speaker, &config_file.keywords.headset),
        })
    }

    /// Get the XDG config path
    ///
    /// # Errors
    /// Returns an error if the config directory cannot be determined or created.
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("audio-toggle");
        fs::create_dir_all(&config_dir)
            .with_context(|| format!("Failed to create config dir: {config_dir:?}"))?;
        Ok(config_dir.join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<()> {
        fs::write(path, DEFAULT_CONFIG)
            .with_context(|| format!("Failed to write config: {path:?}"))?;

        eprintln!("Created default config at: {path:?}");
        eprintln!();
        eprintln!("Next steps:");
        eprintln!("  1. Run 'audio-toggle list-sinks' to see how your outputs are classified");
        eprintln!("  2. Edit the keyword lists if a device lands in the wrong category");
        eprintln!("  3. Run 'audio-toggle validate' to check your config");
        eprintln!();

        Ok(())
    }

    /// Print a human-readable summary of the configuration
    pub fn print_summary(&self) {
        println!("{}\n", "✓ Configuration valid".success());

        println!("{}", "Settings:".header());
        println!("  notify: {}", self.settings.notify);
        println!("  log_level: {}", self.settings.log_level);

        println!("\n{}", "Keywords:".header());
        println!(
            "  speaker: {}",
            self.keywords.speaker().join(", ").technical()
        );
        println!(
            "  headset: {}",
            self.keywords.headset().join(", ").technical()
        );
        println!("  {}", "(headset wins when both match)".dim());

        if let Ok(path) = Self::get_config_path() {
            println!("\n{} {}", "Config:".dim(), path.display());
        }
    }
}

fn validate_log_level(level: &str) -> Result<()> {
    match level {
        "error" | "warn" | "info" | "debug" | "trace" => Ok(()),
        level => eyre::bail!(
            "Invalid log_level '{level}'. Must be: error, warn, info, debug, or trace"
        ),
    }
}

/// Each list needs at least one pattern, and no pattern may be blank
/// (a blank pattern would match every sink)
fn validate_patterns(list: &str, patterns: &[String]) -> Result<()> {
    if patterns.is_empty() {
        eyre::bail!("No {list} keywords defined. Add at least one pattern to [keywords] {list}.");
    }
    if let Some(i) = patterns.iter().position(|p| p.trim().is_empty()) {
        eyre::bail!("Empty {list} keyword at position {}", i + 1);
    }
    Ok(())
}
