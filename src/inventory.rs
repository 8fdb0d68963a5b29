//! Sink and stream inventory
//!
//! Parses the text listings produced by `pactl` into typed records:
//! - `pactl list short sinks`: one sink per line, tab-separated
//! - `pactl list short sink-inputs`: one playback stream per line
//! - `pactl info`: server summary, including the `Default Sink:` line
//! - `pactl list sinks`: long listing, used only for human descriptions
//!
//! Parsing never fails. Malformed lines are skipped and empty input yields
//! empty results, so a failed listing degrades to "nothing found".

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::trace;

/// One audio output as listed by the audio server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkRecord {
    /// Server-assigned index (first field)
    pub id: String,
    /// Stable sink name, unique within one listing (second field)
    pub name: String,
    /// Remaining descriptive field as listed (third field, may be empty)
    pub description: String,
}

/// One in-flight playback stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamRecord {
    pub id: String,
}

/// Parse a short sink listing into records, preserving listing order
///
/// Each line is `index \t name \t description...`. Lines with fewer than two
/// tab-separated fields are skipped.
#[must_use]
pub fn parse(raw: &str) -> Vec<SinkRecord> {
    raw.lines()
        .filter_map(|line| {
            let line = line.trim_end_matches('\r');
            let mut fields = line.split('\t');
            let id = fields.next()?;
            let Some(name) = fields.next().filter(|n| !n.trim().is_empty()) else {
                if !line.trim().is_empty() {
                    trace!("Skipping malformed sink line: {:?}", line);
                }
                return None;
            };
            let description = fields.next().unwrap_or_default();

            Some(SinkRecord {
                id: id.trim().to_string(),
                name: name.trim().to_string(),
                description: description.trim().to_string(),
            })
        })
        .collect()
}

/// Parse a short sink-input listing into stream records (first field of each line)
#[must_use]
pub fn parse_streams(raw: &str) -> Vec<StreamRecord> {
    raw.lines()
        .filter_map(|line| {
            let id = line.split('\t').next()?.trim();
            (!id.is_empty()).then(|| StreamRecord { id: id.to_string() })
        })
        .collect()
}

/// Extract the default sink name from `pactl info` output
#[must_use]
pub fn parse_default_sink(info: &str) -> Option<String> {
    info.lines()
        .find_map(|line| line.trim_start().strip_prefix("Default Sink:"))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
}

/// Map sink names to their human descriptions from a long `pactl list sinks` listing
///
/// Only the first `Name:` and `Description:` lines of each `Sink #N` block are used;
/// property lines further down the block are indented deeper and ignored.
#[must_use]
pub fn parse_descriptions(raw: &str) -> HashMap<String, String> {
    let mut descriptions = HashMap::new();
    let mut current_name: Option<String> = None;

    for line in raw.lines() {
        if line.starts_with("Sink #") {
            current_name = None;
            continue;
        }

        // Block fields sit one tab deep; properties sit two tabs deep
        let Some(field) = line.strip_prefix('\t') else {
            continue;
        };
        if field.starts_with('\t') {
            continue;
        }

        if let Some(name) = field.strip_prefix("Name:") {
            current_name = Some(name.trim().to_string());
        } else if let Some(desc) = field.strip_prefix("Description:")
            && let Some(name) = current_name.take()
        {
            descriptions.insert(name, desc.trim().to_string());
        }
    }

    descriptions
}
