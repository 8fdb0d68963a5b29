//! Device classification
//!
//! Sorts sinks into coarse output categories by case-insensitive substring
//! matching of configured keywords against the sink name.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::inventory::SinkRecord;

/// Default patterns identifying built-in speakers
pub const DEFAULT_SPEAKER_KEYWORDS: &[&str] = &["built-in", "analog"];

/// Default patterns identifying headsets and headphones
pub const DEFAULT_HEADSET_KEYWORDS: &[&str] = &["usb", "bluetooth", "headset", "headphone"];

/// Coarse output category of a sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Speaker,
    Headset,
    Unknown,
}

impl Category {
    /// Category a toggle switches to from this one
    ///
    /// Anything that is not currently a speaker toggles back to speakers.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Speaker => Self::Headset,
            Self::Headset | Self::Unknown => Self::Speaker,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Speaker => "speaker",
            Self::Headset => "headset",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyword sets for the speaker and headset categories
///
/// Patterns are stored lower-cased and de-duplicated, in configured order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keywords {
    speaker: Vec<String>,
    headset: Vec<String>,
}

impl Keywords {
    /// Build keyword sets, normalizing each pattern (trimmed, lower-cased, no duplicates)
    pub fn new<S, H>(speaker: S, headset: H) -> Self
    where
        S: IntoIterator,
        S::Item: AsRef<str>,
        H: IntoIterator,
        H::Item: AsRef<str>,
    {
        Self {
            speaker: normalize(speaker),
            headset: normalize(headset),
        }
    }

    #[must_use]
    pub fn speaker(&self) -> &[String] {
        &self.speaker
    }

    #[must_use]
    pub fn headset(&self) -> &[String] {
        &self.headset
    }

    /// Patterns for a category (`Unknown` has none)
    #[must_use]
    pub fn patterns(&self, category: Category) -> &[String] {
        match category {
            Category::Speaker => &self.speaker,
            Category::Headset => &self.headset,
            Category::Unknown => &[],
        }
    }
}

impl Default for Keywords {
    fn default() -> Self {
        Self::new(DEFAULT_SPEAKER_KEYWORDS, DEFAULT_HEADSET_KEYWORDS)
    }
}

fn normalize<I>(patterns: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for pattern in patterns {
        let pattern = pattern.as_ref().trim().to_lowercase();
        if !pattern.is_empty() && !out.contains(&pattern) {
            out.push(pattern);
        }
    }
    out
}

/// Classify a sink by its name
///
/// Headset patterns win over speaker patterns when both match, so a device
/// like "USB Headset Analog Stereo" is a headset.
#[must_use]
pub fn classify(sink: &SinkRecord, keywords: &Keywords) -> Category {
    classify_name(&sink.name, keywords)
}

/// Classify a bare sink name (used for the default sink reported by the server)
#[must_use]
pub fn classify_name(name: &str, keywords: &Keywords) -> Category {
    let name = name.to_lowercase();
    let matches = |patterns: &[String]| patterns.iter().any(|p| name.contains(p.as_str()));

    if matches(&keywords.headset) {
        Category::Headset
    } else if matches(&keywords.speaker) {
        Category::Speaker
    } else {
        Category::Unknown
    }
}
