//! Switch controller
//!
//! Owns the remembered output category and sequences one switch:
//! list sinks → select → set default → list streams → relocate.
//!
//! Collaborator failures never escape as errors. A failed listing is treated as
//! an empty one, so the selection policy decides what the user sees.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::audio::AudioServer;
use crate::classify::{Category, Keywords, classify, classify_name};
use crate::inventory::{self, SinkRecord};
use crate::relocate::{RelocationSummary, relocate};
use crate::selector;

/// Result of a switch request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum SwitchOutcome {
    /// The default sink changed and existing streams were relocated
    Switched {
        category: Category,
        sink: SinkRecord,
        /// Human-readable name of the selected sink
        description: String,
        /// True when no sink matched the category exactly
        fallback: bool,
        relocation: RelocationSummary,
    },
    /// No eligible sink for the requested category; nothing changed
    NoMatchingDevice { category: Category },
    /// The audio server refused to make the selected sink default; nothing changed
    DefaultSinkRejected {
        category: Category,
        sink: SinkRecord,
        reason: String,
    },
}

impl SwitchOutcome {
    #[must_use]
    pub fn is_switched(&self) -> bool {
        matches!(self, Self::Switched { .. })
    }

    #[must_use]
    pub fn category(&self) -> Category {
        match self {
            Self::Switched { category, .. }
            | Self::NoMatchingDevice { category }
            | Self::DefaultSinkRejected { category, .. } => *category,
        }
    }
}

/// A sink together with its classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedSink {
    #[serde(flatten)]
    pub sink: SinkRecord,
    pub category: Category,
    /// Friendly description if the server provides one
    pub label: String,
    pub is_default: bool,
}

/// Point-in-time view of the audio server as the controller sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub current_output: Category,
    pub default_sink: Option<String>,
    pub sinks: Vec<ClassifiedSink>,
}

/// Orchestrates classification, selection, default assignment and relocation
pub struct SwitchController<S> {
    server: S,
    keywords: Keywords,
    current_output: Category,
}

impl<S: AudioServer> SwitchController<S> {
    /// Create a controller; the remembered output starts as `Speaker`
    pub fn new(server: S, keywords: Keywords) -> Self {
        Self {
            server,
            keywords,
            current_output: Category::Speaker,
        }
    }

    #[must_use]
    pub fn current_output(&self) -> Category {
        self.current_output
    }

    #[must_use]
    pub fn keywords(&self) -> &Keywords {
        &self.keywords
    }

    #[must_use]
    pub fn server(&self) -> &S {
        &self.server
    }

    /// Replace the keyword sets (configuration reload)
    pub fn reload_keywords(&mut self, keywords: Keywords) {
        debug!(
            "Keywords reloaded: speaker={:?} headset={:?}",
            keywords.speaker(),
            keywords.headset()
        );
        self.keywords = keywords;
    }

    /// Switch the default output to a sink of `category`
    ///
    /// The remembered output only changes when the audio server accepted the
    /// new default sink.
    pub async fn switch_to(&mut self, category: Category) -> SwitchOutcome {
        let sinks = self.list_sinks().await;

        let Some(selection) = selector::select(&sinks, category, &self.keywords) else {
            info!("No {} sink among {} listed", category, sinks.len());
            return SwitchOutcome::NoMatchingDevice { category };
        };
        let sink = selection.sink.clone();
        let fallback = selection.fallback;
        if fallback {
            warn!("No exact {} match, falling back to {}", category, sink.name);
        }

        if let Err(e) = self.server.set_default_sink(&sink.name).await {
            warn!("Could not set default sink {}: {}", sink.name, e);
            return SwitchOutcome::DefaultSinkRejected {
                category,
                sink,
                reason: e.to_string(),
            };
        }

        let streams = self.server.list_streams().await.unwrap_or_else(|e| {
            warn!("Could not list streams: {}", e);
            Vec::new()
        });

        let server = &self.server;
        let relocation = relocate(&streams, &sink, |id, name| async move {
            server.move_stream(&id, &name).await
        })
        .await;

        if relocation.is_partial() {
            warn!(
                "Moved {} of {} streams to {}",
                relocation.moved,
                relocation.attempted(),
                sink.name
            );
        }

        debug!("Output: {} → {}", self.current_output, category);
        self.current_output = category;

        let description = self.describe(&sink).await;
        info!("Switched to {} ({})", description, category);

        SwitchOutcome::Switched {
            category,
            sink,
            description,
            fallback,
            relocation,
        }
    }

    /// Switch to headset from speaker, otherwise to speaker
    pub async fn toggle(&mut self) -> SwitchOutcome {
        self.switch_to(self.current_output.toggled()).await
    }

    /// Re-detect the current output from the server's default sink
    ///
    /// Leaves the remembered output untouched when the server reports no default.
    pub async fn refresh(&mut self) -> Category {
        match self.server.default_sink_name().await {
            Ok(Some(name)) => {
                let category = classify_name(&name, &self.keywords);
                debug!("Default sink {} classified as {}", name, category);
                self.current_output = category;
            }
            Ok(None) => debug!("Audio server reports no default sink"),
            Err(e) => warn!("Could not query default sink: {}", e),
        }
        self.current_output
    }

    /// Classify every listed sink and report the current default
    pub async fn snapshot(&self) -> Snapshot {
        let sinks = self.list_sinks().await;
        let default_sink = self.server.default_sink_name().await.unwrap_or_else(|e| {
            warn!("Could not query default sink: {}", e);
            None
        });
        let descriptions = self.descriptions().await;

        let sinks = sinks
            .into_iter()
            .map(|sink| ClassifiedSink {
                category: classify(&sink, &self.keywords),
                label: label_for(&sink, &descriptions),
                is_default: default_sink.as_deref() == Some(sink.name.as_str()),
                sink,
            })
            .collect();

        Snapshot {
            current_output: self.current_output,
            default_sink,
            sinks,
        }
    }

    async fn list_sinks(&self) -> Vec<SinkRecord> {
        match self.server.list_sinks().await {
            Ok(raw) => inventory::parse(&raw),
            Err(e) => {
                warn!("Could not list sinks: {}", e);
                Vec::new()
            }
        }
    }

    async fn descriptions(&self) -> HashMap<String, String> {
        self.server.sink_descriptions().await.unwrap_or_else(|e| {
            debug!("Sink descriptions unavailable: {}", e);
            HashMap::new()
        })
    }

    async fn describe(&self, sink: &SinkRecord) -> String {
        label_for(sink, &self.descriptions().await)
    }
}

/// Friendly description, else the listed description, else the name
fn label_for(sink: &SinkRecord, descriptions: &HashMap<String, String>) -> String {
    descriptions
        .get(&sink.name)
        .filter(|d| !d.is_empty())
        .or_else(|| Some(&sink.description).filter(|d| !d.is_empty()))
        .unwrap_or(&sink.name)
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{Call, MockAudioServer};
    use pretty_assertions::assert_eq;

    fn controller(server: MockAudioServer) -> SwitchController<MockAudioServer> {
        SwitchController::new(server, Keywords::default())
    }

    #[tokio::test]
    async fn test_toggle_end_to_end_selects_bluetooth_headset() {
        let server =
            MockAudioServer::with_sinks(&["HD-Audio Generic Analog", "Bluetooth Headset WH-1000"]);
        let mut ctl = controller(server);
        assert_eq!(ctl.current_output(), Category::Speaker);

        let outcome = ctl.toggle().await;

        match &outcome {
            SwitchOutcome::Switched {
                category,
                sink,
                fallback,
                relocation,
                ..
            } => {
                assert_eq!(*category, Category::Headset);
                assert_eq!(sink.name, "Bluetooth Headset WH-1000");
                assert!(!fallback);
                assert_eq!(*relocation, RelocationSummary { moved: 0, failed: 0 });
            }
            other => panic!("expected switch, got {other:?}"),
        }
        assert_eq!(ctl.current_output(), Category::Headset);
        assert_eq!(
            ctl.server().calls(),
            vec![
                Call::ListSinks,
                Call::SetDefault("Bluetooth Headset WH-1000".to_string()),
                Call::ListStreams,
                Call::Descriptions,
            ]
        );
    }

    #[tokio::test]
    async fn test_toggle_back_to_speaker() {
        let server =
            MockAudioServer::with_sinks(&["HD-Audio Generic Analog", "Bluetooth Headset WH-1000"]);
        let mut ctl = controller(server);

        ctl.toggle().await;
        let outcome = ctl.toggle().await;

        assert_eq!(outcome.category(), Category::Speaker);
        assert_eq!(ctl.current_output(), Category::Speaker);
        assert_eq!(
            ctl.server().default_sink.lock().unwrap().as_deref(),
            Some("HD-Audio Generic Analog")
        );
    }

    #[tokio::test]
    async fn test_switch_to_speaker_twice_is_not_deduplicated() {
        let server = MockAudioServer::with_sinks(&["Built-in Audio Analog Stereo"]).streams(&["7"]);
        let mut ctl = controller(server);

        for _ in 0..2 {
            let outcome = ctl.switch_to(Category::Speaker).await;
            assert!(outcome.is_switched());
            assert_eq!(ctl.current_output(), Category::Speaker);
        }

        let calls = ctl.server().calls();
        let set_defaults = calls
            .iter()
            .filter(|c| matches!(c, Call::SetDefault(_)))
            .count();
        let moves = calls.iter().filter(|c| matches!(c, Call::Move(..))).count();
        assert_eq!(set_defaults, 2);
        assert_eq!(moves, 2);
    }

    #[tokio::test]
    async fn test_no_headset_leaves_state_unchanged() {
        let server = MockAudioServer::with_sinks(&["Built-in Audio Analog Stereo"]);
        let mut ctl = controller(server);

        let outcome = ctl.switch_to(Category::Headset).await;

        assert_eq!(
            outcome,
            SwitchOutcome::NoMatchingDevice {
                category: Category::Headset
            }
        );
        assert_eq!(ctl.current_output(), Category::Speaker);
        assert_eq!(ctl.server().calls(), vec![Call::ListSinks]);
    }

    #[tokio::test]
    async fn test_speaker_fallback_to_unclassified_sink() {
        let server = MockAudioServer::with_sinks(&["Virtual Null Sink"]);
        let mut ctl = controller(server);
        ctl.current_output = Category::Headset;

        let outcome = ctl.switch_to(Category::Speaker).await;

        match outcome {
            SwitchOutcome::Switched { sink, fallback, .. } => {
                assert_eq!(sink.name, "Virtual Null Sink");
                assert!(fallback);
            }
            other => panic!("expected switch, got {other:?}"),
        }
        assert_eq!(ctl.current_output(), Category::Speaker);
    }

    #[tokio::test]
    async fn test_set_default_rejected_skips_relocation() {
        let mut server = MockAudioServer::with_sinks(&["Bluetooth Headset WH-1000"]).streams(&["1"]);
        server.reject_default = true;
        let mut ctl = controller(server);

        let outcome = ctl.switch_to(Category::Headset).await;

        assert!(matches!(
            outcome,
            SwitchOutcome::DefaultSinkRejected {
                category: Category::Headset,
                ..
            }
        ));
        assert_eq!(ctl.current_output(), Category::Speaker);
        assert!(!ctl.server().calls().contains(&Call::ListStreams));
    }

    #[tokio::test]
    async fn test_stream_listing_failure_still_switches() {
        let mut server = MockAudioServer::with_sinks(&["Bluetooth Headset WH-1000"]).streams(&["4"]);
        server.fail_list_streams = true;
        let mut ctl = controller(server);

        let outcome = ctl.switch_to(Category::Headset).await;

        match outcome {
            SwitchOutcome::Switched {
                category,
                relocation,
                ..
            } => {
                assert_eq!(category, Category::Headset);
                assert_eq!(relocation, RelocationSummary::default());
            }
            other => panic!("expected switch, got {other:?}"),
        }
        assert_eq!(ctl.current_output(), Category::Headset);
        assert_eq!(
            ctl.server().default_sink.lock().unwrap().as_deref(),
            Some("Bluetooth Headset WH-1000")
        );
        assert!(
            !ctl.server()
                .calls()
                .iter()
                .any(|c| matches!(c, Call::Move(..)))
        );
    }

    #[tokio::test]
    async fn test_partial_relocation_still_switches() {
        let mut server =
            MockAudioServer::with_sinks(&["USB Headset Analog Stereo"]).streams(&["1", "2", "3"]);
        server.failing_streams.insert("2".to_string());
        let mut ctl = controller(server);

        let outcome = ctl.switch_to(Category::Headset).await;

        match outcome {
            SwitchOutcome::Switched { relocation, .. } => {
                assert_eq!(relocation, RelocationSummary { moved: 2, failed: 1 });
                assert!(relocation.is_partial());
            }
            other => panic!("expected switch, got {other:?}"),
        }
        assert_eq!(ctl.current_output(), Category::Headset);

        let moves: Vec<_> = ctl
            .server()
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Move(..)))
            .collect();
        assert_eq!(moves.len(), 3);
    }

    #[tokio::test]
    async fn test_unavailable_server_degrades_to_no_data() {
        let server = MockAudioServer::with_sinks(&["Bluetooth Headset WH-1000"]).unavailable();
        let mut ctl = controller(server);

        assert_eq!(
            ctl.switch_to(Category::Headset).await,
            SwitchOutcome::NoMatchingDevice {
                category: Category::Headset
            }
        );
        assert_eq!(
            ctl.switch_to(Category::Speaker).await,
            SwitchOutcome::NoMatchingDevice {
                category: Category::Speaker
            }
        );
        assert_eq!(ctl.refresh().await, Category::Speaker);

        let snapshot = ctl.snapshot().await;
        assert!(snapshot.sinks.is_empty());
        assert_eq!(snapshot.default_sink, None);
    }

    #[tokio::test]
    async fn test_refresh_classifies_default_sink() {
        let server = MockAudioServer::with_sinks(&[]).default_sink("bluez_output.headset.1");
        let mut ctl = controller(server);

        // "bluez" is not a headset keyword; only "headset" in the name matches
        assert_eq!(ctl.refresh().await, Category::Headset);

        *ctl.server().default_sink.lock().unwrap() = Some("Virtual Null Sink".to_string());
        assert_eq!(ctl.refresh().await, Category::Unknown);

        // Anything but speaker toggles back to speaker
        assert_eq!(ctl.current_output().toggled(), Category::Speaker);
    }

    #[tokio::test]
    async fn test_refresh_without_default_keeps_state() {
        let mut ctl = controller(MockAudioServer::with_sinks(&[]));
        ctl.current_output = Category::Headset;
        assert_eq!(ctl.refresh().await, Category::Headset);
    }

    #[tokio::test]
    async fn test_reload_keywords_changes_classification() {
        let server = MockAudioServer::with_sinks(&["Virtual Null Sink"]);
        let mut ctl = controller(server);
        assert_eq!(
            ctl.switch_to(Category::Headset).await.category(),
            Category::Headset
        );

        ctl.reload_keywords(Keywords::new(["null"], ["usb"]));
        assert_eq!(
            ctl.switch_to(Category::Headset).await,
            SwitchOutcome::NoMatchingDevice {
                category: Category::Headset
            }
        );
    }

    #[tokio::test]
    async fn test_switched_description_prefers_friendly_name() {
        let server = MockAudioServer::with_sinks(&["alsa_output.usb-Sony_WH-1000XM4.analog-stereo"]);
        server.descriptions.lock().unwrap().insert(
            "alsa_output.usb-Sony_WH-1000XM4.analog-stereo".to_string(),
            "WH-1000XM4".to_string(),
        );
        let mut ctl = controller(server);

        match ctl.switch_to(Category::Headset).await {
            SwitchOutcome::Switched { description, .. } => assert_eq!(description, "WH-1000XM4"),
            other => panic!("expected switch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_snapshot_marks_default_and_categories() {
        let server =
            MockAudioServer::with_sinks(&["HD-Audio Generic Analog", "Bluetooth Headset WH-1000"])
                .default_sink("HD-Audio Generic Analog");
        let ctl = controller(server);

        let snapshot = ctl.snapshot().await;

        assert_eq!(snapshot.default_sink.as_deref(), Some("HD-Audio Generic Analog"));
        assert_eq!(snapshot.sinks.len(), 2);
        assert_eq!(snapshot.sinks[0].category, Category::Speaker);
        assert!(snapshot.sinks[0].is_default);
        assert_eq!(snapshot.sinks[1].category, Category::Headset);
        assert!(!snapshot.sinks[1].is_default);
        assert_eq!(snapshot.sinks[1].label, "module-test.c");
    }

    #[test]
    fn test_label_falls_back_to_name() {
        let sink = SinkRecord {
            id: "1".to_string(),
            name: "null.sink".to_string(),
            description: String::new(),
        };
        assert_eq!(label_for(&sink, &HashMap::new()), "null.sink");
    }

    #[test]
    fn test_outcome_json_shape() {
        let outcome = SwitchOutcome::NoMatchingDevice {
            category: Category::Headset,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["result"], "no_matching_device");
        assert_eq!(json["category"], "headset");
    }
}
