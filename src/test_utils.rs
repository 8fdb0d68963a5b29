#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::audio::{AudioError, AudioServer};
use crate::inventory::StreamRecord;

/// Collaborator call recorded by [`MockAudioServer`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    ListSinks,
    ListStreams,
    SetDefault(String),
    Move(String, String),
    DefaultSinkName,
    Descriptions,
}

/// Scripted in-memory audio server
///
/// Holds a short sink listing, the playing streams and the default sink, and
/// records every call in order. `set_default_sink` updates the default.
#[derive(Default)]
pub(crate) struct MockAudioServer {
    pub sinks: Mutex<String>,
    pub streams: Mutex<Vec<StreamRecord>>,
    pub default_sink: Mutex<Option<String>>,
    pub descriptions: Mutex<HashMap<String, String>>,
    /// Simulate the server being unreachable for every call
    pub unavailable: bool,
    /// Reject set-default calls
    pub reject_default: bool,
    /// Fail the stream listing while everything else works
    pub fail_list_streams: bool,
    /// Stream ids whose move fails
    pub failing_streams: HashSet<String>,
    pub calls: Mutex<Vec<Call>>,
}

impl MockAudioServer {
    /// Server listing the given sink names with sequential ids
    pub fn with_sinks(names: &[&str]) -> Self {
        let listing = names
            .iter()
            .enumerate()
            .map(|(i, name)| format!("{i}\t{name}\tmodule-test.c\ts16le 2ch 48000Hz\tIDLE"))
            .collect::<Vec<_>>()
            .join("\n");
        Self {
            sinks: Mutex::new(listing),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn streams(self, ids: &[&str]) -> Self {
        *self.streams.lock().unwrap() = ids
            .iter()
            .map(|id| StreamRecord { id: (*id).to_string() })
            .collect();
        self
    }

    #[must_use]
    pub fn default_sink(self, name: &str) -> Self {
        *self.default_sink.lock().unwrap() = Some(name.to_string());
        self
    }

    #[must_use]
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) -> Result<(), AudioError> {
        self.calls.lock().unwrap().push(call);
        if self.unavailable {
            return Err(AudioError::Spawn {
                program: "pactl".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "mock unavailable"),
            });
        }
        Ok(())
    }
}

impl AudioServer for MockAudioServer {
    async fn list_sinks(&self) -> Result<String, AudioError> {
        self.record(Call::ListSinks)?;
        Ok(self.sinks.lock().unwrap().clone())
    }

    async fn list_streams(&self) -> Result<Vec<StreamRecord>, AudioError> {
        self.record(Call::ListStreams)?;
        if self.fail_list_streams {
            return Err(AudioError::Timeout {
                command: "pactl list short sink-inputs".to_string(),
                timeout_ms: 5000,
            });
        }
        Ok(self.streams.lock().unwrap().clone())
    }

    async fn set_default_sink(&self, sink_name: &str) -> Result<(), AudioError> {
        self.record(Call::SetDefault(sink_name.to_string()))?;
        if self.reject_default {
            return Err(AudioError::CommandFailed {
                command: format!("pactl set-default-sink {sink_name}"),
                stderr: "Failure: No such entity".to_string(),
            });
        }
        *self.default_sink.lock().unwrap() = Some(sink_name.to_string());
        Ok(())
    }

    async fn move_stream(&self, stream_id: &str, sink_name: &str) -> Result<(), AudioError> {
        self.record(Call::Move(stream_id.to_string(), sink_name.to_string()))?;
        if self.failing_streams.contains(stream_id) {
            return Err(AudioError::CommandFailed {
                command: format!("pactl move-sink-input {stream_id} {sink_name}"),
                stderr: "Failure: Invalid argument".to_string(),
            });
        }
        Ok(())
    }

    async fn default_sink_name(&self) -> Result<Option<String>, AudioError> {
        self.record(Call::DefaultSinkName)?;
        Ok(self.default_sink.lock().unwrap().clone())
    }

    async fn sink_descriptions(&self) -> Result<HashMap<String, String>, AudioError> {
        self.record(Call::Descriptions)?;
        Ok(self.descriptions.lock().unwrap().clone())
    }
}
