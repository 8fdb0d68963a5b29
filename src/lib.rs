//! Audio Toggle
//!
//! Switches the default audio output between speakers and a headset and moves
//! playing streams along. Talks to PulseAudio or PipeWire through `pactl`.
//!
//! # Layout
//! - [`inventory`], [`classify`], [`selector`], [`relocate`]: pure building blocks
//! - [`controller`]: sequences one switch and remembers the current output
//! - [`audio`]: the audio server capability and its `pactl` implementation
//! - [`daemon`], [`ipc`], [`commands`], [`cli`]: process surfaces

pub mod audio;
pub mod classify;
pub mod cli;
pub mod commands;
pub mod config;
pub mod controller;
pub mod daemon;
pub mod inventory;
pub mod ipc;
pub mod notification;
pub mod relocate;
pub mod selector;
pub mod style;

#[cfg(test)]
mod test_utils;

// Re-export commonly used types for convenience
pub use classify::Category;
pub use config::Config;
pub use controller::{SwitchController, SwitchOutcome};
