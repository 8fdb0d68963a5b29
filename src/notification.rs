//! Desktop notifications
//!
//! Sends switch results via notify-rust using `FreeDesktop` standard icon names.

use color_eyre::eyre::{Context, Result};
use notify_rust::Notification;

use crate::classify::Category;
use crate::controller::SwitchOutcome;

/// Send a desktop notification
///
/// # Errors
/// Returns an error if the notification cannot be sent (e.g., no notification daemon running).
pub fn send_notification(summary: &str, body: &str, icon: Option<&str>) -> Result<()> {
    let icon = icon.unwrap_or("audio-card");

    Notification::new()
        .summary(summary)
        .body(body)
        .appname("Audio Toggle")
        .icon(icon)
        .timeout(3000)
        .show()
        .context("Failed to show notification")?;

    Ok(())
}

/// Icon for an output category
#[must_use]
pub fn category_icon(category: Category) -> &'static str {
    match category {
        Category::Headset => "audio-headphones",
        Category::Speaker | Category::Unknown => "audio-speakers",
    }
}

/// User-facing message for a switch result
#[must_use]
pub fn outcome_message(outcome: &SwitchOutcome) -> String {
    match outcome {
        SwitchOutcome::Switched {
            category,
            fallback,
            description,
            ..
        } => match (category, fallback) {
            (Category::Speaker, false) => "Switched to Speakers/Built-in".to_string(),
            (Category::Speaker, true) => "Switched to default audio output".to_string(),
            (Category::Headset, false) => "Switched to Headset/Headphones".to_string(),
            (Category::Headset, true) => "Switched to external audio device".to_string(),
            (Category::Unknown, _) => format!("Switched to {description}"),
        },
        SwitchOutcome::NoMatchingDevice { category } => match category {
            Category::Headset => "No headset/headphone device found".to_string(),
            Category::Speaker | Category::Unknown => "No audio output device found".to_string(),
        },
        SwitchOutcome::DefaultSinkRejected { sink, .. } => {
            format!("Could not switch to {}", sink.name)
        }
    }
}

/// Notify the user about a switch result
///
/// # Errors
/// Returns an error if the notification cannot be sent.
pub fn notify_outcome(outcome: &SwitchOutcome) -> Result<()> {
    let body = match outcome {
        SwitchOutcome::Switched { description, .. } => {
            format!("{}\n{description}", outcome_message(outcome))
        }
        _ => outcome_message(outcome),
    };
    let icon = match outcome {
        SwitchOutcome::Switched { category, .. } => category_icon(*category),
        _ => "dialog-information",
    };
    send_notification("Audio Toggle", &body, Some(icon))
}
