//! Stream relocation
//!
//! Moves every in-flight playback stream to a newly selected sink. Each stream
//! gets exactly one move attempt; one failure never aborts the rest.

use serde::{Deserialize, Serialize};
use std::future::Future;
use tracing::{debug, warn};

use crate::inventory::{SinkRecord, StreamRecord};

/// Counts of a relocation batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelocationSummary {
    pub moved: usize,
    pub failed: usize,
}

impl RelocationSummary {
    /// Some moves succeeded or were attempted, but at least one failed
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.failed > 0
    }

    #[must_use]
    pub fn attempted(&self) -> usize {
        self.moved + self.failed
    }
}

/// Move every stream to `target`, dispatching all moves concurrently
///
/// `move_fn` receives `(stream_id, sink_name)`.
pub async fn relocate<F, Fut, E>(
    streams: &[StreamRecord],
    target: &SinkRecord,
    move_fn: F,
) -> RelocationSummary
where
    F: Fn(String, String) -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: std::fmt::Display,
{
    let moves = streams.iter().map(|stream| {
        let attempt = move_fn(stream.id.clone(), target.name.clone());
        async move { (stream, attempt.await) }
    });

    let mut summary = RelocationSummary::default();
    for (stream, result) in futures_util::future::join_all(moves).await {
        match result {
            Ok(()) => {
                debug!("Moved stream {} to {}", stream.id, target.name);
                summary.moved += 1;
            }
            Err(e) => {
                warn!("Could not move stream {} to {}: {}", stream.id, target.name, e);
                summary.failed += 1;
            }
        }
    }

    summary
}
