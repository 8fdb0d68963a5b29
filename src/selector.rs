//! Output selection
//!
//! Picks the sink to make default for a target category. The fallback policy is
//! asymmetric:
//! - Speaker: any sink is an acceptable default output
//! - Headset: never fall back to a sink that matches speaker keywords

use crate::classify::{Category, Keywords, classify};
use crate::inventory::SinkRecord;

/// A selected sink and whether it came from a fallback path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection<'a> {
    pub sink: &'a SinkRecord,
    /// True when no sink matched the target category exactly
    pub fallback: bool,
}

/// Select a sink for `target` from the inventory, first match in listing order
///
/// Returns `None` when nothing is eligible; callers report this to the user
/// and do not retry.
#[must_use]
pub fn select<'a>(
    inventory: &'a [SinkRecord],
    target: Category,
    keywords: &Keywords,
) -> Option<Selection<'a>> {
    if let Some(sink) = inventory.iter().find(|s| classify(s, keywords) == target) {
        return Some(Selection {
            sink,
            fallback: false,
        });
    }

    let fallback = match target {
        Category::Speaker => inventory.first(),
        Category::Headset => inventory
            .iter()
            .find(|s| classify(s, keywords) != Category::Speaker),
        Category::Unknown => None,
    };

    fallback.map(|sink| Selection {
        sink,
        fallback: true,
    })
}
