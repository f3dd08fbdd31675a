//! Watch-list types shared across the questwatch crates.
//!
//! Quest, item, faction, and zone ids are the externally meaningful
//! integers carried by the scanned page, so they stay plain `i64` values
//! throughout; the watch list wraps the configured id-to-name mapping.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single watched quest as it appears in the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchedQuest {
    /// External quest id
    pub id: i64,
    /// Display name used when the quest is not yet in the store
    pub name: String,
}

/// The fixed set of quest ids whose new instances trigger an alert.
#[derive(Debug, Clone, Default)]
pub struct WatchList {
    entries: HashMap<i64, String>,
}

impl WatchList {
    /// Build a watch list from configured entries.
    #[must_use]
    pub fn new(entries: &[WatchedQuest]) -> Self {
        Self {
            entries: entries
                .iter()
                .map(|w| (w.id, w.name.clone()))
                .collect(),
        }
    }

    /// Whether the given quest id is watched.
    #[must_use]
    pub fn contains(&self, quest_id: i64) -> bool {
        self.entries.contains_key(&quest_id)
    }

    /// Configured display name for a watched quest id.
    #[must_use]
    pub fn name(&self, quest_id: i64) -> Option<&str> {
        self.entries.get(&quest_id).map(String::as_str)
    }

    /// Number of watched quests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the watch list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
