//! Entity classifier - decides what a decoded record block represents.

use serde_json::{Map, Value};

/// Field carried only by item records (equipment stats).
pub const ITEM_STATS_FIELD: &str = "jsonequip";
/// Required-class field carried by quest records.
pub const REQUIRED_CLASS_FIELD: &str = "reqclass";
/// Required-race field carried by quest records.
pub const REQUIRED_RACE_FIELD: &str = "reqrace";
/// Display-name field; a record with nothing else is a faction.
pub const DISPLAY_NAME_FIELD: &str = "name_enus";

/// The kind of domain object a decoded block represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classified {
    /// Equipment record
    Item,
    /// Quest definition record
    Quest,
    /// Faction record
    Faction,
    /// None of the known signatures; silently skipped by callers
    Unknown,
}

/// Classify a decoded block by its field signature.
///
/// Rules are evaluated in order and the first match wins; the order is part
/// of the contract, since a quest record also carries a display name.
#[must_use]
pub fn classify(block: &Map<String, Value>) -> Classified {
    if block.contains_key(ITEM_STATS_FIELD) {
        return Classified::Item;
    }
    if block.contains_key(REQUIRED_CLASS_FIELD) && block.contains_key(REQUIRED_RACE_FIELD) {
        return Classified::Quest;
    }
    if block.len() == 1 && block.contains_key(DISPLAY_NAME_FIELD) {
        return Classified::Faction;
    }
    Classified::Unknown
}
