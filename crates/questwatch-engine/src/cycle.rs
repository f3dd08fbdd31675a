//! The per-cycle reconciliation algorithm.
//!
//! One cycle merges a freshly fetched page into the tracker state and the
//! persistent store: expire, discover zones, discover base entities,
//! process the quest listing, report the delta. Each step is idempotent,
//! so re-running a cycle over an unchanged page creates nothing.

use crate::error::{CycleError, Result};
use crate::state::TrackerState;
use chrono::{DateTime, Utc};
use futures::stream::{FuturesUnordered, StreamExt};
use questwatch_db::quests::QuestInit;
use questwatch_db::{factions, instances, items, quests, zones, Database, QuestInstance};
use questwatch_extract::{anchors, classify, parse, Anchor, Classified};
use serde_json::{Map, Value};
use sqlx::{Pool, Sqlite};
use std::collections::{HashMap, HashSet};

/// Concurrency limit for listing-entry processing against the store.
pub const MAX_CONCURRENT_ENTRIES: usize = 5;

/// What one reconciliation cycle did.
///
/// `soft_errors` carries every non-fatal failure the cycle absorbed, so
/// partial-failure containment is observable by callers and tests; each
/// one has already been logged when it was recorded.
#[derive(Debug, Default)]
pub struct CycleOutcome {
    /// Quest ids that got a new instance this cycle, ascending
    pub new_quest_ids: Vec<i64>,
    /// Tracked instances dropped because their ending had passed
    pub instances_expired: usize,
    /// Newly created zones
    pub zones_created: usize,
    /// Newly created items
    pub items_created: usize,
    /// Newly created quests
    pub quests_created: usize,
    /// Newly created factions
    pub factions_created: usize,
    /// Record anchors skipped because their block did not decode to an object
    pub records_skipped: usize,
    /// Non-fatal failures absorbed by this cycle
    pub soft_errors: Vec<String>,
}

impl CycleOutcome {
    fn soft_error(&mut self, message: String) {
        tracing::warn!("{}", message);
        self.soft_errors.push(message);
    }
}

/// Work distilled from one listing entry during the sequential pre-pass.
#[derive(Debug)]
struct EntryWork {
    quest_id: i64,
    ending: DateTime<Utc>,
    init: Option<QuestInit>,
}

/// Run one reconciliation cycle over already-fetched page text.
///
/// Mutates `state` and the store. Individual records and listing entries
/// fail softly; only a missing or malformed quest listing aborts the
/// cycle.
pub async fn reconcile(
    state: &mut TrackerState,
    db: &Database,
    page: &str,
    now: DateTime<Utc>,
) -> Result<CycleOutcome> {
    let mut outcome = CycleOutcome::default();

    // 1. Expire
    outcome.instances_expired = state.expire_instances(now);
    if outcome.instances_expired > 0 {
        tracing::info!("Untracked {} expired quest instances", outcome.instances_expired);
    }

    // 2 + 3. Discover zones and base entities. The listing span is only
    // stashed here; it is processed after every entity it may reference
    // has had its chance to be created.
    let mut listing_span = None;
    for anchor in anchors(page) {
        match anchor {
            Anchor::Zone { id, name } => {
                discover_zone(state, db.pool(), &mut outcome, id, name).await;
            }
            Anchor::Record { id, span } => {
                discover_record(state, db.pool(), &mut outcome, id, span).await;
            }
            Anchor::Listing { span } => listing_span = Some(span),
        }
    }

    // 4. Process the quest listing
    let listing_span = listing_span.ok_or(CycleError::ListingNotFound)?;
    let listing = parse(listing_span)?;
    let entries = listing
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| CycleError::ListingFormat("no data array in listing block".to_string()))?;

    let work = plan_entries(state, &mut outcome, entries);
    instantiate_entries(state, db.pool(), &mut outcome, work).await;

    outcome.new_quest_ids.sort_unstable();
    Ok(outcome)
}

async fn discover_zone(
    state: &mut TrackerState,
    pool: &Pool<Sqlite>,
    outcome: &mut CycleOutcome,
    id: i64,
    name: &str,
) {
    if state.zones.contains_key(&id) {
        return;
    }
    tracing::debug!("Creating Zone: {} - {}", id, name);
    match zones::create_zone(pool, id, name.to_string()).await {
        Ok(zone) => {
            state.zones.insert(id, zone);
            outcome.zones_created += 1;
        }
        Err(e) => outcome.soft_error(format!("failed to create zone {id}: {e}")),
    }
}

async fn discover_record(
    state: &mut TrackerState,
    pool: &Pool<Sqlite>,
    outcome: &mut CycleOutcome,
    id: i64,
    span: &str,
) {
    // The page carries record kinds this tracker does not model; a block
    // that fails to decode or classify is skipped, never an error.
    let block = match parse(span) {
        Ok(Value::Object(block)) => block,
        Ok(_) => {
            tracing::debug!("Skipping record {}: not an object", id);
            outcome.records_skipped += 1;
            return;
        }
        Err(e) => {
            tracing::debug!("Skipping record {}: {}", id, e);
            outcome.records_skipped += 1;
            return;
        }
    };

    match classify(&block) {
        Classified::Item => {
            if state.items.contains_key(&id) {
                return;
            }
            let name = display_name(&block);
            tracing::debug!("Creating Item: {} - {}", id, name);
            let quality = block.get("quality").and_then(Value::as_i64).unwrap_or(0);
            let icon = block
                .get("icon")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            match items::create_item(pool, id, name, quality, icon).await {
                Ok(item) => {
                    state.items.insert(id, item);
                    outcome.items_created += 1;
                }
                Err(e) => outcome.soft_error(format!("failed to create item {id}: {e}")),
            }
        }
        Classified::Quest => {
            if state.quests.contains_key(&id) {
                return;
            }
            let name = display_name(&block);
            tracing::debug!("Creating Quest: {} - {}", id, name);
            match quests::create_quest(pool, id, name).await {
                Ok(quest) => {
                    state.quests.insert(id, quest);
                    outcome.quests_created += 1;
                }
                Err(e) => outcome.soft_error(format!("failed to create quest {id}: {e}")),
            }
        }
        Classified::Faction => {
            if state.factions.contains_key(&id) {
                return;
            }
            let name = display_name(&block);
            tracing::debug!("Creating Faction: {} - {}", id, name);
            match factions::create_faction(pool, id, name).await {
                Ok(faction) => {
                    state.factions.insert(id, faction);
                    outcome.factions_created += 1;
                }
                Err(e) => outcome.soft_error(format!("failed to create faction {id}: {e}")),
            }
        }
        Classified::Unknown => {}
    }
}

fn display_name(block: &Map<String, Value>) -> String {
    block
        .get(questwatch_extract::classify::DISPLAY_NAME_FIELD)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Sequential pre-pass over the listing entries.
///
/// Resolves every entry against the indexes while nothing is mutating
/// them: unknown quests are soft errors, already-tracked quests (and
/// duplicate entries) are silently skipped, and the one-shot
/// initialization payload is built for quests still at the sentinel type.
fn plan_entries(
    state: &TrackerState,
    outcome: &mut CycleOutcome,
    entries: &[Value],
) -> Vec<EntryWork> {
    let mut work = Vec::new();
    let mut claimed: HashSet<i64> = HashSet::new();

    for entry in entries {
        let Some(quest_id) = entry.get("id").and_then(Value::as_i64) else {
            outcome.soft_error("listing entry without a usable id".to_string());
            continue;
        };
        let Some(ending) = parse_ending(entry.get("ending")) else {
            outcome.soft_error(format!("listing entry {quest_id} without a usable ending"));
            continue;
        };
        let Some(quest) = state.quests.get(&quest_id) else {
            outcome.soft_error(format!("could not find quest with id {quest_id}"));
            continue;
        };
        if state.active.contains_key(&quest_id) || !claimed.insert(quest_id) {
            // Already tracked: repeat sightings must not duplicate instances.
            continue;
        }

        let init = if quest.is_unclassified() {
            match entry.get("worldquesttype").and_then(Value::as_i64) {
                Some(quest_type) => Some(QuestInit {
                    quest_type,
                    factions: resolve_relations(
                        entry.get("factions"),
                        &state.factions,
                        "faction",
                        quest_id,
                        outcome,
                    ),
                    zones: resolve_relations(
                        entry.get("zones"),
                        &state.zones,
                        "zone",
                        quest_id,
                        outcome,
                    ),
                }),
                None => {
                    outcome.soft_error(format!(
                        "listing entry {quest_id} without a worldquesttype"
                    ));
                    None
                }
            }
        } else {
            None
        };

        work.push(EntryWork {
            quest_id,
            ending,
            init,
        });
    }

    work
}

/// Resolve a relation id list against an index, keeping only known ids.
fn resolve_relations<V>(
    value: Option<&Value>,
    index: &HashMap<i64, V>,
    kind: &str,
    quest_id: i64,
    outcome: &mut CycleOutcome,
) -> Vec<i64> {
    let Some(ids) = value.and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut resolved = Vec::new();
    for id_value in ids {
        let Some(id) = id_value.as_i64() else {
            outcome.soft_error(format!(
                "quest {quest_id} references a non-numeric {kind} id"
            ));
            continue;
        };
        if index.contains_key(&id) {
            resolved.push(id);
        } else {
            outcome.soft_error(format!(
                "could not find {kind} with id {id} referenced by quest {quest_id}"
            ));
        }
    }
    resolved
}

/// Fan the planned entries out against the store, at most
/// [`MAX_CONCURRENT_ENTRIES`] in flight. Completions fold back into the
/// indexes here, on the single owner, in whatever order they land.
async fn instantiate_entries(
    state: &mut TrackerState,
    pool: &Pool<Sqlite>,
    outcome: &mut CycleOutcome,
    work: Vec<EntryWork>,
) {
    let mut in_flight = FuturesUnordered::new();

    for entry in work {
        in_flight.push(instantiate_entry(pool, entry));

        while in_flight.len() >= MAX_CONCURRENT_ENTRIES {
            if let Some(result) = in_flight.next().await {
                apply_completion(state, outcome, result);
            }
        }
    }

    while let Some(result) = in_flight.next().await {
        apply_completion(state, outcome, result);
    }
}

async fn instantiate_entry(
    pool: &Pool<Sqlite>,
    entry: EntryWork,
) -> std::result::Result<(QuestInstance, EntryWork), (i64, sqlx::Error)> {
    let instance = instances::create_instance(pool, entry.quest_id, entry.ending)
        .await
        .map_err(|e| (entry.quest_id, e))?;
    quests::update_quest(pool, entry.quest_id, entry.ending, entry.init.as_ref())
        .await
        .map_err(|e| (entry.quest_id, e))?;
    Ok((instance, entry))
}

fn apply_completion(
    state: &mut TrackerState,
    outcome: &mut CycleOutcome,
    result: std::result::Result<(QuestInstance, EntryWork), (i64, sqlx::Error)>,
) {
    match result {
        Ok((instance, entry)) => {
            let quest_id = entry.quest_id;
            tracing::debug!("Created QuestInstance for quest {}", quest_id);
            state.active.insert(quest_id, instance);
            if let Some(quest) = state.quests.get_mut(&quest_id) {
                quest.last_seen = entry.ending;
                if let Some(init) = entry.init {
                    quest.quest_type = init.quest_type;
                    quest.factions.extend(init.factions);
                    quest.zones.extend(init.zones);
                }
            }
            outcome.new_quest_ids.push(quest_id);
        }
        Err((quest_id, e)) => {
            outcome.soft_error(format!("failed to instantiate quest {quest_id}: {e}"));
        }
    }
}

/// Decode a listing `ending` value.
///
/// The page has shipped both Unix-epoch milliseconds and RFC 3339 strings
/// over time; accept either.
fn parse_ending(value: Option<&Value>) -> Option<DateTime<Utc>> {
    match value? {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_ending_rfc3339() {
        let ending = parse_ending(Some(&json!("2024-01-01T00:00:00Z"))).expect("parse string");
        assert_eq!(ending.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_parse_ending_epoch_millis() {
        let ending = parse_ending(Some(&json!(1_704_067_200_000_i64))).expect("parse millis");
        assert_eq!(ending.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_parse_ending_rejects_garbage() {
        assert!(parse_ending(None).is_none());
        assert!(parse_ending(Some(&json!("next tuesday"))).is_none());
        assert!(parse_ending(Some(&json!([1, 2]))).is_none());
    }
}
