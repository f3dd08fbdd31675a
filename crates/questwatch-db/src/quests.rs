//! Quest operations.
//!
//! Quests are created on first sighting with the sentinel type and an epoch
//! last-seen timestamp; the reconciliation engine updates `last_seen` on
//! every active sighting and fills in the type and relations exactly once,
//! at the first full sighting.

use crate::parse_timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};
use std::collections::{BTreeSet, HashMap};

/// Sentinel `quest_type` marking a quest that has not been classified yet.
pub const UNCLASSIFIED_TYPE: i64 = -1;

/// A quest definition plus its connected relations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quest {
    /// External quest id
    pub id: i64,
    /// Display name
    pub name: String,
    /// Most recent active sighting
    pub last_seen: DateTime<Utc>,
    /// Category code; [`UNCLASSIFIED_TYPE`] until the first full sighting
    pub quest_type: i64,
    /// Connected faction ids, populated once
    pub factions: BTreeSet<i64>,
    /// Connected zone ids, populated once
    pub zones: BTreeSet<i64>,
}

impl Quest {
    /// Whether this quest still awaits its one-shot initialization.
    #[must_use]
    pub fn is_unclassified(&self) -> bool {
        self.quest_type == UNCLASSIFIED_TYPE
    }
}

/// One-shot initialization payload for a quest's first full sighting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestInit {
    /// Real category code from the listing entry
    pub quest_type: i64,
    /// Resolvable faction ids referenced by the listing entry
    pub factions: Vec<i64>,
    /// Resolvable zone ids referenced by the listing entry
    pub zones: Vec<i64>,
}

/// Create a new quest record with the sentinel type and no relations.
///
/// # Errors
/// Returns `sqlx::Error` if the insert fails.
pub async fn create_quest(
    pool: &Pool<Sqlite>,
    id: i64,
    name: String,
) -> Result<Quest, sqlx::Error> {
    let last_seen = DateTime::<Utc>::UNIX_EPOCH;

    sqlx::query("INSERT INTO quests (id, name, last_seen, quest_type) VALUES (?, ?, ?, ?)")
        .bind(id)
        .bind(&name)
        .bind(last_seen.to_rfc3339())
        .bind(UNCLASSIFIED_TYPE)
        .execute(pool)
        .await?;

    Ok(Quest {
        id,
        name,
        last_seen,
        quest_type: UNCLASSIFIED_TYPE,
        factions: BTreeSet::new(),
        zones: BTreeSet::new(),
    })
}

/// Get all known quests with their connected relations.
///
/// # Errors
/// Returns `sqlx::Error` if a query fails or a stored timestamp is
/// malformed.
pub async fn get_all(pool: &Pool<Sqlite>) -> Result<Vec<Quest>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (i64, String, String, i64)>(
        "SELECT id, name, last_seen, quest_type FROM quests",
    )
    .fetch_all(pool)
    .await?;

    let mut quests = Vec::with_capacity(rows.len());
    let mut by_id: HashMap<i64, usize> = HashMap::with_capacity(rows.len());
    for (id, name, last_seen, quest_type) in rows {
        by_id.insert(id, quests.len());
        quests.push(Quest {
            id,
            name,
            last_seen: parse_timestamp("last_seen", &last_seen)?,
            quest_type,
            factions: BTreeSet::new(),
            zones: BTreeSet::new(),
        });
    }

    let faction_rows = sqlx::query_as::<_, (i64, i64)>(
        "SELECT quest_id, faction_id FROM quest_factions",
    )
    .fetch_all(pool)
    .await?;
    for (quest_id, faction_id) in faction_rows {
        if let Some(&idx) = by_id.get(&quest_id) {
            quests[idx].factions.insert(faction_id);
        }
    }

    let zone_rows =
        sqlx::query_as::<_, (i64, i64)>("SELECT quest_id, zone_id FROM quest_zones")
            .fetch_all(pool)
            .await?;
    for (quest_id, zone_id) in zone_rows {
        if let Some(&idx) = by_id.get(&quest_id) {
            quests[idx].zones.insert(zone_id);
        }
    }

    Ok(quests)
}

/// Update a quest's `last_seen`, optionally applying its one-shot
/// initialization (real type plus faction/zone connections).
///
/// # Errors
/// Returns `sqlx::Error` if any statement fails.
pub async fn update_quest(
    pool: &Pool<Sqlite>,
    id: i64,
    last_seen: DateTime<Utc>,
    init: Option<&QuestInit>,
) -> Result<(), sqlx::Error> {
    if let Some(init) = init {
        sqlx::query("UPDATE quests SET last_seen = ?, quest_type = ? WHERE id = ?")
            .bind(last_seen.to_rfc3339())
            .bind(init.quest_type)
            .bind(id)
            .execute(pool)
            .await?;

        for faction_id in &init.factions {
            sqlx::query(
                "INSERT OR IGNORE INTO quest_factions (quest_id, faction_id) VALUES (?, ?)",
            )
            .bind(id)
            .bind(faction_id)
            .execute(pool)
            .await?;
        }

        for zone_id in &init.zones {
            sqlx::query("INSERT OR IGNORE INTO quest_zones (quest_id, zone_id) VALUES (?, ?)")
                .bind(id)
                .bind(zone_id)
                .execute(pool)
                .await?;
        }
    } else {
        sqlx::query("UPDATE quests SET last_seen = ? WHERE id = ?")
            .bind(last_seen.to_rfc3339())
            .bind(id)
            .execute(pool)
            .await?;
    }

    Ok(())
}
