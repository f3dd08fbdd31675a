//! In-memory entity indexes seeded from the persistent store.

use chrono::{DateTime, Utc};
use questwatch_db::{factions, instances, items, quests, zones};
use questwatch_db::{Database, DatabaseError, Faction, Item, Quest, QuestInstance, Zone};
use std::collections::HashMap;

/// The reconciliation engine's working state.
///
/// Owned by one component for the lifetime of the process; the store is
/// the system of record and seeds this at startup via [`TrackerState::load`].
/// `active` is keyed by owning quest id, which is what enforces the
/// at-most-one-tracked-instance-per-quest invariant.
#[derive(Debug, Default)]
pub struct TrackerState {
    /// Known items by id
    pub items: HashMap<i64, Item>,
    /// Known quests by id
    pub quests: HashMap<i64, Quest>,
    /// Known factions by id
    pub factions: HashMap<i64, Faction>,
    /// Known zones by id
    pub zones: HashMap<i64, Zone>,
    /// Tracked active instances by owning quest id
    pub active: HashMap<i64, QuestInstance>,
}

impl TrackerState {
    /// Seed the indexes from the persistent store.
    ///
    /// Instances are only tracked if still active relative to `now`.
    ///
    /// # Errors
    /// Returns `DatabaseError` if any seed query fails.
    pub async fn load(db: &Database, now: DateTime<Utc>) -> Result<Self, DatabaseError> {
        let pool = db.pool();

        let items = items::get_all(pool)
            .await?
            .into_iter()
            .map(|item| (item.id, item))
            .collect::<HashMap<_, _>>();
        let quests = quests::get_all(pool)
            .await?
            .into_iter()
            .map(|quest| (quest.id, quest))
            .collect::<HashMap<_, _>>();
        let factions = factions::get_all(pool)
            .await?
            .into_iter()
            .map(|faction| (faction.id, faction))
            .collect::<HashMap<_, _>>();
        let zones = zones::get_all(pool)
            .await?
            .into_iter()
            .map(|zone| (zone.id, zone))
            .collect::<HashMap<_, _>>();
        let active = instances::get_active(pool, now)
            .await?
            .into_iter()
            .map(|instance| (instance.quest_id, instance))
            .collect::<HashMap<_, _>>();

        tracing::info!(
            items = items.len(),
            quests = quests.len(),
            factions = factions.len(),
            zones = zones.len(),
            active = active.len(),
            "Seeded tracker state from store"
        );

        Ok(Self {
            items,
            quests,
            factions,
            zones,
            active,
        })
    }

    /// Drop every tracked instance whose ending is not in the future.
    ///
    /// Returns the number of instances untracked. The persistent rows are
    /// left in place as history.
    pub fn expire_instances(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.active.len();
        self.active.retain(|_, instance| instance.ending > now);
        before - self.active.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value as JsonValue;

    fn instance(quest_id: i64, ending: DateTime<Utc>) -> QuestInstance {
        QuestInstance {
            id: quest_id,
            quest_id,
            ending,
            rewards: JsonValue::Array(Vec::new()),
        }
    }

    #[test]
    fn test_expire_drops_past_and_keeps_future() {
        let now = Utc::now();
        let mut state = TrackerState::default();
        state
            .active
            .insert(1, instance(1, now - chrono::Duration::minutes(1)));
        state.active.insert(2, instance(2, now)); // boundary: not in the future
        state
            .active
            .insert(3, instance(3, now + chrono::Duration::hours(6)));

        let expired = state.expire_instances(now);

        assert_eq!(expired, 2);
        assert!(!state.active.contains_key(&1));
        assert!(!state.active.contains_key(&2));
        assert!(state.active.contains_key(&3));
    }

    #[tokio::test]
    async fn test_load_from_empty_store() {
        let db = Database::new(":memory:").await.expect("create database");
        db.run_migrations().await.expect("run migrations");

        let state = TrackerState::load(&db, Utc::now()).await.expect("load state");
        assert!(state.items.is_empty());
        assert!(state.quests.is_empty());
        assert!(state.active.is_empty());
    }

    #[tokio::test]
    async fn test_load_tracks_only_active_instances() {
        let db = Database::new(":memory:").await.expect("create database");
        db.run_migrations().await.expect("run migrations");
        let now = Utc::now();

        questwatch_db::quests::create_quest(db.pool(), 1, "Past".to_string())
            .await
            .expect("create quest");
        questwatch_db::quests::create_quest(db.pool(), 2, "Future".to_string())
            .await
            .expect("create quest");
        instances::create_instance(db.pool(), 1, now - chrono::Duration::hours(1))
            .await
            .expect("create expired");
        instances::create_instance(db.pool(), 2, now + chrono::Duration::hours(1))
            .await
            .expect("create active");

        let state = TrackerState::load(&db, now).await.expect("load state");
        assert_eq!(state.quests.len(), 2);
        assert_eq!(state.active.len(), 1);
        assert!(state.active.contains_key(&2));
    }
}
