//! Quest instance operations.
//!
//! An instance is one time-bounded occurrence of a quest being active.
//! Expired instances stay in the store as history; the engine only stops
//! tracking them in memory.

use crate::parse_timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::{Pool, Sqlite};

/// One active occurrence of a quest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestInstance {
    /// Store row id (instances have no external id of their own)
    pub id: i64,
    /// Owning quest id
    pub quest_id: i64,
    /// When this occurrence stops being active
    pub ending: DateTime<Utc>,
    /// Reward payload; always `[]` today, kept for the page's future shape
    pub rewards: JsonValue,
}

/// Create a new quest instance.
///
/// # Errors
/// Returns `sqlx::Error` if the insert fails.
pub async fn create_instance(
    pool: &Pool<Sqlite>,
    quest_id: i64,
    ending: DateTime<Utc>,
) -> Result<QuestInstance, sqlx::Error> {
    let rewards = JsonValue::Array(Vec::new());

    let result = sqlx::query("INSERT INTO quest_instances (quest_id, ending, rewards) VALUES (?, ?, ?)")
        .bind(quest_id)
        .bind(ending.to_rfc3339())
        .bind(rewards.to_string())
        .execute(pool)
        .await?;

    Ok(QuestInstance {
        id: result.last_insert_rowid(),
        quest_id,
        ending,
        rewards,
    })
}

/// Get all instances still active after the given cutoff.
///
/// # Errors
/// Returns `sqlx::Error` if the query fails or a stored row is malformed.
pub async fn get_active(
    pool: &Pool<Sqlite>,
    ending_after: DateTime<Utc>,
) -> Result<Vec<QuestInstance>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (i64, i64, String, String)>(
        "SELECT id, quest_id, ending, rewards FROM quest_instances WHERE ending > ?",
    )
    .bind(ending_after.to_rfc3339())
    .fetch_all(pool)
    .await?;

    let mut instances = Vec::with_capacity(rows.len());
    for (id, quest_id, ending, rewards) in rows {
        instances.push(QuestInstance {
            id,
            quest_id,
            ending: parse_timestamp("ending", &ending)?,
            rewards: serde_json::from_str(&rewards).unwrap_or(JsonValue::Null),
        });
    }

    Ok(instances)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quests::create_quest;
    use crate::Database;

    async fn db_with_quest(quest_id: i64) -> Database {
        let db = Database::new(":memory:").await.expect("create database");
        db.run_migrations().await.expect("run migrations");
        create_quest(db.pool(), quest_id, format!("Quest {quest_id}"))
            .await
            .expect("create quest");
        db
    }

    #[tokio::test]
    async fn test_create_and_query_active() {
        let db = db_with_quest(41896).await;

        let now = Utc::now();
        let ending = now + chrono::Duration::hours(6);
        let instance = create_instance(db.pool(), 41896, ending)
            .await
            .expect("create instance");
        assert_eq!(instance.quest_id, 41896);
        assert_eq!(instance.rewards, JsonValue::Array(Vec::new()));

        let active = get_active(db.pool(), now).await.expect("query active");
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].quest_id, 41896);
    }

    #[tokio::test]
    async fn test_expired_instances_are_not_returned() {
        let db = db_with_quest(42023).await;

        let now = Utc::now();
        create_instance(db.pool(), 42023, now - chrono::Duration::hours(1))
            .await
            .expect("create expired instance");

        let active = get_active(db.pool(), now).await.expect("query active");
        assert!(active.is_empty());
    }

    #[tokio::test]
    async fn test_expired_instances_stay_in_store() {
        let db = db_with_quest(41013).await;

        let now = Utc::now();
        create_instance(db.pool(), 41013, now - chrono::Duration::hours(1))
            .await
            .expect("create expired instance");

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quest_instances")
            .fetch_one(db.pool())
            .await
            .expect("count instances");
        assert_eq!(total, 1);
    }
}
