//! Zone operations.

use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};

/// A zone observed on the tracked page. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    /// External zone id
    pub id: i64,
    /// Display name
    pub name: String,
}

/// Create a new zone record.
///
/// # Errors
/// Returns `sqlx::Error` if the insert fails.
pub async fn create_zone(pool: &Pool<Sqlite>, id: i64, name: String) -> Result<Zone, sqlx::Error> {
    sqlx::query("INSERT INTO zones (id, name) VALUES (?, ?)")
        .bind(id)
        .bind(&name)
        .execute(pool)
        .await?;

    Ok(Zone { id, name })
}

/// Get all known zones.
///
/// # Errors
/// Returns `sqlx::Error` if the query fails.
pub async fn get_all(pool: &Pool<Sqlite>) -> Result<Vec<Zone>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (i64, String)>("SELECT id, name FROM zones")
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(|(id, name)| Zone { id, name }).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    #[tokio::test]
    async fn test_create_and_get_zones() {
        let db = Database::new(":memory:").await.expect("create database");
        db.run_migrations().await.expect("run migrations");

        create_zone(db.pool(), 7558, "Highmountain".to_string())
            .await
            .expect("create zone");

        let zones = get_all(db.pool()).await.expect("get zones");
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].id, 7558);
    }
}
