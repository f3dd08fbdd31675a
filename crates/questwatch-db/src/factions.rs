//! Faction operations.

use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};

/// A faction observed on the tracked page. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faction {
    /// External faction id
    pub id: i64,
    /// Display name
    pub name: String,
}

/// Create a new faction record.
///
/// # Errors
/// Returns `sqlx::Error` if the insert fails.
pub async fn create_faction(
    pool: &Pool<Sqlite>,
    id: i64,
    name: String,
) -> Result<Faction, sqlx::Error> {
    sqlx::query("INSERT INTO factions (id, name) VALUES (?, ?)")
        .bind(id)
        .bind(&name)
        .execute(pool)
        .await?;

    Ok(Faction { id, name })
}

/// Get all known factions.
///
/// # Errors
/// Returns `sqlx::Error` if the query fails.
pub async fn get_all(pool: &Pool<Sqlite>) -> Result<Vec<Faction>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (i64, String)>("SELECT id, name FROM factions")
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(|(id, name)| Faction { id, name }).collect())
}
