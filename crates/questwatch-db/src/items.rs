//! Item operations.
//!
//! Items are immutable once created; the tracker creates them lazily on
//! first sighting and only ever reads them back.

use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};

/// A game item observed on the tracked page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// External item id
    pub id: i64,
    /// Display name
    pub name: String,
    /// Quality tier code
    pub quality: i64,
    /// Icon identifier
    pub icon: String,
}

/// Create a new item record.
///
/// # Errors
/// Returns `sqlx::Error` if the insert fails (including an id collision).
pub async fn create_item(
    pool: &Pool<Sqlite>,
    id: i64,
    name: String,
    quality: i64,
    icon: String,
) -> Result<Item, sqlx::Error> {
    sqlx::query("INSERT INTO items (id, name, quality, icon) VALUES (?, ?, ?, ?)")
        .bind(id)
        .bind(&name)
        .bind(quality)
        .bind(&icon)
        .execute(pool)
        .await?;

    Ok(Item {
        id,
        name,
        quality,
        icon,
    })
}

/// Get all known items.
///
/// # Errors
/// Returns `sqlx::Error` if the query fails.
pub async fn get_all(pool: &Pool<Sqlite>) -> Result<Vec<Item>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (i64, String, i64, String)>(
        "SELECT id, name, quality, icon FROM items",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, name, quality, icon)| Item {
            id,
            name,
            quality,
            icon,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    #[tokio::test]
    async fn test_create_and_get_items() {
        let db = Database::new(":memory:").await.expect("create database");
        db.run_migrations().await.expect("run migrations");

        let item = create_item(
            db.pool(),
            141_265,
            "Vantus Rune".to_string(),
            1,
            "inv_misc".to_string(),
        )
        .await
        .expect("create item");
        assert_eq!(item.id, 141_265);

        let items = get_all(db.pool()).await.expect("get items");
        assert_eq!(items, vec![item]);
    }

    #[tokio::test]
    async fn test_duplicate_id_is_rejected() {
        let db = Database::new(":memory:").await.expect("create database");
        db.run_migrations().await.expect("run migrations");

        create_item(db.pool(), 7, "First".to_string(), 1, "a".to_string())
            .await
            .expect("create item");
        let dup = create_item(db.pool(), 7, "Second".to_string(), 1, "b".to_string()).await;
        assert!(dup.is_err());
    }
}
