//! # Item Repository
//!
//! Catalog Store operations outside a unit of work: seeding, admin listing
//! and restocking. Catalog CRUD screens live in another service; this
//! covers what Kasir itself needs.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::ITEM_COLUMNS;
use kasir_core::{Item, NewItem};

/// Repository for item database operations.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    /// Creates a new ItemRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Gets an item by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Item>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1");

        let item = sqlx::query_as::<_, Item>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(item)
    }

    /// Inserts a new item and returns it with its assigned id.
    pub async fn insert(&self, item: &NewItem) -> DbResult<Item> {
        debug!(name = %item.name, stock = item.stock, "Inserting item");

        let now = Utc::now();
        let sql = format!(
            "INSERT INTO items (
                name, category_id, cost_price_cents, selling_price_cents, stock,
                created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
             RETURNING {ITEM_COLUMNS}"
        );

        let inserted = sqlx::query_as::<_, Item>(&sql)
            .bind(item.name.as_str())
            .bind(item.category_id)
            .bind(item.cost_price_cents)
            .bind(item.selling_price_cents)
            .bind(item.stock)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;

        Ok(inserted)
    }

    /// Lists items ordered by name.
    pub async fn list(&self, limit: u32, offset: u32) -> DbResult<Vec<Item>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items ORDER BY name, id LIMIT ?1 OFFSET ?2");

        let items = sqlx::query_as::<_, Item>(&sql)
            .bind(i64::from(limit))
            .bind(i64::from(offset))
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    /// Counts all items.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Adds `delta` to an item's stock (restock or manual correction).
    ///
    /// Uses a relative update (`stock = stock + delta`) so concurrent
    /// adjustments never overwrite each other.
    pub async fn adjust_stock(&self, id: i64, delta: i64) -> DbResult<Item> {
        debug!(id, delta, "Adjusting stock");

        let sql = format!(
            "UPDATE items SET stock = stock + ?2, updated_at = ?3 \
             WHERE id = ?1 \
             RETURNING {ITEM_COLUMNS}"
        );

        sqlx::query_as::<_, Item>(&sql)
            .bind(id)
            .bind(delta)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Item", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{item, memory_db};

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = memory_db().await;
        let created = item(&db, "Indomie Goreng", 3_500, 40).await;

        let loaded = db.items().get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Indomie Goreng");
        assert_eq!(loaded.selling_price_cents, 3_500);
        assert_eq!(loaded.cost_price_cents, 2_100);
        assert_eq!(loaded.stock, 40);

        assert!(db.items().get_by_id(created.id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_and_count() {
        let db = memory_db().await;
        item(&db, "Teh Botol", 4_000, 10).await;
        item(&db, "Aqua", 3_000, 10).await;

        assert_eq!(db.items().count().await.unwrap(), 2);
        let names: Vec<String> = db
            .items()
            .list(10, 0)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["Aqua", "Teh Botol"]);
    }

    #[tokio::test]
    async fn test_adjust_stock() {
        let db = memory_db().await;
        let aqua = item(&db, "Aqua", 3_000, 10).await;

        assert_eq!(db.items().adjust_stock(aqua.id, 5).await.unwrap().stock, 15);
        assert_eq!(db.items().adjust_stock(aqua.id, -15).await.unwrap().stock, 0);
        assert!(matches!(
            db.items().adjust_stock(aqua.id, -1).await,
            Err(DbError::CheckViolation { .. })
        ));
        assert!(matches!(
            db.items().adjust_stock(aqua.id + 1, 1).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
