//! # Discount Repository
//!
//! Discount Store. The checkout engine only reads discounts (through the
//! unit of work); creation and toggling are admin/seed operations.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::DISCOUNT_COLUMNS;
use kasir_core::{Discount, NewDiscount};

#[derive(Debug, Clone)]
pub struct DiscountRepository {
    pool: SqlitePool,
}

impl DiscountRepository {
    pub fn new(pool: SqlitePool) -> Self {
        DiscountRepository { pool }
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Discount>> {
        let sql = format!("SELECT {DISCOUNT_COLUMNS} FROM discounts WHERE id = ?1");

        let discount = sqlx::query_as::<_, Discount>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(discount)
    }

    pub async fn insert(&self, discount: &NewDiscount) -> DbResult<Discount> {
        debug!(name = %discount.name, value = discount.value, "Inserting discount");

        let sql = format!(
            "INSERT INTO discounts (name, discount_type, value, is_active, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?5) \
             RETURNING {DISCOUNT_COLUMNS}"
        );

        let inserted = sqlx::query_as::<_, Discount>(&sql)
            .bind(discount.name.as_str())
            .bind(discount.discount_type)
            .bind(discount.value)
            .bind(discount.is_active)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;

        Ok(inserted)
    }

    /// Lists all discounts, active first.
    pub async fn list(&self) -> DbResult<Vec<Discount>> {
        let sql = format!("SELECT {DISCOUNT_COLUMNS} FROM discounts ORDER BY is_active DESC, id");

        let discounts = sqlx::query_as::<_, Discount>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(discounts)
    }

    /// Turns a discount on or off.
    pub async fn set_active(&self, id: i64, is_active: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE discounts SET is_active = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(is_active)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Discount", id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{discount, memory_db};
    use kasir_core::DiscountType;

    #[tokio::test]
    async fn test_insert_get_and_toggle() {
        let db = memory_db().await;
        let promo = discount(&db, DiscountType::Percentage, 10, true).await;

        let loaded = db.discounts().get_by_id(promo.id).await.unwrap().unwrap();
        assert_eq!(loaded.discount_type, DiscountType::Percentage);
        assert_eq!(loaded.value, 10);
        assert!(loaded.is_active);

        db.discounts().set_active(promo.id, false).await.unwrap();
        let loaded = db.discounts().get_by_id(promo.id).await.unwrap().unwrap();
        assert!(!loaded.is_active);

        assert!(matches!(
            db.discounts().set_active(promo.id + 1, true).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_active_first() {
        let db = memory_db().await;
        let off = discount(&db, DiscountType::Fixed, 500, false).await;
        let on = discount(&db, DiscountType::Fixed, 700, true).await;

        let ids: Vec<i64> = db.discounts().list().await.unwrap().iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![on.id, off.id]);
    }
}
