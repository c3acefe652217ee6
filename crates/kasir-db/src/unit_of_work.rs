//! # Unit of Work
//!
//! One SQLite transaction exposing exactly the catalog, discount and ledger
//! operations the checkout engine and status reconciler need.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  db.begin() ──► UnitOfWork ──► reserve_stock / insert_* / ...          │
//! │                     │                                                   │
//! │          ┌──────────┴───────────┐                                       │
//! │          ▼                      ▼                                       │
//! │     commit()               dropped (error, `?`, early return)          │
//! │     every write            every write discarded                       │
//! │     visible at once        (ROLLBACK)                                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Write-first ordering
//! SQLite allows one writer at a time. A unit that reads first and writes
//! later can fail to upgrade its lock without waiting on the busy timeout,
//! so callers issue their first *write* (`reserve_stock`,
//! `compare_and_set_status`) before any read.

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction as SqlxTransaction};
use tracing::debug;

use kasir_core::pricing::{CheckoutTotals, PricedLine};
use kasir_core::{
    Discount, Item, PaymentMethod, Transaction, TransactionItem, TransactionStatus,
};

use crate::error::{DbError, DbResult};
use crate::repository::{DISCOUNT_COLUMNS, ITEM_COLUMNS, LINE_COLUMNS, TRANSACTION_COLUMNS};

/// Header row for a new ledger entry.
#[derive(Debug, Clone)]
pub struct NewTransaction<'a> {
    pub order_id: &'a str,
    pub totals: CheckoutTotals,
    pub payment_method: PaymentMethod,
    pub status: TransactionStatus,
    pub note: Option<&'a str>,
    pub discount_id: Option<i64>,
}

/// An open SQLite transaction. Dropping it without [`commit`](Self::commit)
/// rolls back.
#[derive(Debug)]
pub struct UnitOfWork {
    tx: SqlxTransaction<'static, Sqlite>,
}

impl UnitOfWork {
    pub(crate) async fn begin(pool: &SqlitePool) -> DbResult<Self> {
        let tx = pool.begin().await?;
        Ok(UnitOfWork { tx })
    }

    // =========================================================================
    // Catalog Store
    // =========================================================================

    /// Loads an item by id.
    pub async fn find_item(&mut self, id: i64) -> DbResult<Option<Item>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1");

        let item = sqlx::query_as::<_, Item>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(item)
    }

    /// Decrements stock by `quantity` only if enough is on hand.
    ///
    /// ## Compare-and-swap
    /// ```text
    /// UPDATE items SET stock = stock - q WHERE id = ? AND stock >= q
    /// ```
    /// The check and the decrement are one statement, so two units can
    /// never both pass the check on the same units of stock.
    ///
    /// ## Returns
    /// * `Some(item)` - reserved; `item` carries the prices to snapshot and
    ///   the stock left after the decrement
    /// * `None` - the item doesn't exist or has fewer than `quantity` units
    pub async fn reserve_stock(&mut self, id: i64, quantity: i64) -> DbResult<Option<Item>> {
        let sql = format!(
            "UPDATE items SET stock = stock - ?2, updated_at = ?3 \
             WHERE id = ?1 AND stock >= ?2 \
             RETURNING {ITEM_COLUMNS}"
        );

        let item = sqlx::query_as::<_, Item>(&sql)
            .bind(id)
            .bind(quantity)
            .bind(Utc::now())
            .fetch_optional(&mut *self.tx)
            .await?;

        if let Some(item) = &item {
            debug!(item_id = id, quantity, remaining = item.stock, "Stock reserved");
        }

        Ok(item)
    }

    /// Adds `delta` (may be negative) to an item's stock.
    ///
    /// A delta that would take stock below zero fails the `stock >= 0`
    /// CHECK constraint and surfaces as [`DbError::CheckViolation`].
    pub async fn adjust_stock(&mut self, id: i64, delta: i64) -> DbResult<Item> {
        let sql = format!(
            "UPDATE items SET stock = stock + ?2, updated_at = ?3 \
             WHERE id = ?1 \
             RETURNING {ITEM_COLUMNS}"
        );

        let item = sqlx::query_as::<_, Item>(&sql)
            .bind(id)
            .bind(delta)
            .bind(Utc::now())
            .fetch_optional(&mut *self.tx)
            .await?
            .ok_or_else(|| DbError::not_found("Item", id))?;

        debug!(item_id = id, delta, stock = item.stock, "Stock adjusted");
        Ok(item)
    }

    // =========================================================================
    // Discount Store
    // =========================================================================

    pub async fn find_discount(&mut self, id: i64) -> DbResult<Option<Discount>> {
        let sql = format!("SELECT {DISCOUNT_COLUMNS} FROM discounts WHERE id = ?1");

        let discount = sqlx::query_as::<_, Discount>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(discount)
    }

    // =========================================================================
    // Ledger
    // =========================================================================

    /// Inserts the transaction header.
    ///
    /// Fails with [`DbError::UniqueViolation`] on `transactions.order_id`
    /// if the order id is already taken.
    pub async fn insert_transaction(&mut self, new: &NewTransaction<'_>) -> DbResult<Transaction> {
        let now = Utc::now();
        let sql = format!(
            "INSERT INTO transactions (
                order_id, subtotal_cents, discount_total_cents, total_amount_cents,
                payment_method, status, note, discount_id, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
             RETURNING {TRANSACTION_COLUMNS}"
        );

        let transaction = sqlx::query_as::<_, Transaction>(&sql)
            .bind(new.order_id)
            .bind(new.totals.subtotal.cents())
            .bind(new.totals.discount_total.cents())
            .bind(new.totals.total_amount.cents())
            .bind(new.payment_method)
            .bind(new.status)
            .bind(new.note)
            .bind(new.discount_id)
            .bind(now)
            .fetch_one(&mut *self.tx)
            .await?;

        Ok(transaction)
    }

    /// Inserts one frozen line snapshot.
    pub async fn insert_line(
        &mut self,
        transaction_id: i64,
        line: &PricedLine,
    ) -> DbResult<TransactionItem> {
        let sql = format!(
            "INSERT INTO transaction_items (
                transaction_id, item_id, name_snapshot, quantity, price_cents, cost_price_cents
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING {LINE_COLUMNS}"
        );

        let row = sqlx::query_as::<_, TransactionItem>(&sql)
            .bind(transaction_id)
            .bind(line.item_id)
            .bind(line.name.as_str())
            .bind(line.quantity)
            .bind(line.price.cents())
            .bind(line.cost_price.cents())
            .fetch_one(&mut *self.tx)
            .await?;

        Ok(row)
    }

    /// Sets `status = to` only if the row is still in `expected`.
    ///
    /// ## Returns
    /// `false` if another unit changed the status first (or the row is gone).
    pub async fn compare_and_set_status(
        &mut self,
        id: i64,
        expected: TransactionStatus,
        to: TransactionStatus,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            "UPDATE transactions SET status = ?3, updated_at = ?4 \
             WHERE id = ?1 AND status = ?2",
        )
        .bind(id)
        .bind(expected)
        .bind(to)
        .bind(Utc::now())
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Line items of a transaction, in insertion order.
    pub async fn lines_of(&mut self, transaction_id: i64) -> DbResult<Vec<TransactionItem>> {
        let sql = format!(
            "SELECT {LINE_COLUMNS} FROM transaction_items \
             WHERE transaction_id = ?1 ORDER BY id"
        );

        let lines = sqlx::query_as::<_, TransactionItem>(&sql)
            .bind(transaction_id)
            .fetch_all(&mut *self.tx)
            .await?;

        Ok(lines)
    }

    // =========================================================================
    // Completion
    // =========================================================================

    /// Commits every write in this unit.
    pub async fn commit(self) -> DbResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    /// Discards every write in this unit. Equivalent to dropping it, but
    /// waits for the ROLLBACK to finish.
    pub async fn rollback(self) -> DbResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{item, memory_db};

    #[tokio::test]
    async fn test_reserve_stock_is_conditional() {
        let db = memory_db().await;
        let soap = item(&db, "Sabun", 5_000, 5).await;

        let mut uow = db.begin().await.unwrap();
        let reserved = uow.reserve_stock(soap.id, 3).await.unwrap().unwrap();
        assert_eq!(reserved.stock, 2);

        // Only 2 left.
        assert!(uow.reserve_stock(soap.id, 3).await.unwrap().is_none());
        // Unknown item.
        assert!(uow.reserve_stock(9_999, 1).await.unwrap().is_none());

        uow.commit().await.unwrap();
        assert_eq!(db.items().get_by_id(soap.id).await.unwrap().unwrap().stock, 2);
    }

    #[tokio::test]
    async fn test_drop_rolls_back() {
        let db = memory_db().await;
        let soap = item(&db, "Sabun", 5_000, 5).await;

        {
            let mut uow = db.begin().await.unwrap();
            uow.reserve_stock(soap.id, 5).await.unwrap().unwrap();
            // dropped without commit
        }

        assert_eq!(db.items().get_by_id(soap.id).await.unwrap().unwrap().stock, 5);
    }

    #[tokio::test]
    async fn test_adjust_stock_cannot_go_negative() {
        let db = memory_db().await;
        let soap = item(&db, "Sabun", 5_000, 1).await;

        let mut uow = db.begin().await.unwrap();
        assert_eq!(uow.adjust_stock(soap.id, 4).await.unwrap().stock, 5);
        assert!(matches!(
            uow.adjust_stock(soap.id, -6).await,
            Err(DbError::CheckViolation { .. })
        ));
        assert!(matches!(
            uow.adjust_stock(424_242, 1).await,
            Err(DbError::NotFound { .. })
        ));
        uow.rollback().await.unwrap();
    }

    #[tokio::test]
    async fn test_compare_and_set_status() {
        let db = memory_db().await;
        let soap = item(&db, "Sabun", 5_000, 5).await;

        let mut uow = db.begin().await.unwrap();
        let line = kasir_core::pricing::price_line(&soap, 1);
        let totals = CheckoutTotals::compute(std::slice::from_ref(&line), None);
        let tx = uow
            .insert_transaction(&NewTransaction {
                order_id: "TRX-20260101-0001",
                totals,
                payment_method: PaymentMethod::Qris,
                status: TransactionStatus::Pending,
                note: None,
                discount_id: None,
            })
            .await
            .unwrap();
        uow.insert_line(tx.id, &line).await.unwrap();

        assert!(uow
            .compare_and_set_status(tx.id, TransactionStatus::Pending, TransactionStatus::Success)
            .await
            .unwrap());
        assert!(!uow
            .compare_and_set_status(tx.id, TransactionStatus::Pending, TransactionStatus::Failed)
            .await
            .unwrap());

        let lines = uow.lines_of(tx.id).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].price_cents, 5_000);
        uow.commit().await.unwrap();
    }
}
