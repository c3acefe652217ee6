//! # Status Reconciler
//!
//! Moves a transaction through its lifecycle and releases reserved stock
//! when a pending payment fails.
//!
//! ## Reconciliation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  set_status(id, to)                                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  read current status ── missing ──► TransactionNotFound                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  current.transition(to)                                                │
//! │       ├── NoOp     ──► return unchanged                                │
//! │       ├── Err      ──► InvalidTransition                               │
//! │       └── Settle / Release                                             │
//! │              │  BEGIN                                                   │
//! │              ▼                                                          │
//! │       UPDATE ... SET status = to WHERE id = ? AND status = current     │
//! │              ├── 0 rows: someone else moved it ── ROLLBACK, re-read    │
//! │              └── 1 row                                                  │
//! │                    │  Release: stock += quantity for every line        │
//! │                    ▼  COMMIT                                            │
//! │              TransactionDetail                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The compare-and-set means two concurrent PENDING → FAILED requests
//! restore stock exactly once: the loser re-reads FAILED and sees a no-op.

use tracing::{debug, info, warn};

use kasir_core::{CoreError, TransactionDetail, TransactionStatus, Transition};

use crate::error::{CheckoutResult, DbError};
use crate::pool::Database;

/// How many times to re-read after losing a status race.
pub const MAX_STATUS_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone)]
pub struct StatusReconciler {
    db: Database,
}

impl StatusReconciler {
    pub fn new(db: Database) -> Self {
        StatusReconciler { db }
    }

    /// Applies a status change.
    ///
    /// ## Errors
    /// * `Rejected(TransactionNotFound)` - no such transaction
    /// * `Rejected(InvalidTransition)` - e.g. SUCCESS → FAILED
    /// * `Database(..)` - persistence failure; nothing was written
    pub async fn set_status(
        &self,
        id: i64,
        to: TransactionStatus,
    ) -> CheckoutResult<TransactionDetail> {
        for attempt in 1..=MAX_STATUS_ATTEMPTS {
            let current = self
                .db
                .transactions()
                .get_by_id(id)
                .await?
                .ok_or(CoreError::TransactionNotFound(id))?;

            let transition = match current.status.transition(to) {
                Ok(transition) => transition,
                Err(err) => {
                    warn!(transaction_id = id, error = %err, "Status change rejected");
                    return Err(err.into());
                }
            };

            if transition == Transition::NoOp {
                debug!(transaction_id = id, status = %to, "Status unchanged");
                return self.detail(id).await;
            }

            let mut uow = self.db.begin().await?;

            if !uow.compare_and_set_status(id, current.status, to).await? {
                debug!(transaction_id = id, attempt, "Status changed concurrently, re-evaluating");
                uow.rollback().await?;
                continue;
            }

            let mut released = 0;
            if transition == Transition::Release {
                for line in uow.lines_of(id).await? {
                    uow.adjust_stock(line.item_id, line.quantity).await?;
                    released += line.quantity;
                }
            }

            uow.commit().await?;

            info!(
                transaction_id = id,
                order_id = %current.order_id,
                from = %current.status,
                to = %to,
                released,
                "Transaction status updated"
            );

            return self.detail(id).await;
        }

        Err(DbError::TransactionFailed(format!(
            "status of transaction {id} kept changing during update"
        ))
        .into())
    }

    async fn detail(&self, id: i64) -> CheckoutResult<TransactionDetail> {
        let detail = self
            .db
            .transactions()
            .get_detail(id)
            .await?
            .ok_or(CoreError::TransactionNotFound(id))?;

        Ok(detail)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{item, memory_db};
    use crate::{CheckoutError, DbConfig};
    use kasir_core::{CartLine, CheckoutRequest, PaymentMethod};
    use std::time::Duration;
    use TransactionStatus::*;

    async fn sell(db: &Database, item_id: i64, quantity: i64, method: PaymentMethod) -> i64 {
        db.checkout_engine()
            .checkout(CheckoutRequest {
                items: vec![CartLine { id: item_id, quantity }],
                payment_method: method,
                note: None,
                discount_id: None,
            })
            .await
            .unwrap()
            .transaction
            .id
    }

    async fn stock_of(db: &Database, id: i64) -> i64 {
        db.items().get_by_id(id).await.unwrap().unwrap().stock
    }

    #[tokio::test]
    async fn test_failed_payment_restores_stock() {
        let db = memory_db().await;
        let milk = item(&db, "Susu UHT", 6_000, 10).await;

        let id = sell(&db, milk.id, 3, PaymentMethod::Qris).await;
        assert_eq!(stock_of(&db, milk.id).await, 7);

        let detail = db.status_reconciler().set_status(id, Failed).await.unwrap();
        assert_eq!(detail.transaction.status, Failed);
        assert_eq!(detail.items.len(), 1);
        assert_eq!(stock_of(&db, milk.id).await, 10);
    }

    #[tokio::test]
    async fn test_settle_leaves_stock_alone() {
        let db = memory_db().await;
        let milk = item(&db, "Susu UHT", 6_000, 10).await;

        let id = sell(&db, milk.id, 3, PaymentMethod::Qris).await;
        let detail = db.status_reconciler().set_status(id, Success).await.unwrap();

        assert_eq!(detail.transaction.status, Success);
        assert_eq!(stock_of(&db, milk.id).await, 7);
    }

    #[tokio::test]
    async fn test_same_status_is_idempotent() {
        let db = memory_db().await;
        let milk = item(&db, "Susu UHT", 6_000, 10).await;
        let id = sell(&db, milk.id, 3, PaymentMethod::Qris).await;
        let reconciler = db.status_reconciler();

        reconciler.set_status(id, Failed).await.unwrap();
        let first = reconciler.set_status(id, Failed).await.unwrap();
        let second = reconciler.set_status(id, Failed).await.unwrap();

        assert_eq!(first.transaction.status, Failed);
        assert_eq!(first.transaction.updated_at, second.transaction.updated_at);
        assert_eq!(stock_of(&db, milk.id).await, 10);
    }

    #[tokio::test]
    async fn test_terminal_states_reject_changes() {
        let db = memory_db().await;
        let milk = item(&db, "Susu UHT", 6_000, 10).await;
        let paid = sell(&db, milk.id, 1, PaymentMethod::Cash).await;
        let reconciler = db.status_reconciler();

        for to in [Failed, Pending] {
            let err = reconciler.set_status(paid, to).await.unwrap_err();
            assert!(matches!(
                err,
                CheckoutError::Rejected(CoreError::InvalidTransition { from: Success, .. })
            ));
        }
        assert_eq!(stock_of(&db, milk.id).await, 9);
    }

    #[tokio::test]
    async fn test_unknown_transaction() {
        let db = memory_db().await;
        let err = db.status_reconciler().set_status(404, Failed).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Rejected(CoreError::TransactionNotFound(404))
        ));
    }

    #[tokio::test]
    async fn test_stock_conservation_across_lifecycle() {
        let db = memory_db().await;
        let milk = item(&db, "Susu UHT", 6_000, 20).await;
        let reconciler = db.status_reconciler();

        let a = sell(&db, milk.id, 2, PaymentMethod::Qris).await;
        let b = sell(&db, milk.id, 3, PaymentMethod::Qris).await;
        sell(&db, milk.id, 4, PaymentMethod::Cash).await;

        reconciler.set_status(a, Success).await.unwrap();
        reconciler.set_status(b, Failed).await.unwrap();

        // 20 - (2 + 3 + 4) + 3
        assert_eq!(stock_of(&db, milk.id).await, 14);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_failures_restore_once() {
        let dir = tempfile::tempdir().unwrap();
        let config = DbConfig::new(dir.path().join("kasir.db"))
            .max_connections(6)
            .busy_timeout(Duration::from_secs(10));
        let db = Database::new(config).await.unwrap();

        let milk = item(&db, "Susu UHT", 6_000, 10).await;
        let id = sell(&db, milk.id, 4, PaymentMethod::Qris).await;

        let mut handles = Vec::new();
        for _ in 0..6 {
            let reconciler = db.status_reconciler();
            handles.push(tokio::spawn(async move { reconciler.set_status(id, Failed).await }));
        }
        for handle in handles {
            let detail = handle.await.unwrap().unwrap();
            assert_eq!(detail.transaction.status, Failed);
        }

        assert_eq!(stock_of(&db, milk.id).await, 10);
    }
}
