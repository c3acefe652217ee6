//! # Checkout Engine
//!
//! Turns a cart into a persisted transaction with reserved stock, as one
//! all-or-nothing unit of work.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CheckoutRequest { items, paymentMethod, note?, discountId? }          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate_cart / validate_note          ── EmptyCart, Validation       │
//! │       │                                                                 │
//! │       ▼  BEGIN                                                          │
//! │  for each line, in order:                                              │
//! │     reserve_stock(id, qty)  (compare-and-swap)                         │
//! │       ├── None → ItemNotFound / InsufficientStock  ── ROLLBACK         │
//! │       └── Some(item) → price_line(item, qty)   (server price only)     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  find_discount → active? → CheckoutTotals::compute (clamped)           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  insert_transaction (status from payment method)                       │
//! │  insert_line × N    (frozen price / cost)                              │
//! │       │                                                                 │
//! │       ▼  COMMIT                                                         │
//! │  TransactionDetail                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any error before COMMIT drops the unit of work, so no stock decrement
//! and no ledger row survives a failed checkout.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use kasir_core::order_id::new_order_id;
use kasir_core::pricing::{price_line, CheckoutTotals};
use kasir_core::validation::{validate_cart, validate_note};
use kasir_core::{CheckoutRequest, CoreError, TransactionDetail};

use crate::error::{CheckoutError, CheckoutResult};
use crate::pool::Database;
use crate::unit_of_work::NewTransaction;

/// How many order ids to try before giving up on UNIQUE collisions.
pub const MAX_ORDER_ID_ATTEMPTS: u32 = 3;

type OrderIdSource = Arc<dyn Fn() -> String + Send + Sync>;

/// Checkout engine bound to one database.
#[derive(Clone)]
pub struct CheckoutEngine {
    db: Database,
    order_ids: OrderIdSource,
}

impl fmt::Debug for CheckoutEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckoutEngine").field("db", &self.db).finish_non_exhaustive()
    }
}

impl CheckoutEngine {
    /// Creates an engine that issues `TRX-YYYYMMDD-XXXX` ids for today.
    pub fn new(db: Database) -> Self {
        Self::with_order_ids(db, new_order_id)
    }

    /// Creates an engine with a custom order id source.
    pub fn with_order_ids(db: Database, source: impl Fn() -> String + Send + Sync + 'static) -> Self {
        CheckoutEngine {
            db,
            order_ids: Arc::new(source),
        }
    }

    /// Runs a checkout.
    ///
    /// ## Errors
    /// * `Rejected(EmptyCart | Validation | ItemNotFound | InsufficientStock)`
    /// * `Database(..)` - unexpected persistence failure
    ///
    /// In both cases nothing was written.
    pub async fn checkout(&self, request: CheckoutRequest) -> CheckoutResult<TransactionDetail> {
        if let Err(err) = validate_cart(&request.items) {
            warn!(error = %err, "Checkout rejected");
            return Err(err.into());
        }
        validate_note(request.note.as_deref())?;

        let mut attempt = 1;
        loop {
            let order_id = (self.order_ids)();

            match self.checkout_once(&request, &order_id).await {
                Err(CheckoutError::Database(err))
                    if err.is_unique_violation_on("order_id") && attempt < MAX_ORDER_ID_ATTEMPTS =>
                {
                    warn!(%order_id, attempt, "Order id collision, retrying with a fresh id");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn checkout_once(
        &self,
        request: &CheckoutRequest,
        order_id: &str,
    ) -> CheckoutResult<TransactionDetail> {
        let mut uow = self.db.begin().await?;

        // Reservations come first: the first write takes SQLite's write lock.
        let mut lines = Vec::with_capacity(request.items.len());
        for cart_line in &request.items {
            let Some(item) = uow.reserve_stock(cart_line.id, cart_line.quantity).await? else {
                let err = match uow.find_item(cart_line.id).await? {
                    None => CoreError::ItemNotFound(cart_line.id),
                    Some(item) => CoreError::InsufficientStock {
                        name: item.name,
                        available: item.stock,
                        requested: cart_line.quantity,
                    },
                };
                warn!(item_id = cart_line.id, quantity = cart_line.quantity, error = %err, "Checkout rejected");
                return Err(err.into());
            };

            lines.push(price_line(&item, cart_line.quantity));
        }

        let discount = match request.discount_id {
            Some(id) => {
                let found = uow.find_discount(id).await?.filter(|d| d.is_active);
                if found.is_none() {
                    debug!(discount_id = id, "Discount missing or inactive, not applied");
                }
                found
            }
            None => None,
        };

        let totals = CheckoutTotals::compute(&lines, discount.as_ref());
        let status = request.payment_method.initial_status();

        let transaction = uow
            .insert_transaction(&NewTransaction {
                order_id,
                totals,
                payment_method: request.payment_method,
                status,
                note: request.note.as_deref(),
                discount_id: discount.as_ref().map(|d| d.id),
            })
            .await?;

        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            items.push(uow.insert_line(transaction.id, line).await?);
        }

        uow.commit().await?;

        info!(
            order_id = %transaction.order_id,
            total = %totals.total_amount,
            discount = %totals.discount_total,
            status = %status,
            lines = items.len(),
            "Checkout committed"
        );

        Ok(TransactionDetail {
            transaction,
            items,
            discount,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{discount, item, memory_db};
    use crate::DbConfig;
    use kasir_core::order_id::is_valid_order_id;
    use kasir_core::{CartLine, DiscountType, PaymentMethod, TransactionStatus};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn request(items: Vec<CartLine>, payment_method: PaymentMethod) -> CheckoutRequest {
        CheckoutRequest {
            items,
            payment_method,
            note: None,
            discount_id: None,
        }
    }

    async fn stock_of(db: &Database, id: i64) -> i64 {
        db.items().get_by_id(id).await.unwrap().unwrap().stock
    }

    #[tokio::test]
    async fn test_qris_checkout_is_pending_and_reserves_stock() {
        let db = memory_db().await;
        let rice = item(&db, "Beras 5kg", 70_000, 10).await;

        let sale = db
            .checkout_engine()
            .checkout(request(vec![CartLine { id: rice.id, quantity: 3 }], PaymentMethod::Qris))
            .await
            .unwrap();

        assert_eq!(sale.transaction.status, TransactionStatus::Pending);
        assert_eq!(sale.transaction.total_amount_cents, 210_000);
        assert!(is_valid_order_id(&sale.transaction.order_id));
        assert_eq!(sale.items.len(), 1);
        assert_eq!(sale.items[0].price_cents, 70_000);
        assert_eq!(sale.items[0].cost_price_cents, 42_000);
        assert_eq!(stock_of(&db, rice.id).await, 7);
    }

    #[tokio::test]
    async fn test_cash_checkout_is_success() {
        let db = memory_db().await;
        let rice = item(&db, "Beras 5kg", 70_000, 10).await;

        let mut req = request(vec![CartLine { id: rice.id, quantity: 1 }], PaymentMethod::Cash);
        req.note = Some("meja 3".to_string());
        let sale = db.checkout_engine().checkout(req).await.unwrap();

        assert_eq!(sale.transaction.status, TransactionStatus::Success);
        assert_eq!(sale.transaction.note.as_deref(), Some("meja 3"));
    }

    #[tokio::test]
    async fn test_forged_client_price_is_ignored() {
        let db = memory_db().await;
        let rice = item(&db, "Beras 5kg", 70_000, 10).await;

        let body = format!(
            r#"{{"items":[{{"id":{},"quantity":2,"price":1}}],"paymentMethod":"CASH"}}"#,
            rice.id
        );
        let req: CheckoutRequest = serde_json::from_str(&body).unwrap();
        let sale = db.checkout_engine().checkout(req).await.unwrap();

        assert_eq!(sale.transaction.subtotal_cents, 140_000);
        assert_eq!(sale.transaction.total_amount_cents, 140_000);
    }

    #[tokio::test]
    async fn test_empty_cart_rejected() {
        let db = memory_db().await;
        let err = db
            .checkout_engine()
            .checkout(request(vec![], PaymentMethod::Cash))
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::Rejected(CoreError::EmptyCart)));
        assert_eq!(db.transactions().count_by_status().await.unwrap().total(), 0);
    }

    #[tokio::test]
    async fn test_missing_item_rolls_back_earlier_reservations() {
        let db = memory_db().await;
        let rice = item(&db, "Beras 5kg", 70_000, 10).await;

        let err = db
            .checkout_engine()
            .checkout(request(
                vec![
                    CartLine { id: rice.id, quantity: 4 },
                    CartLine { id: 9_999, quantity: 1 },
                ],
                PaymentMethod::Cash,
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::Rejected(CoreError::ItemNotFound(9_999))));
        assert_eq!(stock_of(&db, rice.id).await, 10);
        assert_eq!(db.transactions().count_by_status().await.unwrap().total(), 0);
    }

    #[tokio::test]
    async fn test_insufficient_stock_names_item() {
        let db = memory_db().await;
        let oil = item(&db, "Minyak Goreng", 18_000, 2).await;

        let err = db
            .checkout_engine()
            .checkout(request(vec![CartLine { id: oil.id, quantity: 3 }], PaymentMethod::Cash))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Stok kurang untuk: Minyak Goreng");
        match err {
            CheckoutError::Rejected(CoreError::InsufficientStock {
                available,
                requested,
                ..
            }) => {
                assert_eq!(available, 2);
                assert_eq!(requested, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(stock_of(&db, oil.id).await, 2);
    }

    #[tokio::test]
    async fn test_duplicate_lines_are_checked_together() {
        let db = memory_db().await;
        let oil = item(&db, "Minyak Goreng", 18_000, 5).await;

        let err = db
            .checkout_engine()
            .checkout(request(
                vec![
                    CartLine { id: oil.id, quantity: 3 },
                    CartLine { id: oil.id, quantity: 3 },
                ],
                PaymentMethod::Cash,
            ))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::Rejected(CoreError::InsufficientStock { available: 2, .. })
        ));
        assert_eq!(stock_of(&db, oil.id).await, 5);
    }

    #[tokio::test]
    async fn test_fixed_discount_clamped_to_subtotal() {
        let db = memory_db().await;
        let candy = item(&db, "Permen", 1_000, 10).await;
        let big = discount(&db, DiscountType::Fixed, 50_000, true).await;

        let mut req = request(vec![CartLine { id: candy.id, quantity: 2 }], PaymentMethod::Cash);
        req.discount_id = Some(big.id);
        let sale = db.checkout_engine().checkout(req).await.unwrap();

        assert_eq!(sale.transaction.subtotal_cents, 2_000);
        assert_eq!(sale.transaction.discount_total_cents, 2_000);
        assert_eq!(sale.transaction.total_amount_cents, 0);
        assert_eq!(sale.transaction.discount_id, Some(big.id));
        assert_eq!(sale.discount.map(|d| d.id), Some(big.id));
    }

    #[tokio::test]
    async fn test_percentage_discount_applied() {
        let db = memory_db().await;
        let coffee = item(&db, "Kopi Bubuk", 10_000, 10).await;
        let ten_percent = discount(&db, DiscountType::Percentage, 10, true).await;

        let mut req = request(vec![CartLine { id: coffee.id, quantity: 2 }], PaymentMethod::Debit);
        req.discount_id = Some(ten_percent.id);
        let sale = db.checkout_engine().checkout(req).await.unwrap();

        assert_eq!(sale.transaction.subtotal_cents, 20_000);
        assert_eq!(sale.transaction.discount_total_cents, 2_000);
        assert_eq!(sale.transaction.total_amount_cents, 18_000);
    }

    #[tokio::test]
    async fn test_inactive_or_unknown_discount_is_zero() {
        let db = memory_db().await;
        let candy = item(&db, "Permen", 1_000, 10).await;
        let off = discount(&db, DiscountType::Fixed, 500, false).await;

        for discount_id in [off.id, off.id + 100] {
            let mut req = request(vec![CartLine { id: candy.id, quantity: 1 }], PaymentMethod::Cash);
            req.discount_id = Some(discount_id);
            let sale = db.checkout_engine().checkout(req).await.unwrap();

            assert_eq!(sale.transaction.discount_total_cents, 0);
            assert_eq!(sale.transaction.total_amount_cents, 1_000);
            assert!(sale.transaction.discount_id.is_none());
            assert!(sale.discount.is_none());
        }
    }

    #[tokio::test]
    async fn test_order_id_collision_is_retried() {
        let db = memory_db().await;
        let candy = item(&db, "Permen", 1_000, 10).await;

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let engine = CheckoutEngine::with_order_ids(db.clone(), move || {
            match counter.fetch_add(1, Ordering::SeqCst) {
                0 | 1 => "TRX-20260101-AAAA".to_string(),
                _ => "TRX-20260101-BBBB".to_string(),
            }
        });

        let line = || vec![CartLine { id: candy.id, quantity: 1 }];
        let first = engine.checkout(request(line(), PaymentMethod::Cash)).await.unwrap();
        let second = engine.checkout(request(line(), PaymentMethod::Cash)).await.unwrap();

        assert_eq!(first.transaction.order_id, "TRX-20260101-AAAA");
        assert_eq!(second.transaction.order_id, "TRX-20260101-BBBB");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // The collided attempt was rolled back: only two units were sold.
        assert_eq!(stock_of(&db, candy.id).await, 8);
    }

    #[tokio::test]
    async fn test_order_id_collision_gives_up() {
        let db = memory_db().await;
        let candy = item(&db, "Permen", 1_000, 10).await;
        let engine = CheckoutEngine::with_order_ids(db.clone(), || "TRX-20260101-AAAA".to_string());

        let line = || vec![CartLine { id: candy.id, quantity: 1 }];
        engine.checkout(request(line(), PaymentMethod::Cash)).await.unwrap();
        let err = engine.checkout(request(line(), PaymentMethod::Cash)).await.unwrap_err();

        assert!(matches!(err, CheckoutError::Database(_)));
        assert_eq!(stock_of(&db, candy.id).await, 9);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_checkouts_never_oversell() {
        let dir = tempfile::tempdir().unwrap();
        let config = DbConfig::new(dir.path().join("kasir.db"))
            .max_connections(8)
            .busy_timeout(Duration::from_secs(10));
        let db = Database::new(config).await.unwrap();

        const STOCK: i64 = 5;
        const BUYERS: usize = 8;
        let gas = item(&db, "Gas LPG 3kg", 20_000, STOCK).await;

        let mut handles = Vec::new();
        for _ in 0..BUYERS {
            let engine = db.checkout_engine();
            let req = request(vec![CartLine { id: gas.id, quantity: STOCK }], PaymentMethod::Cash);
            handles.push(tokio::spawn(async move { engine.checkout(req).await }));
        }

        let mut succeeded = 0;
        let mut out_of_stock = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(CheckoutError::Rejected(CoreError::InsufficientStock { .. })) => out_of_stock += 1,
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!(succeeded, 1);
        assert_eq!(out_of_stock, BUYERS - 1);
        assert_eq!(stock_of(&db, gas.id).await, 0);
        assert_eq!(db.transactions().count_by_status().await.unwrap().success, 1);
    }
}
