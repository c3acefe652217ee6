//! # kasir-db: Database Layer for Kasir
//!
//! SQLite storage for the catalog, discounts and the transaction ledger,
//! plus the checkout engine and status reconciler that mutate them
//! atomically.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Kasir Data Flow                                │
//! │                                                                         │
//! │  HTTP handler (POST /api/transactions)                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     kasir-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌────────────────┐   ┌───────────────┐   ┌───────────────┐   │   │
//! │  │   │ CheckoutEngine │   │  UnitOfWork   │   │  Repositories │   │   │
//! │  │   │ StatusReconcil.│──►│ (one SQLite   │   │ items         │   │   │
//! │  │   │                │   │  transaction) │   │ discounts     │   │   │
//! │  │   └────────────────┘   └───────────────┘   │ transactions  │   │   │
//! │  │            │                   │           └───────────────┘   │   │
//! │  │            ▼                   ▼                   │           │   │
//! │  │   ┌─────────────────────────────────────────────────────────┐  │   │
//! │  │   │        Database (pool.rs) + Migrations (embedded)       │  │   │
//! │  │   └─────────────────────────────────────────────────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL)                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and checkout error types
//! - [`unit_of_work`] - Explicit all-or-nothing unit around one SQLite transaction
//! - [`repository`] - Pool-level repositories (items, discounts, transactions)
//! - [`checkout`] - Checkout engine
//! - [`reconcile`] - Status reconciler
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kasir_core::{CartLine, CheckoutRequest, PaymentMethod, TransactionStatus};
//! use kasir_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./kasir.db")).await?;
//!
//! let sale = db.checkout_engine().checkout(CheckoutRequest {
//!     items: vec![CartLine { id: 1, quantity: 3 }],
//!     payment_method: PaymentMethod::Qris,
//!     note: None,
//!     discount_id: None,
//! }).await?;
//!
//! // Payment callback failed: stock goes back.
//! db.status_reconciler()
//!     .set_status(sale.transaction.id, TransactionStatus::Failed)
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod reconcile;
pub mod repository;
pub mod unit_of_work;

// =============================================================================
// Re-exports
// =============================================================================

pub use checkout::CheckoutEngine;
pub use error::{CheckoutError, CheckoutResult, DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use reconcile::StatusReconciler;
pub use unit_of_work::UnitOfWork;

// Repository re-exports for convenience
pub use repository::discount::DiscountRepository;
pub use repository::item::ItemRepository;
pub use repository::transaction::{StatusCounts, TransactionRepository};

#[cfg(test)]
pub(crate) mod test_support {
    use kasir_core::{Discount, DiscountType, Item, NewDiscount, NewItem};

    use crate::{Database, DbConfig};

    pub async fn memory_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub async fn item(db: &Database, name: &str, price: i64, stock: i64) -> Item {
        db.items()
            .insert(&NewItem {
                name: name.to_string(),
                category_id: Some(1),
                cost_price_cents: price * 6 / 10,
                selling_price_cents: price,
                stock,
            })
            .await
            .unwrap()
    }

    pub async fn discount(
        db: &Database,
        discount_type: DiscountType,
        value: i64,
        is_active: bool,
    ) -> Discount {
        db.discounts()
            .insert(&NewDiscount {
                name: "Promo".to_string(),
                discount_type,
                value,
                is_active,
            })
            .await
            .unwrap()
    }
}
