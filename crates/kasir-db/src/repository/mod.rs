//! # Repository Module
//!
//! Pool-level repositories for Kasir.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  HTTP handler / seed tool                                              │
//! │       │                                                                 │
//! │       │  db.transactions().list(&query)                                │
//! │       ▼                                                                 │
//! │  TransactionRepository                                                 │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── get_detail(&self, id)                                             │
//! │  ├── list(&self, query)                                                │
//! │  └── count_by_status(&self)                                            │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each call runs on its own pooled connection. Anything that must be
//! atomic with other writes goes through [`crate::UnitOfWork`] instead.
//!
//! ## Available Repositories
//!
//! - [`item::ItemRepository`] - Catalog Store
//! - [`discount::DiscountRepository`] - Discount Store
//! - [`transaction::TransactionRepository`] - Transaction Ledger reads

pub mod discount;
pub mod item;
pub mod transaction;

// Column lists shared by repositories and the unit of work, in the field
// order of the matching `FromRow` struct.

pub(crate) const ITEM_COLUMNS: &str =
    "id, name, category_id, cost_price_cents, selling_price_cents, stock, created_at, updated_at";

pub(crate) const DISCOUNT_COLUMNS: &str =
    "id, name, discount_type, value, is_active, created_at, updated_at";

pub(crate) const TRANSACTION_COLUMNS: &str = "id, order_id, subtotal_cents, discount_total_cents, \
     total_amount_cents, payment_method, status, note, discount_id, created_at, updated_at";

pub(crate) const LINE_COLUMNS: &str =
    "id, transaction_id, item_id, name_snapshot, quantity, price_cents, cost_price_cents";
