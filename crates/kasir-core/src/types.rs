//! # Domain Types
//!
//! Core domain types used throughout Kasir.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Item       │   │   Transaction   │   │ TransactionItem │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  transaction_id │       │
//! │  │  name           │◄──┼─ (weak ref) ────┼───│  item_id        │       │
//! │  │  cost_price     │   │  order_id       │   │  quantity       │       │
//! │  │  selling_price  │   │  status         │ 1─*  price (frozen) │       │
//! │  │  stock ≥ 0      │   │  total_amount   │   │  cost (frozen)  │       │
//! │  └─────────────────┘   │  discount_id ───┼─┐ └─────────────────┘       │
//! │                        └─────────────────┘ │                            │
//! │  ┌─────────────────┐   ┌─────────────────┐ │ ┌─────────────────┐       │
//! │  │TransactionStatus│   │ PaymentMethod   │ └►│    Discount     │       │
//! │  │  PENDING        │   │  CASH           │   │  PERCENTAGE     │       │
//! │  │  SUCCESS        │   │  DEBIT          │   │  FIXED          │       │
//! │  │  FAILED         │   │  QRIS (async)   │   │  is_active      │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! JSON field names are camelCase to match the frontend
//! (`paymentMethod`, `totalAmountCents`, ...).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

// =============================================================================
// Item
// =============================================================================

/// A catalog item. Owned by the Catalog Store; the checkout core only reads
/// it and adjusts `stock`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Item {
    pub id: i64,

    /// Display name, also used in stock error messages.
    pub name: String,

    /// Category reference (categories are managed outside the core).
    pub category_id: Option<i64>,

    /// Purchase cost in cents (for margin reporting).
    #[serde(rename = "costPrice")]
    pub cost_price_cents: i64,

    /// Price charged at checkout, in cents. Authoritative over any
    /// price a client sends.
    #[serde(rename = "sellingPrice")]
    pub selling_price_cents: i64,

    /// Units on hand. Never negative after a committed operation.
    pub stock: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Item {
    #[inline]
    pub fn selling_price(&self) -> Money {
        Money::from_cents(self.selling_price_cents)
    }

    #[inline]
    pub fn cost_price(&self) -> Money {
        Money::from_cents(self.cost_price_cents)
    }
}

/// Input for creating a catalog item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub name: String,
    pub category_id: Option<i64>,
    pub cost_price_cents: i64,
    pub selling_price_cents: i64,
    pub stock: i64,
}

// =============================================================================
// Discount
// =============================================================================

/// How a discount's `value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum DiscountType {
    /// `value` is a whole percent of the subtotal (10 = 10%).
    Percentage,
    /// `value` is an absolute amount in cents.
    Fixed,
}

/// A discount that may be attached to a checkout. Read-only to the core.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Discount {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub discount_type: DiscountType,
    /// Percent for PERCENTAGE, cents for FIXED. Never negative.
    pub value: i64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a discount.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDiscount {
    pub name: String,
    #[serde(rename = "type")]
    pub discount_type: DiscountType,
    pub value: i64,
    pub is_active: bool,
}

// =============================================================================
// Transaction Status
// =============================================================================

/// Lifecycle state of a transaction.
///
/// ## State Machine
/// ```text
///                 ┌──────────── Settle ───────────► SUCCESS (terminal)
///   PENDING ──────┤
///   (QRIS only)   └── Release (stock restored) ───► FAILED  (terminal)
///
///   X → X          : NoOp (idempotent)
///   anything else  : InvalidTransition
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum TransactionStatus {
    /// Waiting for an asynchronous payment callback. Stock is reserved.
    Pending,
    /// Paid. Stock stays decremented.
    Success,
    /// Payment failed. Reserved stock has been released.
    Failed,
}

/// The effect a legal status change has on the ledger and catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Requested status equals the current one; nothing is written.
    NoOp,
    /// PENDING → SUCCESS: status only, stock was reserved at checkout.
    Settle,
    /// PENDING → FAILED: every line's quantity goes back to stock.
    Release,
}

impl TransactionStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Success => "SUCCESS",
            TransactionStatus::Failed => "FAILED",
        }
    }

    /// Looks up a status change in the transition table.
    ///
    /// ## Example
    /// ```rust
    /// use kasir_core::{TransactionStatus, Transition};
    ///
    /// let t = TransactionStatus::Pending.transition(TransactionStatus::Failed).unwrap();
    /// assert_eq!(t, Transition::Release);
    ///
    /// assert!(TransactionStatus::Success.transition(TransactionStatus::Failed).is_err());
    /// ```
    pub fn transition(self, to: TransactionStatus) -> CoreResult<Transition> {
        use TransactionStatus::*;

        match (self, to) {
            (from, to) if from == to => Ok(Transition::NoOp),
            (Pending, Success) => Ok(Transition::Settle),
            (Pending, Failed) => Ok(Transition::Release),
            (from, to) => Err(CoreError::InvalidTransition { from, to }),
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum PaymentMethod {
    /// Physical cash, settled at the counter.
    Cash,
    /// Debit card on an external terminal, settled at the counter.
    Debit,
    /// QR payment confirmed later by a callback.
    Qris,
}

impl PaymentMethod {
    /// Whether settlement arrives asynchronously after checkout.
    pub const fn is_async(&self) -> bool {
        matches!(self, PaymentMethod::Qris)
    }

    /// Status a fresh transaction starts in.
    ///
    /// Immediate methods skip PENDING because stock is already reserved.
    pub const fn initial_status(&self) -> TransactionStatus {
        if self.is_async() {
            TransactionStatus::Pending
        } else {
            TransactionStatus::Success
        }
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// A ledger entry. Created once by checkout, never deleted; only `status`
/// (and `updated_at`) change afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Transaction {
    pub id: i64,
    /// Human-readable `TRX-YYYYMMDD-XXXX`.
    pub order_id: String,
    #[serde(rename = "subtotal")]
    pub subtotal_cents: i64,
    #[serde(rename = "discountTotal")]
    pub discount_total_cents: i64,
    /// Server-computed `subtotal - discount_total`.
    #[serde(rename = "totalAmount")]
    pub total_amount_cents: i64,
    pub payment_method: PaymentMethod,
    pub status: TransactionStatus,
    pub note: Option<String>,
    pub discount_id: Option<i64>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A line item in a transaction.
/// Uses snapshot pattern to freeze item data at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TransactionItem {
    pub id: i64,
    pub transaction_id: i64,
    pub item_id: i64,
    /// Item name at time of sale (frozen).
    pub name_snapshot: String,
    pub quantity: i64,
    /// Selling price in cents at time of sale (frozen).
    #[serde(rename = "price")]
    pub price_cents: i64,
    /// Cost price in cents at time of sale (frozen).
    #[serde(rename = "costPrice")]
    pub cost_price_cents: i64,
}

/// A transaction together with its line items and applied discount.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TransactionDetail {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub items: Vec<TransactionItem>,
    pub discount: Option<Discount>,
}

// =============================================================================
// Checkout Input
// =============================================================================

/// One cart line as sent by a client.
///
/// Only `id` and `quantity` are read. Unknown fields such as a client-side
/// `price` are dropped during deserialization, so they can never influence
/// the total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartLine {
    /// Item id.
    pub id: i64,
    pub quantity: i64,
}

/// Body of a checkout request.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CheckoutRequest {
    pub items: Vec<CartLine>,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub discount_id: Option<i64>,
}

// =============================================================================
// Ledger Queries
// =============================================================================

/// Filters for listing transactions.
///
/// `search` matches an `orderId` substring. Date bounds are UTC calendar
/// days; the end date includes the whole day up to 23:59:59.999.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Pagination block returned with every listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Pagination {
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(total: i64, page: u32, limit: u32) -> Self {
        let limit_i = i64::from(limit.max(1));
        Pagination {
            total,
            page,
            limit,
            total_pages: (total + limit_i - 1) / limit_i,
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

// =============================================================================
// Unit Tests
// =============================================================================
