//! # kasir-core: Pure Business Logic for Kasir
//!
//! This crate holds the rules of the checkout core as pure functions with
//! zero I/O dependencies. The database crate drives them inside its atomic
//! units of work.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Kasir Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Frontend (SPA)                               │   │
//! │  │    Catalog UI ──► Cart UI ──► Payment UI ──► History UI        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP / JSON                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    kasir-api (axum)                             │   │
//! │  │    POST /transactions, PATCH /transactions/{id}/status          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    kasir-db                                     │   │
//! │  │    UnitOfWork, CheckoutEngine, StatusReconciler                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ calls                                  │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ kasir-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌─────────┐ ┌────────┐  │   │
//! │  │   │  types  │ │  money  │ │ pricing  │ │order_id │ │validate│  │   │
//! │  │   └─────────┘ └─────────┘ └──────────┘ └─────────┘ └────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Item, Discount, Transaction, status machine)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`pricing`] - Line snapshots, discount computation, checkout totals
//! - [`order_id`] - `TRX-YYYYMMDD-XXXX` order id generation
//! - [`validation`] - Cart and query validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use kasir_core::money::Money;
//! use kasir_core::pricing::discount_amount;
//! use kasir_core::{Discount, DiscountType};
//! use chrono::Utc;
//!
//! let ten_off = Discount {
//!     id: 1,
//!     name: "Promo".to_string(),
//!     discount_type: DiscountType::Percentage,
//!     value: 10, // 10%
//!     is_active: true,
//!     created_at: Utc::now(),
//!     updated_at: Utc::now(),
//! };
//!
//! let amount = discount_amount(Some(&ten_off), Money::from_cents(25_000));
//! assert_eq!(amount.cents(), 2_500);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod order_id;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of lines accepted in a single checkout.
///
/// ## Business Reason
/// Bounds the size of one atomic unit of work (one stock row per line).
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity for a single cart line.
///
/// Prevents accidental over-ordering (typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum length of a free-text transaction note.
pub const MAX_NOTE_LENGTH: usize = 500;

/// Page size used when a listing request does not name one.
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Largest page size a listing request may ask for.
pub const MAX_PAGE_LIMIT: u32 = 100;
