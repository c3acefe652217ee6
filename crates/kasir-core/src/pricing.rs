//! # Checkout Pricing
//!
//! Line snapshots, discount computation and totals for a checkout.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  for each cart line (server-held Item, requested quantity)              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  price_line() ──► PricedLine { price, cost, quantity, line_total }      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  subtotal = Σ line_total                                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  discount_amount(discount, subtotal)                                    │
//! │       │   absent / inactive  → 0                                        │
//! │       │   PERCENTAGE         → subtotal × value / 100                   │
//! │       │   FIXED              → value                                    │
//! │       │   then clamp to [0, subtotal]                                   │
//! │       ▼                                                                 │
//! │  total = subtotal − discount   (never negative)                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Prices only ever come from the `Item` record. Nothing in this module
//! accepts a client-supplied price.

use crate::money::Money;
use crate::types::{Discount, DiscountType, Item};

// =============================================================================
// Priced Line
// =============================================================================

/// A cart line priced from the catalog at checkout time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    pub item_id: i64,
    pub name: String,
    pub quantity: i64,
    pub price: Money,
    pub cost_price: Money,
    pub line_total: Money,
}

/// Snapshots `item`'s current prices for `quantity` units.
pub fn price_line(item: &Item, quantity: i64) -> PricedLine {
    let price = item.selling_price();

    PricedLine {
        item_id: item.id,
        name: item.name.clone(),
        quantity,
        price,
        cost_price: item.cost_price(),
        line_total: price.multiply_quantity(quantity),
    }
}

// =============================================================================
// Discounts
// =============================================================================

/// Computes the discount applied to `subtotal`.
///
/// A missing or inactive discount yields zero; it is never an error.
/// The result is clamped so it can never exceed the subtotal.
pub fn discount_amount(discount: Option<&Discount>, subtotal: Money) -> Money {
    let Some(discount) = discount.filter(|d| d.is_active) else {
        return Money::zero();
    };

    let raw = match discount.discount_type {
        DiscountType::Percentage => subtotal.percentage(discount.value),
        DiscountType::Fixed => Money::from_cents(discount.value),
    };

    raw.non_negative().min(subtotal.non_negative())
}

// =============================================================================
// Totals
// =============================================================================

/// Authoritative totals for a checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutTotals {
    pub subtotal: Money,
    pub discount_total: Money,
    pub total_amount: Money,
}

impl CheckoutTotals {
    pub fn compute(lines: &[PricedLine], discount: Option<&Discount>) -> Self {
        let subtotal: Money = lines.iter().map(|l| l.line_total).sum();
        let discount_total = discount_amount(discount, subtotal);

        CheckoutTotals {
            subtotal,
            discount_total,
            total_amount: subtotal - discount_total,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(id: i64, price: i64, cost: i64) -> Item {
        Item {
            id,
            name: format!("Item {id}"),
            category_id: None,
            cost_price_cents: cost,
            selling_price_cents: price,
            stock: 10,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn discount(discount_type: DiscountType, value: i64, is_active: bool) -> Discount {
        Discount {
            id: 1,
            name: "Promo".to_string(),
            discount_type,
            value,
            is_active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_price_line_snapshots_catalog_prices() {
        let line = price_line(&item(3, 12_000, 8_000), 4);
        assert_eq!(line.item_id, 3);
        assert_eq!(line.price.cents(), 12_000);
        assert_eq!(line.cost_price.cents(), 8_000);
        assert_eq!(line.line_total.cents(), 48_000);
    }

    #[test]
    fn test_percentage_discount() {
        let d = discount(DiscountType::Percentage, 15, true);
        assert_eq!(discount_amount(Some(&d), Money::from_cents(20_000)).cents(), 3_000);
    }

    #[test]
    fn test_percentage_value_is_whole_percent() {
        let d = discount(DiscountType::Percentage, 10, true);
        let lines = vec![price_line(&item(1, 10_000, 6_000), 2)];

        let totals = CheckoutTotals::compute(&lines, Some(&d));
        assert_eq!(totals.subtotal.cents(), 20_000);
        assert_eq!(totals.discount_total.cents(), 2_000);
        assert_eq!(totals.total_amount.cents(), 18_000);
    }

    #[test]
    fn test_fixed_discount() {
        let d = discount(DiscountType::Fixed, 2_500, true);
        assert_eq!(discount_amount(Some(&d), Money::from_cents(20_000)).cents(), 2_500);
    }

    #[test]
    fn test_inactive_or_absent_discount_is_zero() {
        let d = discount(DiscountType::Fixed, 2_500, false);
        assert!(discount_amount(Some(&d), Money::from_cents(20_000)).is_zero());
        assert!(discount_amount(None, Money::from_cents(20_000)).is_zero());
    }

    #[test]
    fn test_fixed_discount_larger_than_subtotal_is_clamped() {
        let d = discount(DiscountType::Fixed, 50_000, true);
        let lines = vec![price_line(&item(1, 10_000, 6_000), 2)];

        let totals = CheckoutTotals::compute(&lines, Some(&d));
        assert_eq!(totals.subtotal.cents(), 20_000);
        assert_eq!(totals.discount_total, totals.subtotal);
        assert!(totals.total_amount.is_zero());
    }

    #[test]
    fn test_percentage_over_hundred_is_clamped() {
        let d = discount(DiscountType::Percentage, 150, true);
        let amount = discount_amount(Some(&d), Money::from_cents(9_999));
        assert_eq!(amount.cents(), 9_999);
    }

    #[test]
    fn test_totals_sum_server_prices() {
        let lines = vec![
            price_line(&item(1, 5_000, 3_000), 2),
            price_line(&item(2, 7_500, 4_000), 1),
        ];
        let d = discount(DiscountType::Percentage, 10, true);

        let totals = CheckoutTotals::compute(&lines, Some(&d));
        assert_eq!(totals.subtotal.cents(), 17_500);
        assert_eq!(totals.discount_total.cents(), 1_750);
        assert_eq!(totals.total_amount.cents(), 15_750);
    }
}
