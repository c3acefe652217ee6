//! # Order IDs
//!
//! Human-readable transaction identifiers: `TRX-YYYYMMDD-XXXX`.
//!
//! ```text
//!   TRX-20260131-7QZ0
//!   ─┬─ ───┬──── ─┬──
//!    │     │      └── 4 random upper-case base-36 chars (36^4 = 1,679,616)
//!    │     └───────── UTC date the checkout ran
//!    └─────────────── fixed prefix
//! ```
//!
//! The suffix is random, so ids are unique only with high probability.
//! The ledger's UNIQUE index on `order_id` catches the rare collision and the
//! checkout engine retries with a fresh id.

use chrono::{NaiveDate, Utc};
use rand::Rng;

/// Fixed prefix of every order id.
pub const ORDER_ID_PREFIX: &str = "TRX";

/// Length of the random suffix.
pub const SUFFIX_LEN: usize = 4;

const BASE36: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Builds an order id for `date` using `rng` for the suffix.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use kasir_core::order_id::{generate_order_id, is_valid_order_id};
///
/// let date = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
/// let id = generate_order_id(date, &mut rand::thread_rng());
/// assert!(id.starts_with("TRX-20260131-"));
/// assert!(is_valid_order_id(&id));
/// ```
pub fn generate_order_id<R: Rng + ?Sized>(date: NaiveDate, rng: &mut R) -> String {
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();

    format!("{}-{}-{}", ORDER_ID_PREFIX, date.format("%Y%m%d"), suffix)
}

/// Builds an order id for today (UTC).
pub fn new_order_id() -> String {
    generate_order_id(Utc::now().date_naive(), &mut rand::thread_rng())
}

/// Checks that `id` matches `TRX-\d{8}-[A-Z0-9]{4}`.
pub fn is_valid_order_id(id: &str) -> bool {
    let mut parts = id.split('-');

    let (Some(prefix), Some(date), Some(suffix), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    prefix == ORDER_ID_PREFIX
        && date.len() == 8
        && date.bytes().all(|b| b.is_ascii_digit())
        && suffix.len() == SUFFIX_LEN
        && suffix
            .bytes()
            .all(|b| b.is_ascii_digit() || b.is_ascii_uppercase())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generated_ids_match_format() {
        let mut rng = StdRng::seed_from_u64(42);
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();

        for _ in 0..500 {
            let id = generate_order_id(date, &mut rng);
            assert!(id.starts_with("TRX-20240309-"), "{id}");
            assert!(is_valid_order_id(&id), "{id}");
        }
    }

    #[test]
    fn test_new_order_id_uses_today() {
        let before = Utc::now().date_naive().format("%Y%m%d").to_string();
        let id = new_order_id();
        let after = Utc::now().date_naive().format("%Y%m%d").to_string();

        assert!(is_valid_order_id(&id));
        // A midnight rollover between the reads leaves two valid dates.
        let stamped = &id[4..12];
        assert!(stamped == before || stamped == after, "{id}");
    }

    #[test]
    fn test_rejects_malformed_ids() {
        assert!(!is_valid_order_id(""));
        assert!(!is_valid_order_id("TRX-2024030-ABCD"));
        assert!(!is_valid_order_id("TRX-20240309-abcd"));
        assert!(!is_valid_order_id("TRX-20240309-ABCDE"));
        assert!(!is_valid_order_id("ORD-20240309-ABCD"));
        assert!(!is_valid_order_id("TRX-20240309-AB-CD"));
    }
}
