//! # Transaction Repository
//!
//! Read side of the Transaction Ledger. Rows are written only by the
//! checkout engine and the status reconciler, through a unit of work.
//!
//! ## Listing
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GET /api/transactions?search=0131&startDate=2026-01-01&endDate=...    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  WHERE instr(order_id, 'SEARCH') > 0          (substring, upper-cased) │
//! │    AND created_at >= startDate 00:00:00.000                            │
//! │    AND created_at <= endDate   23:59:59.999   (whole end day)          │
//! │  ORDER BY created_at DESC, id DESC                                     │
//! │  LIMIT limit OFFSET (page - 1) * limit                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  { data: [...], pagination: { total, page, limit, totalPages } }      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use crate::repository::{DISCOUNT_COLUMNS, LINE_COLUMNS, TRANSACTION_COLUMNS};
use kasir_core::{
    Discount, Page, Pagination, Transaction, TransactionDetail, TransactionItem,
    TransactionQuery, TransactionStatus, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT,
};

/// Number of ledger entries in each status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub pending: i64,
    pub success: i64,
    pub failed: i64,
}

impl StatusCounts {
    pub fn total(&self) -> i64 {
        self.pending + self.success + self.failed
    }
}

/// Repository for ledger reads.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Gets a transaction header by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Transaction>> {
        let sql = format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = ?1");

        let transaction = sqlx::query_as::<_, Transaction>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(transaction)
    }

    /// Gets a transaction with its line items and discount.
    pub async fn get_detail(&self, id: i64) -> DbResult<Option<TransactionDetail>> {
        let Some(transaction) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let mut details = self.attach_details(vec![transaction]).await?;
        Ok(details.pop())
    }

    /// Lists transactions, newest first, one page at a time.
    ///
    /// Page and limit are expected to be validated by the caller; out of
    /// range values are clamped rather than rejected here.
    pub async fn list(&self, query: &TransactionQuery) -> DbResult<Page<TransactionDetail>> {
        let page = query.page.unwrap_or(1).max(1);
        let limit = query
            .limit
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT);
        let offset = i64::from(page - 1) * i64::from(limit);

        let filter = LedgerFilter::from_query(query);
        debug!(page, limit, ?filter, "Listing transactions");

        let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM transactions");
        filter.push_where(&mut count_query);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut select = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions"
        ));
        filter.push_where(&mut select);
        select
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(i64::from(limit))
            .push(" OFFSET ")
            .push_bind(offset);

        let rows: Vec<Transaction> = select
            .build_query_as::<Transaction>()
            .fetch_all(&self.pool)
            .await?;

        let data = self.attach_details(rows).await?;

        Ok(Page {
            data,
            pagination: Pagination::new(total, page, limit),
        })
    }

    /// Counts ledger entries per status.
    pub async fn count_by_status(&self) -> DbResult<StatusCounts> {
        let rows: Vec<(TransactionStatus, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM transactions GROUP BY status")
                .fetch_all(&self.pool)
                .await?;

        let mut counts = StatusCounts::default();
        for (status, count) in rows {
            match status {
                TransactionStatus::Pending => counts.pending = count,
                TransactionStatus::Success => counts.success = count,
                TransactionStatus::Failed => counts.failed = count,
            }
        }

        Ok(counts)
    }

    /// Loads line items and discounts for a batch of headers, keeping order.
    async fn attach_details(&self, rows: Vec<Transaction>) -> DbResult<Vec<TransactionDetail>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut lines_query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {LINE_COLUMNS} FROM transaction_items WHERE transaction_id IN ("
        ));
        let mut ids = lines_query.separated(", ");
        for row in &rows {
            ids.push_bind(row.id);
        }
        ids.push_unseparated(") ORDER BY id");

        let lines: Vec<TransactionItem> = lines_query
            .build_query_as::<TransactionItem>()
            .fetch_all(&self.pool)
            .await?;

        let mut lines_by_tx: HashMap<i64, Vec<TransactionItem>> = HashMap::new();
        for line in lines {
            lines_by_tx.entry(line.transaction_id).or_default().push(line);
        }

        let mut discounts: HashMap<i64, Discount> = HashMap::new();
        let discount_ids: Vec<i64> = rows.iter().filter_map(|r| r.discount_id).collect();
        if !discount_ids.is_empty() {
            let mut discount_query = QueryBuilder::<Sqlite>::new(format!(
                "SELECT {DISCOUNT_COLUMNS} FROM discounts WHERE id IN ("
            ));
            let mut ids = discount_query.separated(", ");
            for id in discount_ids {
                ids.push_bind(id);
            }
            ids.push_unseparated(")");

            for discount in discount_query
                .build_query_as::<Discount>()
                .fetch_all(&self.pool)
                .await?
            {
                discounts.insert(discount.id, discount);
            }
        }

        Ok(rows
            .into_iter()
            .map(|transaction| TransactionDetail {
                items: lines_by_tx.remove(&transaction.id).unwrap_or_default(),
                discount: transaction
                    .discount_id
                    .and_then(|id| discounts.get(&id).cloned()),
                transaction,
            })
            .collect())
    }
}

// =============================================================================
// Filters
// =============================================================================

/// Resolved WHERE-clause values for a listing.
#[derive(Debug, Clone, Default)]
struct LedgerFilter {
    order_id_fragment: Option<String>,
    created_from: Option<DateTime<Utc>>,
    created_until: Option<DateTime<Utc>>,
}

impl LedgerFilter {
    fn from_query(query: &TransactionQuery) -> Self {
        LedgerFilter {
            order_id_fragment: query
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_uppercase),
            created_from: query.start_date.map(start_of_day),
            created_until: query.end_date.map(end_of_day),
        }
    }

    fn push_where(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        let mut keyword = " WHERE ";

        if let Some(fragment) = &self.order_id_fragment {
            qb.push(keyword)
                .push("instr(order_id, ")
                .push_bind(fragment.clone())
                .push(") > 0");
            keyword = " AND ";
        }

        if let Some(from) = self.created_from {
            qb.push(keyword).push("created_at >= ").push_bind(from);
            keyword = " AND ";
        }

        if let Some(until) = self.created_until {
            qb.push(keyword).push("created_at <= ").push_bind(until);
        }
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// 23:59:59.999 UTC on `date`.
fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    start_of_day(date) + Duration::days(1) - Duration::milliseconds(1)
}

// =============================================================================
// Unit Tests
// =============================================================================
