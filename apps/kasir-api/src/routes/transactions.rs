//! Transaction endpoints: checkout, status callback, ledger listing.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::debug;

use kasir_core::validation::{validate_date_range, validate_pagination};
use kasir_core::{CheckoutRequest, Page, TransactionDetail, TransactionQuery, TransactionStatus};

use crate::error::ApiResult;
use crate::AppState;

/// Body of `PATCH /api/transactions/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: TransactionStatus,
}

/// `POST /api/transactions`
///
/// Prices the cart from the catalog, reserves stock and records the sale.
/// Client-supplied prices are never read.
pub async fn create_transaction(
    State(state): State<AppState>,
    payload: Result<Json<CheckoutRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TransactionDetail>)> {
    let Json(request) = payload?;

    let detail = state.db.checkout_engine().checkout(request).await?;

    Ok((StatusCode::CREATED, Json(detail)))
}

/// `PATCH /api/transactions/{id}/status`
///
/// Payment callback. PENDING → FAILED releases the reserved stock.
pub async fn update_status(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<StatusUpdate>, JsonRejection>,
) -> ApiResult<Json<TransactionDetail>> {
    let Path(id) = id?;
    let Json(update) = payload?;

    debug!(transaction_id = id, status = %update.status, "Status update requested");
    let detail = state.db.status_reconciler().set_status(id, update.status).await?;

    Ok(Json(detail))
}

/// `GET /api/transactions?page=&limit=&search=&startDate=&endDate=`
pub async fn list_transactions(
    State(state): State<AppState>,
    query: Result<Query<TransactionQuery>, QueryRejection>,
) -> ApiResult<Json<Page<TransactionDetail>>> {
    let Query(mut query) = query?;

    let (page, limit) = validate_pagination(query.page, query.limit)?;
    validate_date_range(query.start_date, query.end_date)?;
    query.page = Some(page);
    query.limit = Some(limit);

    let page = state.db.transactions().list(&query).await?;

    Ok(Json(page))
}
