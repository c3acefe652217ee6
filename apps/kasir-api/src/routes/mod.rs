//! HTTP routes.
//!
//! ```text
//! POST  /api/transactions              checkout           201 TransactionDetail
//! PATCH /api/transactions/{id}/status  payment callback   200 TransactionDetail
//! GET   /api/transactions              ledger page        200 Page<TransactionDetail>
//! GET   /health                        liveness + counts  200 / 503
//! ```

pub mod transactions;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde_json::json;
use tracing::warn;

use crate::AppState;

/// Routes mounted under `/api`.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route(
            "/transactions",
            get(transactions::list_transactions).post(transactions::create_transaction),
        )
        .route(
            "/transactions/{id}/status",
            patch(transactions::update_status),
        )
}

/// Health check endpoint.
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    if !state.db.health_check().await {
        warn!("Health check failed: database unreachable");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unavailable", "database": "down" })),
        );
    }

    match state.db.transactions().count_by_status().await {
        Ok(counts) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "database": "up", "transactions": counts })),
        ),
        Err(e) => {
            warn!(error = %e, "Health check failed: ledger unreadable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable", "database": "degraded" })),
            )
        }
    }
}
