//! # Kasir API
//!
//! HTTP surface of the checkout core.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Client ──► CorsLayer ──► TraceLayer ──► Router                        │
//! │                                            │                            │
//! │                    ┌───────────────────────┼──────────────────────┐     │
//! │                    ▼                       ▼                      ▼     │
//! │            CheckoutEngine         StatusReconciler    TransactionRepo  │
//! │                    │                       │                      │     │
//! │                    └──────────── SQLite (WAL) ───────────────────┘     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Handlers hold no state of their own; everything goes through [`AppState`].

pub mod config;
pub mod error;
pub mod routes;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use kasir_db::Database;

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        AppState { db }
    }
}

/// Builds the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health_handler))
        .nest("/api", routes::api_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// =============================================================================
// Router Tests
// =============================================================================
