//! System endpoints: health check and deposit method catalog.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// Supported deposit method info.
#[derive(Debug, Serialize, ToSchema)]
struct DepositMethodInfo {
    method: &'static str,
    description: &'static str,
    requires_confirmation: bool,
}

/// `GET /config/deposit-methods` — List supported deposit methods.
#[utoipa::path(
    get,
    path = "/config/deposit-methods",
    tag = "System",
    summary = "List supported deposit methods",
    description = "Returns metadata for every deposit method the ledger accepts.",
    responses(
        (status = 200, description = "Deposit method catalog", body = Vec<DepositMethodInfo>),
    )
)]
pub async fn deposit_methods_handler() -> impl IntoResponse {
    let methods = vec![
        DepositMethodInfo {
            method: "bank_transfer",
            description: "Bank wire or SEPA transfer",
            requires_confirmation: true,
        },
        DepositMethodInfo {
            method: "crypto",
            description: "Cryptocurrency deposit confirmed on-chain",
            requires_confirmation: true,
        },
        DepositMethodInfo {
            method: "card",
            description: "Card top-up settled by the payment provider",
            requires_confirmation: false,
        },
        DepositMethodInfo {
            method: "manual",
            description: "Manual adjustment by an operator",
            requires_confirmation: false,
        },
    ];
    (StatusCode::OK, Json(methods))
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config/deposit-methods", get(deposit_methods_handler))
}
