//! Interest accrual handlers: per-wallet accrual, batch runs, and the
//! qualifying-wallet listing.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{AccrualResponse, BatchRunResponse, QualifyingWalletsResponse};
use crate::app_state::AppState;
use crate::domain::WalletId;
use crate::error::{ErrorResponse, LedgerError};

/// `POST /wallets/:id/interest` — Run accrual for one wallet now.
///
/// Idempotent within a calendar day; a same-day re-run reports
/// `credited: false` without touching balances.
///
/// # Errors
///
/// Returns [`LedgerError::WalletNotFound`] if the wallet does not exist.
#[utoipa::path(
    post,
    path = "/api/v1/wallets/{id}/interest",
    tag = "Interest",
    summary = "Accrue interest for one wallet",
    description = "Computes and credits daily interest on the cash balance to the bonus balance. Skips unqualified, inactive, and already-accrued wallets.",
    params(
        ("id" = uuid::Uuid, Path, description = "Wallet UUID"),
    ),
    responses(
        (status = 200, description = "Accrual outcome", body = AccrualResponse),
        (status = 404, description = "Wallet not found", body = ErrorResponse),
    )
)]
pub async fn accrue_wallet(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, LedgerError> {
    let wallet_id = WalletId::from_uuid(id);
    let outcome = state
        .accrual_engine
        .calculate_and_credit_interest(wallet_id)
        .await?;
    Ok(Json(AccrualResponse::from_outcome(wallet_id, outcome)))
}

/// `POST /interest/run` — Run the accrual batch for all qualifying
/// wallets, same as the midnight scheduler does.
#[utoipa::path(
    post,
    path = "/api/v1/interest/run",
    tag = "Interest",
    summary = "Run the accrual batch",
    description = "Runs accrual for every qualifying wallet. Per-wallet failures are collected in the report, never abort the batch.",
    responses(
        (status = 200, description = "Batch report", body = BatchRunResponse),
    )
)]
pub async fn run_batch(State(state): State<AppState>) -> impl IntoResponse {
    let report = state.accrual_engine.run_batch().await;
    Json(BatchRunResponse::from(report))
}

/// `GET /interest/qualifying` — List wallets enabled for accrual.
#[utoipa::path(
    get,
    path = "/api/v1/interest/qualifying",
    tag = "Interest",
    summary = "List qualifying wallets",
    responses(
        (status = 200, description = "Qualifying wallets", body = QualifyingWalletsResponse),
    )
)]
pub async fn qualifying_wallets(State(state): State<AppState>) -> impl IntoResponse {
    let wallet_ids = state.wallet_service.store().qualifying_wallets().await;
    let total = wallet_ids.len();
    Json(QualifyingWalletsResponse { wallet_ids, total })
}

/// Interest accrual routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/wallets/{id}/interest", post(accrue_wallet))
        .route("/interest/run", post(run_batch))
        .route("/interest/qualifying", get(qualifying_wallets))
}
