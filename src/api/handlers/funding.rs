//! Funding handlers: deposits, purchases, refunds, and the pending
//! deposit request lifecycle.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    ConfirmDepositResponse, DepositBody, DepositRequestDto, DepositResponse, PurchaseBody,
    PurchaseResponse, RefundBody, RefundResponse, SubmitDepositRequestBody,
};
use crate::app_state::AppState;
use crate::domain::WalletId;
use crate::error::{ErrorResponse, LedgerError};

/// `POST /wallets/:id/deposit` — Apply a confirmed deposit directly.
///
/// # Errors
///
/// Returns [`LedgerError::InvalidRequest`] for non-positive amounts or a
/// wallet/user mismatch, [`LedgerError::WalletNotActive`] for frozen or
/// closed wallets.
#[utoipa::path(
    post,
    path = "/api/v1/wallets/{id}/deposit",
    tag = "Funding",
    summary = "Apply a deposit",
    description = "Credits the cash balance atomically. The wallet's first deposit decides interest qualification, permanently.",
    params(
        ("id" = uuid::Uuid, Path, description = "Wallet UUID"),
    ),
    request_body = DepositBody,
    responses(
        (status = 200, description = "Deposit applied", body = DepositResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Wallet not found", body = ErrorResponse),
        (status = 409, description = "Wallet not active", body = ErrorResponse),
    )
)]
pub async fn deposit(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<DepositBody>,
) -> Result<impl IntoResponse, LedgerError> {
    let receipt = state
        .wallet_service
        .process_deposit(WalletId::from_uuid(id), req.user_id, req.amount, req.method)
        .await?;
    Ok(Json(DepositResponse::from(receipt)))
}

/// `POST /wallets/:id/purchase` — Debit a purchase, bonus before cash.
///
/// # Errors
///
/// Returns [`LedgerError::InsufficientFunds`] on shortfall with the
/// available/required amounts in the error details.
#[utoipa::path(
    post,
    path = "/api/v1/wallets/{id}/purchase",
    tag = "Funding",
    summary = "Debit a purchase",
    description = "Draws the bonus balance down before the cash balance, atomically. On insufficient total funds nothing moves.",
    params(
        ("id" = uuid::Uuid, Path, description = "Wallet UUID"),
    ),
    request_body = PurchaseBody,
    responses(
        (status = 200, description = "Purchase debited", body = PurchaseResponse),
        (status = 404, description = "Wallet not found", body = ErrorResponse),
        (status = 409, description = "Wallet not active", body = ErrorResponse),
        (status = 422, description = "Insufficient funds", body = ErrorResponse),
    )
)]
pub async fn purchase(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<PurchaseBody>,
) -> Result<impl IntoResponse, LedgerError> {
    let receipt = state
        .wallet_service
        .use_wallet_for_purchase(
            WalletId::from_uuid(id),
            req.user_id,
            req.amount,
            req.order_id,
            &req.description,
        )
        .await?;
    Ok(Json(PurchaseResponse::from(receipt)))
}

/// `POST /wallets/:id/refund` — Reverse a purchase into the cash
/// balance.
///
/// # Errors
///
/// Returns [`LedgerError::WalletNotFound`] or
/// [`LedgerError::WalletNotActive`] on precondition failures.
#[utoipa::path(
    post,
    path = "/api/v1/wallets/{id}/refund",
    tag = "Funding",
    summary = "Refund a purchase",
    description = "Credits the full refund amount to the cash balance regardless of the original bonus/cash split.",
    params(
        ("id" = uuid::Uuid, Path, description = "Wallet UUID"),
    ),
    request_body = RefundBody,
    responses(
        (status = 200, description = "Refund credited", body = RefundResponse),
        (status = 404, description = "Wallet not found", body = ErrorResponse),
        (status = 409, description = "Wallet not active", body = ErrorResponse),
    )
)]
pub async fn refund(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<RefundBody>,
) -> Result<impl IntoResponse, LedgerError> {
    let receipt = state
        .wallet_service
        .refund_purchase(WalletId::from_uuid(id), req.user_id, req.amount, req.order_id)
        .await?;
    Ok(Json(RefundResponse::from(receipt)))
}

/// `POST /deposit-requests` — Announce a pending external deposit.
///
/// # Errors
///
/// Returns [`LedgerError::InvalidRequest`] for non-positive amounts.
#[utoipa::path(
    post,
    path = "/api/v1/deposit-requests",
    tag = "Funding",
    summary = "Submit a deposit request",
    description = "Announces an external deposit awaiting confirmation. No balance changes until the request is confirmed.",
    request_body = SubmitDepositRequestBody,
    responses(
        (status = 201, description = "Request submitted", body = DepositRequestDto),
        (status = 400, description = "Invalid request", body = ErrorResponse),
    )
)]
pub async fn submit_deposit_request(
    State(state): State<AppState>,
    Json(req): Json<SubmitDepositRequestBody>,
) -> Result<impl IntoResponse, LedgerError> {
    let request = state
        .wallet_service
        .submit_deposit_request(req.user_id, req.amount, req.method)
        .await?;
    Ok((StatusCode::CREATED, Json(DepositRequestDto::from(&request))))
}

/// `GET /deposit-requests/:id` — Get a deposit request's state.
///
/// # Errors
///
/// Returns [`LedgerError::DepositRequestNotFound`] for unknown requests.
#[utoipa::path(
    get,
    path = "/api/v1/deposit-requests/{id}",
    tag = "Funding",
    summary = "Get a deposit request",
    params(
        ("id" = uuid::Uuid, Path, description = "Deposit request UUID"),
    ),
    responses(
        (status = 200, description = "Request state", body = DepositRequestDto),
        (status = 404, description = "Request not found", body = ErrorResponse),
    )
)]
pub async fn get_deposit_request(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, LedgerError> {
    let request = state.wallet_service.store().pending_deposit(id).await?;
    Ok(Json(DepositRequestDto::from(&request)))
}

/// `POST /deposit-requests/:id/confirm` — Settle a pending deposit into
/// the user's wallet.
///
/// # Errors
///
/// Returns [`LedgerError::DepositRequestNotFound`] for unknown or
/// already-settled requests; deposit errors leave the request pending.
#[utoipa::path(
    post,
    path = "/api/v1/deposit-requests/{id}/confirm",
    tag = "Funding",
    summary = "Confirm a deposit request",
    description = "Applies the announced amount to the user's wallet, creating the wallet on first use. Settled requests cannot be confirmed again.",
    params(
        ("id" = uuid::Uuid, Path, description = "Deposit request UUID"),
    ),
    responses(
        (status = 200, description = "Deposit applied", body = ConfirmDepositResponse),
        (status = 404, description = "Request not found or settled", body = ErrorResponse),
    )
)]
pub async fn confirm_deposit_request(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, LedgerError> {
    let (request, receipt) = state.wallet_service.confirm_deposit_request(id).await?;
    Ok(Json(ConfirmDepositResponse {
        request: DepositRequestDto::from(&request),
        deposit: DepositResponse::from(receipt),
    }))
}

/// `POST /deposit-requests/:id/reject` — Reject a pending deposit.
///
/// # Errors
///
/// Returns [`LedgerError::DepositRequestNotFound`] for unknown or
/// already-settled requests.
#[utoipa::path(
    post,
    path = "/api/v1/deposit-requests/{id}/reject",
    tag = "Funding",
    summary = "Reject a deposit request",
    description = "Marks the request rejected. Terminal; the amount never reaches any wallet.",
    params(
        ("id" = uuid::Uuid, Path, description = "Deposit request UUID"),
    ),
    responses(
        (status = 200, description = "Request rejected", body = DepositRequestDto),
        (status = 404, description = "Request not found or settled", body = ErrorResponse),
    )
)]
pub async fn reject_deposit_request(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, LedgerError> {
    let request = state.wallet_service.reject_deposit_request(id).await?;
    Ok(Json(DepositRequestDto::from(&request)))
}

/// Funding routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/wallets/{id}/deposit", post(deposit))
        .route("/wallets/{id}/purchase", post(purchase))
        .route("/wallets/{id}/refund", post(refund))
        .route("/deposit-requests", post(submit_deposit_request))
        .route("/deposit-requests/{id}", get(get_deposit_request))
        .route(
            "/deposit-requests/{id}/confirm",
            post(confirm_deposit_request),
        )
        .route(
            "/deposit-requests/{id}/reject",
            post(reject_deposit_request),
        )
}
