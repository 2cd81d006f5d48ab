//! Wallet handlers: create, get, list, status, history, audit.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::{Json, Router};

use crate::api::dto::{
    CreateWalletRequest, PaginationMeta, PaginationParams, SetStatusRequest, TransactionDto,
    TransactionListResponse, WalletListResponse, WalletResponse, WalletSummaryDto,
};
use crate::app_state::AppState;
use crate::domain::WalletId;
use crate::error::{ErrorResponse, LedgerError};

/// `POST /wallets` — Create (or return) the user's wallet.
///
/// Wallets are one-per-user; repeating the request returns the existing
/// wallet with 200 instead of 201.
#[utoipa::path(
    post,
    path = "/api/v1/wallets",
    tag = "Wallets",
    summary = "Create a wallet",
    description = "Creates a wallet for the user, or returns the existing one. Each user has at most one wallet.",
    request_body = CreateWalletRequest,
    responses(
        (status = 201, description = "Wallet created", body = WalletResponse),
        (status = 200, description = "Wallet already existed", body = WalletResponse),
    )
)]
pub async fn create_wallet(
    State(state): State<AppState>,
    Json(req): Json<CreateWalletRequest>,
) -> impl IntoResponse {
    let existed = state
        .wallet_service
        .wallet_by_user(req.user_id)
        .await
        .is_ok();
    let wallet = state.wallet_service.get_or_create_wallet(req.user_id).await;

    let status = if existed {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    (status, Json(WalletResponse::from(&wallet)))
}

/// `GET /wallets` — List all wallets with pagination.
#[utoipa::path(
    get,
    path = "/api/v1/wallets",
    tag = "Wallets",
    summary = "List wallets",
    description = "Returns a paginated list of all wallets.",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated wallet list", body = WalletListResponse),
    )
)]
pub async fn list_wallets(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> impl IntoResponse {
    let params = params.clamped();
    let summaries = state.wallet_service.store().list().await;

    let total = summaries.len() as u32;
    let per_page = params.per_page;
    let page = params.page;
    let total_pages = if total == 0 {
        0
    } else {
        total.div_ceil(per_page)
    };

    let start = params.offset();
    let data: Vec<WalletSummaryDto> = summaries
        .into_iter()
        .skip(start)
        .take(per_page as usize)
        .map(WalletSummaryDto::from)
        .collect();

    Json(WalletListResponse {
        data,
        pagination: PaginationMeta {
            page,
            per_page,
            total,
            total_pages,
        },
    })
}

/// `GET /wallets/:id` — Get wallet details.
///
/// # Errors
///
/// Returns [`LedgerError::WalletNotFound`] if the wallet does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/wallets/{id}",
    tag = "Wallets",
    summary = "Get wallet details",
    description = "Returns full wallet state including both balances and interest qualification.",
    params(
        ("id" = uuid::Uuid, Path, description = "Wallet UUID"),
    ),
    responses(
        (status = 200, description = "Wallet details", body = WalletResponse),
        (status = 404, description = "Wallet not found", body = ErrorResponse),
    )
)]
pub async fn get_wallet(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, LedgerError> {
    let wallet = state
        .wallet_service
        .wallet(WalletId::from_uuid(id))
        .await?;
    Ok(Json(WalletResponse::from(&wallet)))
}

/// `GET /wallets/by-user/:user_id` — Get the user's wallet.
///
/// # Errors
///
/// Returns [`LedgerError::WalletNotFoundForUser`] if the user has no
/// wallet.
#[utoipa::path(
    get,
    path = "/api/v1/wallets/by-user/{user_id}",
    tag = "Wallets",
    summary = "Get a user's wallet",
    params(
        ("user_id" = uuid::Uuid, Path, description = "User UUID"),
    ),
    responses(
        (status = 200, description = "Wallet details", body = WalletResponse),
        (status = 404, description = "User has no wallet", body = ErrorResponse),
    )
)]
pub async fn get_wallet_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, LedgerError> {
    let wallet = state.wallet_service.wallet_by_user(user_id).await?;
    Ok(Json(WalletResponse::from(&wallet)))
}

/// `PATCH /wallets/:id/status` — Transition the wallet's lifecycle
/// status.
///
/// # Errors
///
/// Returns [`LedgerError::WalletNotFound`] for unknown wallets and
/// [`LedgerError::InvalidRequest`] for transitions out of `closed`.
#[utoipa::path(
    patch,
    path = "/api/v1/wallets/{id}/status",
    tag = "Wallets",
    summary = "Change wallet status",
    description = "Transitions the wallet between active, frozen, and closed. Closed is terminal.",
    params(
        ("id" = uuid::Uuid, Path, description = "Wallet UUID"),
    ),
    request_body = SetStatusRequest,
    responses(
        (status = 200, description = "Updated wallet", body = WalletResponse),
        (status = 400, description = "Invalid transition", body = ErrorResponse),
        (status = 404, description = "Wallet not found", body = ErrorResponse),
    )
)]
pub async fn set_wallet_status(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<SetStatusRequest>,
) -> Result<impl IntoResponse, LedgerError> {
    let wallet = state
        .wallet_service
        .set_wallet_status(WalletId::from_uuid(id), req.status)
        .await?;
    Ok(Json(WalletResponse::from(&wallet)))
}

/// `GET /wallets/:id/transactions` — Transaction history in append
/// order.
///
/// # Errors
///
/// Returns [`LedgerError::WalletNotFound`] if the wallet does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/wallets/{id}/transactions",
    tag = "Wallets",
    summary = "Get transaction history",
    params(
        ("id" = uuid::Uuid, Path, description = "Wallet UUID"),
    ),
    responses(
        (status = 200, description = "Transaction history", body = TransactionListResponse),
        (status = 404, description = "Wallet not found", body = ErrorResponse),
    )
)]
pub async fn get_transactions(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, LedgerError> {
    let wallet_id = WalletId::from_uuid(id);
    let transactions = state.wallet_service.transactions(wallet_id).await?;
    let data: Vec<TransactionDto> = transactions.iter().map(TransactionDto::from).collect();
    let total = data.len();
    Ok(Json(TransactionListResponse {
        wallet_id,
        data,
        total,
    }))
}

/// `GET /wallets/:id/audit` — Replay-consistency check.
///
/// # Errors
///
/// Returns [`LedgerError::WalletNotFound`] if the wallet does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/wallets/{id}/audit",
    tag = "Wallets",
    summary = "Audit a wallet",
    description = "Replays the wallet's completed transactions and compares the result with the live balances.",
    params(
        ("id" = uuid::Uuid, Path, description = "Wallet UUID"),
    ),
    responses(
        (status = 200, description = "Audit report", body = crate::api::dto::AuditResponse),
        (status = 404, description = "Wallet not found", body = ErrorResponse),
    )
)]
pub async fn audit_wallet(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, LedgerError> {
    let report = state.wallet_service.audit(WalletId::from_uuid(id)).await?;
    Ok(Json(crate::api::dto::AuditResponse::from(report)))
}

/// Wallet management routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/wallets", post(create_wallet).get(list_wallets))
        .route("/wallets/{id}", get(get_wallet))
        .route("/wallets/by-user/{user_id}", get(get_wallet_by_user))
        .route("/wallets/{id}/status", patch(set_wallet_status))
        .route("/wallets/{id}/transactions", get(get_transactions))
        .route("/wallets/{id}/audit", get(audit_wallet))
}
