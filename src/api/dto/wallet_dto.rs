//! Wallet DTOs for create, get, list, and status operations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::common_dto::PaginationMeta;
use crate::domain::{Wallet, WalletId, WalletStatus, WalletSummary};

/// Request body for `POST /wallets`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateWalletRequest {
    /// Owning user. At most one wallet exists per user; repeating the
    /// request returns the existing wallet.
    pub user_id: Uuid,
}

/// Full wallet state for get/create responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct WalletResponse {
    /// Wallet identifier.
    #[schema(value_type = Uuid)]
    pub wallet_id: WalletId,
    /// Owning user.
    pub user_id: Uuid,
    /// Cash balance.
    #[schema(value_type = String)]
    pub balance: Decimal,
    /// Bonus balance (accrued interest).
    #[schema(value_type = String)]
    pub bonus_balance: Decimal,
    /// Total spendable funds (cash plus bonus).
    #[schema(value_type = String)]
    pub available: Decimal,
    /// Cumulative deposits over the wallet's lifetime.
    #[schema(value_type = String)]
    pub total_deposited: Decimal,
    /// Whether daily interest accrual is enabled.
    pub qualifies_for_interest: bool,
    /// Timestamp of the first deposit, if any.
    pub first_deposit_date: Option<DateTime<Utc>>,
    /// End of the last accrual period applied to this wallet.
    pub last_interest_calculation: Option<DateTime<Utc>>,
    /// Lifecycle status.
    #[schema(value_type = String)]
    pub status: WalletStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last balance mutation.
    pub updated_at: DateTime<Utc>,
}

impl From<&Wallet> for WalletResponse {
    fn from(wallet: &Wallet) -> Self {
        Self {
            wallet_id: wallet.id,
            user_id: wallet.user_id,
            balance: wallet.balance,
            bonus_balance: wallet.bonus_balance,
            available: wallet.available(),
            total_deposited: wallet.total_deposited,
            qualifies_for_interest: wallet.qualifies_for_interest,
            first_deposit_date: wallet.first_deposit_date,
            last_interest_calculation: wallet.last_interest_calculation,
            status: wallet.status,
            created_at: wallet.created_at,
            updated_at: wallet.last_modified_at,
        }
    }
}

/// Request body for `PATCH /wallets/:id/status`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetStatusRequest {
    /// Target lifecycle status. `closed` is terminal.
    #[schema(value_type = String)]
    pub status: WalletStatus,
}

/// Wallet summary for list responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct WalletSummaryDto {
    /// Wallet identifier.
    #[schema(value_type = Uuid)]
    pub wallet_id: WalletId,
    /// Owning user.
    pub user_id: Uuid,
    /// Cash balance.
    #[schema(value_type = String)]
    pub balance: Decimal,
    /// Bonus balance.
    #[schema(value_type = String)]
    pub bonus_balance: Decimal,
    /// Whether daily interest accrual is enabled.
    pub qualifies_for_interest: bool,
    /// Lifecycle status.
    #[schema(value_type = String)]
    pub status: WalletStatus,
}

impl From<WalletSummary> for WalletSummaryDto {
    fn from(summary: WalletSummary) -> Self {
        Self {
            wallet_id: summary.wallet_id,
            user_id: summary.user_id,
            balance: summary.balance,
            bonus_balance: summary.bonus_balance,
            qualifies_for_interest: summary.qualifies_for_interest,
            status: summary.status,
        }
    }
}

/// Paginated list response for `GET /wallets`.
#[derive(Debug, Serialize, ToSchema)]
pub struct WalletListResponse {
    /// Wallet summaries.
    pub data: Vec<WalletSummaryDto>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}
