//! Interest accrual and audit DTOs.

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::WalletId;
use crate::service::{AccrualOutcome, AuditReport, BatchReport};

/// Response body for `POST /wallets/:id/interest`.
#[derive(Debug, Serialize, ToSchema)]
pub struct AccrualResponse {
    /// Wallet the accrual ran against.
    #[schema(value_type = Uuid)]
    pub wallet_id: WalletId,
    /// Whether interest was credited.
    pub credited: bool,
    /// Credited amount (zero when skipped).
    #[schema(value_type = String)]
    pub amount: Decimal,
    /// Whole days in the accrual period.
    pub days_in_period: i64,
}

impl AccrualResponse {
    /// Builds the response from an engine outcome.
    #[must_use]
    pub fn from_outcome(wallet_id: WalletId, outcome: AccrualOutcome) -> Self {
        Self {
            wallet_id,
            credited: outcome.credited,
            amount: outcome.amount,
            days_in_period: outcome.days_in_period,
        }
    }
}

/// One failed wallet in a batch run.
#[derive(Debug, Serialize, ToSchema)]
pub struct BatchErrorDto {
    /// Wallet that failed.
    #[schema(value_type = Uuid)]
    pub wallet_id: WalletId,
    /// Failure message.
    pub message: String,
}

/// Response body for `POST /interest/run`.
#[derive(Debug, Serialize, ToSchema)]
pub struct BatchRunResponse {
    /// Wallets the batch attempted.
    pub wallets_processed: usize,
    /// Wallets that received a credit.
    pub wallets_credited: usize,
    /// Sum of all credited interest.
    #[schema(value_type = String)]
    pub total_credited: Decimal,
    /// Per-wallet failures.
    pub errors: Vec<BatchErrorDto>,
}

impl From<BatchReport> for BatchRunResponse {
    fn from(report: BatchReport) -> Self {
        Self {
            wallets_processed: report.wallets_processed,
            wallets_credited: report.wallets_credited,
            total_credited: report.total_credited,
            errors: report
                .errors
                .into_iter()
                .map(|(wallet_id, message)| BatchErrorDto { wallet_id, message })
                .collect(),
        }
    }
}

/// Response body for `GET /interest/qualifying`.
#[derive(Debug, Serialize, ToSchema)]
pub struct QualifyingWalletsResponse {
    /// Wallets enabled for daily accrual.
    #[schema(value_type = Vec<Uuid>)]
    pub wallet_ids: Vec<WalletId>,
    /// Number of qualifying wallets.
    pub total: usize,
}

/// Response body for `GET /wallets/:id/audit`.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuditResponse {
    /// Wallet that was audited.
    #[schema(value_type = Uuid)]
    pub wallet_id: WalletId,
    /// Whether replaying history reproduces the live balances.
    pub consistent: bool,
    /// Live cash balance.
    #[schema(value_type = String)]
    pub balance: Decimal,
    /// Live bonus balance.
    #[schema(value_type = String)]
    pub bonus_balance: Decimal,
    /// Cash balance reconstructed from completed transactions.
    #[schema(value_type = String)]
    pub replayed_balance: Decimal,
    /// Bonus balance reconstructed from completed transactions.
    #[schema(value_type = String)]
    pub replayed_bonus_balance: Decimal,
    /// Number of transactions replayed.
    pub transaction_count: usize,
}

impl From<AuditReport> for AuditResponse {
    fn from(report: AuditReport) -> Self {
        Self {
            wallet_id: report.wallet_id,
            consistent: report.consistent,
            balance: report.balance,
            bonus_balance: report.bonus_balance,
            replayed_balance: report.replayed_balance,
            replayed_bonus_balance: report.replayed_bonus_balance,
            transaction_count: report.transaction_count,
        }
    }
}
