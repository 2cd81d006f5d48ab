//! Funding DTOs: deposits, purchases, refunds, and pending deposit
//! requests.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{
    DepositMethod, DepositRequest, DepositRequestStatus, TransactionStatus, TransactionType,
    WalletId, WalletTransaction,
};
use crate::service::{DepositReceipt, PurchaseReceipt, RefundReceipt};

/// Request body for `POST /wallets/:id/deposit`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DepositBody {
    /// Owning user, checked against the wallet.
    pub user_id: Uuid,
    /// Deposit amount, must be positive.
    #[schema(value_type = String)]
    pub amount: Decimal,
    /// Method-specific details, tagged by `method`.
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub method: DepositMethod,
}

/// Response body for `POST /wallets/:id/deposit`.
#[derive(Debug, Serialize, ToSchema)]
pub struct DepositResponse {
    /// Audit record for the deposit.
    pub transaction_id: Uuid,
    /// Whether this deposit triggered interest qualification.
    pub qualifies_for_bonus: bool,
    /// Immediate bonus credited with the deposit (always `"0"`).
    #[schema(value_type = String)]
    pub bonus_amount: Decimal,
    /// Cash balance after the deposit.
    #[schema(value_type = String)]
    pub balance_after: Decimal,
    /// Cumulative deposits after this one.
    #[schema(value_type = String)]
    pub total_deposited: Decimal,
}

impl From<DepositReceipt> for DepositResponse {
    fn from(receipt: DepositReceipt) -> Self {
        Self {
            transaction_id: receipt.transaction_id,
            qualifies_for_bonus: receipt.qualifies_for_bonus,
            bonus_amount: receipt.bonus_amount,
            balance_after: receipt.balance_after,
            total_deposited: receipt.total_deposited,
        }
    }
}

/// Request body for `POST /wallets/:id/purchase`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PurchaseBody {
    /// Owning user, checked against the wallet.
    pub user_id: Uuid,
    /// Purchase amount, must be positive.
    #[schema(value_type = String)]
    pub amount: Decimal,
    /// Order back-reference.
    pub order_id: Uuid,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
}

/// Response body for `POST /wallets/:id/purchase`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PurchaseResponse {
    /// Audit record for the purchase.
    pub transaction_id: Uuid,
    /// Portion drawn from the bonus balance.
    #[schema(value_type = String)]
    pub bonus_used: Decimal,
    /// Portion drawn from the cash balance.
    #[schema(value_type = String)]
    pub main_used: Decimal,
    /// Cash balance after the debit.
    #[schema(value_type = String)]
    pub balance_after: Decimal,
    /// Bonus balance after the debit.
    #[schema(value_type = String)]
    pub bonus_balance_after: Decimal,
}

impl From<PurchaseReceipt> for PurchaseResponse {
    fn from(receipt: PurchaseReceipt) -> Self {
        Self {
            transaction_id: receipt.transaction_id,
            bonus_used: receipt.bonus_used,
            main_used: receipt.main_used,
            balance_after: receipt.balance_after,
            bonus_balance_after: receipt.bonus_balance_after,
        }
    }
}

/// Request body for `POST /wallets/:id/refund`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RefundBody {
    /// Owning user, checked against the wallet.
    pub user_id: Uuid,
    /// Refund amount, must be positive.
    #[schema(value_type = String)]
    pub amount: Decimal,
    /// Order being refunded.
    pub order_id: Uuid,
}

/// Response body for `POST /wallets/:id/refund`.
#[derive(Debug, Serialize, ToSchema)]
pub struct RefundResponse {
    /// Audit record for the refund.
    pub transaction_id: Uuid,
    /// Amount credited to the cash balance.
    #[schema(value_type = String)]
    pub amount: Decimal,
    /// Cash balance after the credit.
    #[schema(value_type = String)]
    pub balance_after: Decimal,
}

impl From<RefundReceipt> for RefundResponse {
    fn from(receipt: RefundReceipt) -> Self {
        Self {
            transaction_id: receipt.transaction_id,
            amount: receipt.amount,
            balance_after: receipt.balance_after,
        }
    }
}

/// Request body for `POST /deposit-requests`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitDepositRequestBody {
    /// User announcing the deposit.
    pub user_id: Uuid,
    /// Announced amount, must be positive.
    #[schema(value_type = String)]
    pub amount: Decimal,
    /// Method-specific details, tagged by `method`.
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub method: DepositMethod,
}

/// Pending deposit request state for submit/confirm/reject responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct DepositRequestDto {
    /// Request identifier.
    pub request_id: Uuid,
    /// User who announced the deposit.
    pub user_id: Uuid,
    /// Announced amount.
    #[schema(value_type = String)]
    pub amount: Decimal,
    /// Method discriminator.
    pub method: &'static str,
    /// Settlement status.
    #[schema(value_type = String)]
    pub status: DepositRequestStatus,
    /// Submission timestamp.
    pub created_at: DateTime<Utc>,
    /// Settlement timestamp, once confirmed or rejected.
    pub settled_at: Option<DateTime<Utc>>,
}

impl From<&DepositRequest> for DepositRequestDto {
    fn from(request: &DepositRequest) -> Self {
        Self {
            request_id: request.id,
            user_id: request.user_id,
            amount: request.amount,
            method: request.method.as_str(),
            status: request.status,
            created_at: request.created_at,
            settled_at: request.settled_at,
        }
    }
}

/// Response body for `POST /deposit-requests/:id/confirm`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ConfirmDepositResponse {
    /// Settled request state.
    pub request: DepositRequestDto,
    /// Receipt for the applied deposit.
    pub deposit: DepositResponse,
}

/// Single transaction record for history responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionDto {
    /// Transaction identifier.
    pub transaction_id: Uuid,
    /// Wallet the transaction belongs to.
    #[schema(value_type = Uuid)]
    pub wallet_id: WalletId,
    /// Kind of mutation.
    #[schema(value_type = String)]
    pub tx_type: TransactionType,
    /// Positive magnitude.
    #[schema(value_type = String)]
    pub amount: Decimal,
    /// Portion applied to the bonus balance.
    #[schema(value_type = String)]
    pub bonus_portion: Decimal,
    /// Cash balance after the mutation.
    #[schema(value_type = String)]
    pub balance_after: Decimal,
    /// Bonus balance after the mutation.
    #[schema(value_type = String)]
    pub bonus_balance_after: Decimal,
    /// Processing status.
    #[schema(value_type = String)]
    pub status: TransactionStatus,
    /// Order back-reference for purchase/refund records.
    pub order_id: Option<Uuid>,
    /// Human-readable description.
    pub description: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<&WalletTransaction> for TransactionDto {
    fn from(tx: &WalletTransaction) -> Self {
        Self {
            transaction_id: tx.id,
            wallet_id: tx.wallet_id,
            tx_type: tx.tx_type,
            amount: tx.amount,
            bonus_portion: tx.bonus_portion,
            balance_after: tx.balance_after,
            bonus_balance_after: tx.bonus_balance_after,
            status: tx.status,
            order_id: tx.order_id,
            description: tx.description.clone(),
            created_at: tx.created_at,
        }
    }
}

/// Transaction history response for `GET /wallets/:id/transactions`.
#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionListResponse {
    /// Wallet the history belongs to.
    #[schema(value_type = Uuid)]
    pub wallet_id: WalletId,
    /// Transactions in append order.
    pub data: Vec<TransactionDto>,
    /// Number of records returned.
    pub total: usize,
}
