//! Database models for the audit tables.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored transaction row from the `wallet_transactions` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredTransaction {
    /// Transaction identifier.
    pub id: Uuid,
    /// Wallet the transaction belongs to.
    pub wallet_id: Uuid,
    /// Owning user.
    pub user_id: Uuid,
    /// Transaction type discriminator (e.g. `"interest_credit"`).
    pub tx_type: String,
    /// Positive magnitude.
    pub amount: Decimal,
    /// Portion applied to the bonus balance.
    pub bonus_portion: Decimal,
    /// Cash balance after the mutation.
    pub balance_after: Decimal,
    /// Bonus balance after the mutation.
    pub bonus_balance_after: Decimal,
    /// Status discriminator (e.g. `"completed"`).
    pub status: String,
    /// Method-specific details as JSONB, pass-through.
    pub method: Option<serde_json::Value>,
    /// Order back-reference.
    pub order_id: Option<Uuid>,
    /// Human-readable description.
    pub description: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A stored accrual row from the `interest_calculations` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredInterestCalculation {
    /// Record identifier.
    pub id: Uuid,
    /// Wallet the interest was computed for.
    pub wallet_id: Uuid,
    /// Principal the interest was computed on.
    pub principal: Decimal,
    /// Annual rate in effect.
    pub annual_rate: Decimal,
    /// Period start.
    pub period_start: DateTime<Utc>,
    /// Period end.
    pub period_end: DateTime<Utc>,
    /// Whole days in the period.
    pub days_in_period: i64,
    /// Credited amount.
    pub amount: Decimal,
    /// Status discriminator (e.g. `"credited"`).
    pub status: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A wallet snapshot row from the `wallet_snapshots` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletSnapshotRow {
    /// Auto-increment row ID.
    pub id: i64,
    /// Wallet that was snapshotted.
    pub wallet_id: Uuid,
    /// Full wallet state as JSONB.
    pub state_json: serde_json::Value,
    /// Snapshot timestamp.
    pub snapshot_at: DateTime<Utc>,
}
