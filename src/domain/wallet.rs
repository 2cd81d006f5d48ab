//! Wallet aggregate: per-user cash and bonus balances.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::WalletId;

/// Lifecycle status of a wallet.
///
/// Frozen and closed wallets reject deposits and debits. A wallet is never
/// deleted, only transitioned to `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletStatus {
    /// Wallet accepts deposits and debits.
    Active,
    /// Temporarily blocked; no mutations allowed.
    Frozen,
    /// Permanently closed; no mutations allowed.
    Closed,
}

impl WalletStatus {
    /// Returns the status as a static string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Frozen => "frozen",
            Self::Closed => "closed",
        }
    }
}

/// Per-user wallet holding a cash balance and a bonus balance.
///
/// Both balances are non-negative at all times: every mutation that would
/// drive either below zero is rejected before anything is written. The
/// bonus balance holds accrued interest and is usable only for purchases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    /// Unique wallet identifier (immutable after creation).
    pub id: WalletId,

    /// Owning user (immutable after creation, unique across wallets).
    pub user_id: Uuid,

    /// Cash balance from deposits, 2 fractional digits.
    pub balance: Decimal,

    /// Bonus balance from accrued interest.
    pub bonus_balance: Decimal,

    /// Cumulative cash deposits; monotonically non-decreasing. Interest
    /// credits never touch this field.
    pub total_deposited: Decimal,

    /// Set true exactly once, when the first deposit reaches the
    /// qualifying threshold. Irreversible either way.
    pub qualifies_for_interest: bool,

    /// Timestamp of the first successful deposit, set once.
    pub first_deposit_date: Option<DateTime<Utc>>,

    /// Timestamp of the last accrual run touching this wallet;
    /// monotonically increasing.
    pub last_interest_calculation: Option<DateTime<Utc>>,

    /// Lifecycle status.
    pub status: WalletStatus,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Timestamp of the last balance mutation.
    pub last_modified_at: DateTime<Utc>,
}

impl Wallet {
    /// Creates a new active wallet with zero balances for the given user.
    #[must_use]
    pub fn new(user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: WalletId::new(),
            user_id,
            balance: Decimal::ZERO,
            bonus_balance: Decimal::ZERO,
            total_deposited: Decimal::ZERO,
            qualifies_for_interest: false,
            first_deposit_date: None,
            last_interest_calculation: None,
            status: WalletStatus::Active,
            created_at: now,
            last_modified_at: now,
        }
    }

    /// Total spendable funds: cash plus bonus.
    #[must_use]
    pub fn available(&self) -> Decimal {
        self.balance + self.bonus_balance
    }

    /// Returns `true` if the wallet accepts mutations.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.status, WalletStatus::Active)
    }
}

/// Lightweight summary of a wallet for list endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct WalletSummary {
    /// Wallet identifier.
    pub wallet_id: WalletId,
    /// Owning user.
    pub user_id: Uuid,
    /// Cash balance.
    pub balance: Decimal,
    /// Bonus balance.
    pub bonus_balance: Decimal,
    /// Whether daily interest accrual is enabled.
    pub qualifies_for_interest: bool,
    /// Lifecycle status.
    pub status: WalletStatus,
}

impl From<&Wallet> for WalletSummary {
    fn from(wallet: &Wallet) -> Self {
        Self {
            wallet_id: wallet.id,
            user_id: wallet.user_id,
            balance: wallet.balance,
            bonus_balance: wallet.bonus_balance,
            qualifies_for_interest: wallet.qualifies_for_interest,
            status: wallet.status,
        }
    }
}
