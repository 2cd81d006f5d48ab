//! Domain events reflecting wallet state mutations.
//!
//! Every balance mutation emits a [`WalletEvent`] through the
//! [`super::EventBus`]. Events are broadcast to WebSocket subscribers and
//! optionally persisted to the PostgreSQL audit trail.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::WalletId;
use super::wallet::WalletStatus;

/// Domain event emitted after every state mutation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum WalletEvent {
    /// Emitted when a wallet is created for a user.
    WalletCreated {
        /// Wallet identifier.
        wallet_id: WalletId,
        /// Owning user.
        user_id: Uuid,
        /// Creation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted after a successful deposit.
    DepositApplied {
        /// Wallet identifier.
        wallet_id: WalletId,
        /// Deposited amount.
        amount: Decimal,
        /// Cash balance after the deposit.
        balance_after: Decimal,
        /// Whether this deposit triggered interest qualification.
        qualified: bool,
        /// Deposit method discriminator.
        method: &'static str,
        /// Execution timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted after a successful purchase debit.
    PurchaseDebited {
        /// Wallet identifier.
        wallet_id: WalletId,
        /// Linked order.
        order_id: Uuid,
        /// Portion drawn from the bonus balance.
        bonus_used: Decimal,
        /// Portion drawn from the cash balance.
        main_used: Decimal,
        /// Cash balance after the debit.
        balance_after: Decimal,
        /// Bonus balance after the debit.
        bonus_balance_after: Decimal,
        /// Execution timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted after a refund credit.
    RefundCredited {
        /// Wallet identifier.
        wallet_id: WalletId,
        /// Linked order.
        order_id: Uuid,
        /// Refunded amount, credited to cash.
        amount: Decimal,
        /// Execution timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted after daily interest is credited.
    InterestCredited {
        /// Wallet identifier.
        wallet_id: WalletId,
        /// Credited interest amount.
        amount: Decimal,
        /// Whole days in the accrual period.
        period_days: i64,
        /// Bonus balance after the credit.
        bonus_balance_after: Decimal,
        /// Execution timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when a wallet's lifecycle status changes.
    StatusChanged {
        /// Wallet identifier.
        wallet_id: WalletId,
        /// New status.
        status: WalletStatus,
        /// Change timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl WalletEvent {
    /// Returns the wallet ID associated with this event.
    #[must_use]
    pub fn wallet_id(&self) -> WalletId {
        match self {
            Self::WalletCreated { wallet_id, .. }
            | Self::DepositApplied { wallet_id, .. }
            | Self::PurchaseDebited { wallet_id, .. }
            | Self::RefundCredited { wallet_id, .. }
            | Self::InterestCredited { wallet_id, .. }
            | Self::StatusChanged { wallet_id, .. } => *wallet_id,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::WalletCreated { .. } => "wallet_created",
            Self::DepositApplied { .. } => "deposit_applied",
            Self::PurchaseDebited { .. } => "purchase_debited",
            Self::RefundCredited { .. } => "refund_credited",
            Self::InterestCredited { .. } => "interest_credited",
            Self::StatusChanged { .. } => "status_changed",
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn deposit_event_type() {
        let event = WalletEvent::DepositApplied {
            wallet_id: WalletId::new(),
            amount: dec!(10000),
            balance_after: dec!(10000),
            qualified: true,
            method: "bank_transfer",
            timestamp: Utc::now(),
        };
        assert_eq!(event.event_type_str(), "deposit_applied");
    }

    #[test]
    fn interest_event_serializes() {
        let event = WalletEvent::InterestCredited {
            wallet_id: WalletId::new(),
            amount: dec!(1.92),
            period_days: 1,
            bonus_balance_after: dec!(1.92),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&event).unwrap_or_default();
        assert!(json.contains("interest_credited"));
        assert!(json.contains("1.92"));
    }

    #[test]
    fn wallet_id_accessor() {
        let id = WalletId::new();
        let event = WalletEvent::StatusChanged {
            wallet_id: id,
            status: WalletStatus::Frozen,
            timestamp: Utc::now(),
        };
        assert_eq!(event.wallet_id(), id);
    }
}
