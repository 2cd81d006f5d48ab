//! Append-only transaction records and balance deltas.
//!
//! Every balance mutation appends exactly one [`WalletTransaction`] with a
//! snapshot of both balances taken immediately after the mutation, so the
//! full balance history can be reconstructed by replay.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::WalletId;

/// Kind of balance mutation a transaction records.
///
/// The stored `amount` is always a positive magnitude; the sign is implied
/// by the type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Cash deposit into the wallet.
    Deposit,
    /// Cash withdrawal out of the wallet.
    Withdrawal,
    /// Purchase debit, bonus balance drawn down before cash.
    Purchase,
    /// Purchase reversal, credited to the cash balance.
    Refund,
    /// Daily interest credited to the bonus balance.
    InterestCredit,
    /// Bonus balance spent outside a purchase flow.
    BonusUsed,
}

impl TransactionType {
    /// Returns the type as a static string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
            Self::Purchase => "purchase",
            Self::Refund => "refund",
            Self::InterestCredit => "interest_credit",
            Self::BonusUsed => "bonus_used",
        }
    }
}

/// Processing status of a transaction.
///
/// Transactions are immutable once `Completed`; the only permitted
/// transitions are `Pending` → `Processing` → `Completed`/`Failed`/
/// `Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Created, not yet applied.
    Pending,
    /// Being applied.
    Processing,
    /// Applied; balances reflect this record.
    Completed,
    /// Rejected; balances were not touched.
    Failed,
    /// Abandoned before application.
    Cancelled,
}

/// Method-specific deposit details.
///
/// Modeled as a tagged union keyed by `method` so each variant carries its
/// own typed fields instead of an untyped metadata bag. The ledger passes
/// these through without validating them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum DepositMethod {
    /// Bank wire or SEPA transfer.
    BankTransfer {
        /// Bank-side payment reference.
        #[serde(default)]
        reference: Option<String>,
        /// Originating bank name.
        #[serde(default)]
        bank_name: Option<String>,
    },
    /// Cryptocurrency deposit, confirmed upstream.
    Crypto {
        /// Currency ticker (e.g. `"USDT"`).
        currency: String,
        /// On-chain transaction hash.
        #[serde(default)]
        tx_hash: Option<String>,
        /// Network name (e.g. `"tron"`).
        #[serde(default)]
        network: Option<String>,
    },
    /// Card top-up.
    Card {
        /// Last four digits of the card number.
        #[serde(default)]
        last_four: Option<String>,
    },
    /// Manual adjustment by an operator.
    Manual {
        /// Operator note.
        #[serde(default)]
        note: Option<String>,
    },
}

impl DepositMethod {
    /// Returns the method discriminator as a static string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BankTransfer { .. } => "bank_transfer",
            Self::Crypto { .. } => "crypto",
            Self::Card { .. } => "card",
            Self::Manual { .. } => "manual",
        }
    }
}

/// Signed change to apply to a wallet's balances.
///
/// Either field may be negative; the ledger store rejects the whole delta
/// if any resulting balance would go below zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BalanceDelta {
    /// Change to the cash balance.
    pub balance: Decimal,
    /// Change to the bonus balance.
    pub bonus_balance: Decimal,
}

impl BalanceDelta {
    /// Delta crediting the cash balance.
    #[must_use]
    pub fn credit_cash(amount: Decimal) -> Self {
        Self {
            balance: amount,
            bonus_balance: Decimal::ZERO,
        }
    }

    /// Delta crediting the bonus balance.
    #[must_use]
    pub fn credit_bonus(amount: Decimal) -> Self {
        Self {
            balance: Decimal::ZERO,
            bonus_balance: amount,
        }
    }

    /// Delta debiting bonus first, then cash.
    #[must_use]
    pub fn debit_split(main_used: Decimal, bonus_used: Decimal) -> Self {
        Self {
            balance: -main_used,
            bonus_balance: -bonus_used,
        }
    }
}

/// Immutable audit record, one per balance mutation.
///
/// `balance_after` / `bonus_balance_after` snapshot both balances
/// immediately after the mutation. `bonus_portion` records how much of
/// `amount` moved through the bonus balance, which is what makes replay
/// of both balances possible for split purchases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletTransaction {
    /// Unique transaction identifier.
    pub id: Uuid,
    /// Wallet this transaction belongs to.
    pub wallet_id: WalletId,
    /// Owning user.
    pub user_id: Uuid,
    /// Kind of mutation.
    pub tx_type: TransactionType,
    /// Positive magnitude of the mutation.
    pub amount: Decimal,
    /// Portion of `amount` applied to the bonus balance.
    pub bonus_portion: Decimal,
    /// Cash balance immediately after this transaction.
    pub balance_after: Decimal,
    /// Bonus balance immediately after this transaction.
    pub bonus_balance_after: Decimal,
    /// Processing status.
    pub status: TransactionStatus,
    /// Method-specific deposit details, pass-through only.
    pub method: Option<DepositMethod>,
    /// Back-reference to an order for purchase/refund transactions.
    pub order_id: Option<Uuid>,
    /// Human-readable description.
    pub description: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp the transaction reached a terminal status.
    pub processed_at: Option<DateTime<Utc>>,
}

impl WalletTransaction {
    /// Signed cash-balance delta implied by this record.
    ///
    /// Used by replay to reconstruct balances from history; only
    /// `Completed` records should be replayed.
    #[must_use]
    pub fn cash_delta(&self) -> Decimal {
        let main_portion = self.amount - self.bonus_portion;
        match self.tx_type {
            TransactionType::Deposit | TransactionType::Refund => main_portion,
            TransactionType::Withdrawal | TransactionType::Purchase => -main_portion,
            TransactionType::InterestCredit | TransactionType::BonusUsed => Decimal::ZERO,
        }
    }

    /// Signed bonus-balance delta implied by this record.
    #[must_use]
    pub fn bonus_delta(&self) -> Decimal {
        match self.tx_type {
            TransactionType::Deposit | TransactionType::Refund => self.bonus_portion,
            TransactionType::InterestCredit => self.amount,
            TransactionType::Purchase | TransactionType::BonusUsed => -self.bonus_portion,
            TransactionType::Withdrawal => Decimal::ZERO,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn make_tx(tx_type: TransactionType, amount: Decimal, bonus_portion: Decimal) -> WalletTransaction {
        WalletTransaction {
            id: Uuid::new_v4(),
            wallet_id: WalletId::new(),
            user_id: Uuid::new_v4(),
            tx_type,
            amount,
            bonus_portion,
            balance_after: Decimal::ZERO,
            bonus_balance_after: Decimal::ZERO,
            status: TransactionStatus::Completed,
            method: None,
            order_id: None,
            description: String::new(),
            created_at: Utc::now(),
            processed_at: Some(Utc::now()),
        }
    }

    #[test]
    fn deposit_delta_is_positive_cash() {
        let tx = make_tx(TransactionType::Deposit, dec!(100), Decimal::ZERO);
        assert_eq!(tx.cash_delta(), dec!(100));
        assert_eq!(tx.bonus_delta(), Decimal::ZERO);
    }

    #[test]
    fn split_purchase_deltas() {
        // 120 purchase drawing 100 from bonus, 20 from cash
        let tx = make_tx(TransactionType::Purchase, dec!(120), dec!(100));
        assert_eq!(tx.cash_delta(), dec!(-20));
        assert_eq!(tx.bonus_delta(), dec!(-100));
    }

    #[test]
    fn interest_credit_is_bonus_only() {
        let tx = make_tx(TransactionType::InterestCredit, dec!(1.92), dec!(1.92));
        assert_eq!(tx.cash_delta(), Decimal::ZERO);
        assert_eq!(tx.bonus_delta(), dec!(1.92));
    }

    #[test]
    fn refund_credits_cash() {
        let tx = make_tx(TransactionType::Refund, dec!(50), Decimal::ZERO);
        assert_eq!(tx.cash_delta(), dec!(50));
        assert_eq!(tx.bonus_delta(), Decimal::ZERO);
    }

    #[test]
    fn deposit_method_tagged_serialization() {
        let method = DepositMethod::Crypto {
            currency: "USDT".to_string(),
            tx_hash: Some("0xabc".to_string()),
            network: Some("tron".to_string()),
        };
        let json = serde_json::to_string(&method).unwrap_or_default();
        assert!(json.contains("\"method\":\"crypto\""));
        assert!(json.contains("USDT"));

        let parsed: Result<DepositMethod, _> = serde_json::from_str(&json);
        assert_eq!(parsed.ok(), Some(method));
    }

    #[test]
    fn deposit_method_optional_fields_default() {
        let parsed: Result<DepositMethod, _> =
            serde_json::from_str(r#"{"method":"bank_transfer"}"#);
        let Ok(DepositMethod::BankTransfer { reference, bank_name }) = parsed else {
            panic!("expected bank_transfer variant");
        };
        assert!(reference.is_none());
        assert!(bank_name.is_none());
    }

    #[test]
    fn balance_delta_constructors() {
        assert_eq!(
            BalanceDelta::credit_cash(dec!(10)),
            BalanceDelta {
                balance: dec!(10),
                bonus_balance: Decimal::ZERO
            }
        );
        assert_eq!(
            BalanceDelta::debit_split(dec!(20), dec!(100)),
            BalanceDelta {
                balance: dec!(-20),
                bonus_balance: dec!(-100)
            }
        );
    }

    #[test]
    fn type_strings() {
        assert_eq!(TransactionType::InterestCredit.as_str(), "interest_credit");
        assert_eq!(TransactionType::BonusUsed.as_str(), "bonus_used");
        assert_eq!(DepositMethod::Manual { note: None }.as_str(), "manual");
    }
}
