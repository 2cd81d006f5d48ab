//! Startup restore from the audit database.
//!
//! Rebuilds the in-memory ledger from the latest wallet snapshot per
//! wallet plus the full stored transaction history, and seeds the accrual
//! log so the one-accrual-per-period key survives restarts. Wallet
//! metadata (qualification flag, dates, status) comes from the snapshot;
//! balances and `total_deposited` are replayed from the completed
//! transaction chain, which is the same chain the audit endpoint checks
//! the live balances against.

use chrono::DateTime;
use rust_decimal::Decimal;
use serde::Serialize;

use super::PostgresLedger;
use super::models::{StoredInterestCalculation, StoredTransaction};
use crate::domain::{
    AccrualLog, AccrualStatus, DepositMethod, InterestCalculation, LedgerStore, TransactionStatus,
    TransactionType, Wallet, WalletId, WalletTransaction,
};
use crate::error::LedgerError;

/// Counts of what a startup restore brought back.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RestoreReport {
    /// Wallets inserted into the store.
    pub wallets_restored: usize,
    /// Transaction records attached to restored wallets.
    pub transactions_restored: usize,
    /// Accrual records seeded into the idempotency log.
    pub accrual_records_seeded: usize,
}

/// Rebuilds the store and accrual log from the audit database.
///
/// Unreadable rows (unknown discriminators, malformed JSON) are skipped
/// with a warning rather than aborting the whole restore.
///
/// # Errors
///
/// [`LedgerError::PersistenceError`] when a database read fails.
pub async fn restore_from_audit(
    persistence: &PostgresLedger,
    store: &LedgerStore,
    accrual_log: &AccrualLog,
) -> Result<RestoreReport, LedgerError> {
    let mut report = RestoreReport::default();

    for row in persistence.load_latest_snapshots().await? {
        let wallet: Wallet = match serde_json::from_value(row.state_json) {
            Ok(wallet) => wallet,
            Err(err) => {
                tracing::warn!(
                    wallet_id = %row.wallet_id,
                    error = %err,
                    "unreadable snapshot skipped"
                );
                continue;
            }
        };

        let stored = persistence
            .load_transactions_after(row.wallet_id, DateTime::UNIX_EPOCH)
            .await?;
        let transactions: Vec<WalletTransaction> = stored
            .into_iter()
            .filter_map(|tx| {
                let id = tx.id;
                let rebuilt = rebuild_transaction(tx);
                if rebuilt.is_none() {
                    tracing::warn!(tx_id = %id, "unreadable transaction row skipped");
                }
                rebuilt
            })
            .collect();

        let wallet = rebalanced(wallet, &transactions);
        report.transactions_restored += transactions.len();
        if store.restore_wallet(wallet, transactions).await {
            report.wallets_restored += 1;
        }

        for calc in persistence.load_interest_calculations(row.wallet_id).await? {
            let Some(record) = rebuild_accrual(calc) else {
                continue;
            };
            if accrual_log.try_insert(record).await.is_ok() {
                report.accrual_records_seeded += 1;
            }
        }
    }

    tracing::info!(
        wallets = report.wallets_restored,
        transactions = report.transactions_restored,
        accruals = report.accrual_records_seeded,
        "ledger restored from audit database"
    );
    Ok(report)
}

/// Replays the completed transaction chain over the snapshot so the live
/// balances reflect mutations recorded after the snapshot was taken.
fn rebalanced(mut wallet: Wallet, transactions: &[WalletTransaction]) -> Wallet {
    let mut balance = Decimal::ZERO;
    let mut bonus = Decimal::ZERO;
    let mut total_deposited = Decimal::ZERO;
    for tx in transactions {
        if tx.status != TransactionStatus::Completed {
            continue;
        }
        balance += tx.cash_delta();
        bonus += tx.bonus_delta();
        if tx.tx_type == TransactionType::Deposit {
            total_deposited += tx.amount;
        }
    }
    wallet.balance = balance;
    wallet.bonus_balance = bonus;
    wallet.total_deposited = total_deposited;
    wallet
}

/// Converts a stored row back into the domain record. Returns `None` for
/// rows with discriminators this build does not know.
fn rebuild_transaction(tx: StoredTransaction) -> Option<WalletTransaction> {
    let tx_type = parse_tx_type(&tx.tx_type)?;
    let status = parse_tx_status(&tx.status)?;
    let method = match tx.method {
        Some(value) => Some(serde_json::from_value::<DepositMethod>(value).ok()?),
        None => None,
    };
    let processed_at = matches!(
        status,
        TransactionStatus::Completed | TransactionStatus::Failed | TransactionStatus::Cancelled
    )
    .then_some(tx.created_at);

    Some(WalletTransaction {
        id: tx.id,
        wallet_id: WalletId::from_uuid(tx.wallet_id),
        user_id: tx.user_id,
        tx_type,
        amount: tx.amount,
        bonus_portion: tx.bonus_portion,
        balance_after: tx.balance_after,
        bonus_balance_after: tx.bonus_balance_after,
        status,
        method,
        order_id: tx.order_id,
        description: tx.description,
        created_at: tx.created_at,
        processed_at,
    })
}

fn rebuild_accrual(calc: StoredInterestCalculation) -> Option<InterestCalculation> {
    let status = parse_accrual_status(&calc.status)?;
    Some(InterestCalculation {
        id: calc.id,
        wallet_id: WalletId::from_uuid(calc.wallet_id),
        principal: calc.principal,
        annual_rate: calc.annual_rate,
        period_start: calc.period_start,
        period_end: calc.period_end,
        days_in_period: calc.days_in_period,
        amount: calc.amount,
        status,
        created_at: calc.created_at,
    })
}

fn parse_tx_type(s: &str) -> Option<TransactionType> {
    match s {
        "deposit" => Some(TransactionType::Deposit),
        "withdrawal" => Some(TransactionType::Withdrawal),
        "purchase" => Some(TransactionType::Purchase),
        "refund" => Some(TransactionType::Refund),
        "interest_credit" => Some(TransactionType::InterestCredit),
        "bonus_used" => Some(TransactionType::BonusUsed),
        _ => None,
    }
}

fn parse_tx_status(s: &str) -> Option<TransactionStatus> {
    match s {
        "pending" => Some(TransactionStatus::Pending),
        "processing" => Some(TransactionStatus::Processing),
        "completed" => Some(TransactionStatus::Completed),
        "failed" => Some(TransactionStatus::Failed),
        "cancelled" => Some(TransactionStatus::Cancelled),
        _ => None,
    }
}

fn parse_accrual_status(s: &str) -> Option<AccrualStatus> {
    match s {
        "calculated" => Some(AccrualStatus::Calculated),
        "credited" => Some(AccrualStatus::Credited),
        "cancelled" => Some(AccrualStatus::Cancelled),
        _ => None,
    }
}
