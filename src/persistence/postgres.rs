//! PostgreSQL implementation of the persistence layer.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{StoredInterestCalculation, StoredTransaction, WalletSnapshotRow};
use crate::domain::{InterestCalculation, Wallet, WalletTransaction};
use crate::error::LedgerError;

/// PostgreSQL-backed persistence layer using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresLedger {
    pool: PgPool,
}

impl PostgresLedger {
    /// Creates a new persistence layer with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Appends a transaction to the audit trail.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError::PersistenceError`] on database failure.
    pub async fn record_transaction(&self, tx: &WalletTransaction) -> Result<(), LedgerError> {
        let method_json = tx
            .method
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| LedgerError::PersistenceError(e.to_string()))?;

        sqlx::query(
            "INSERT INTO wallet_transactions \
             (id, wallet_id, user_id, tx_type, amount, bonus_portion, balance_after, \
              bonus_balance_after, status, method, order_id, description, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(tx.id)
        .bind(tx.wallet_id.as_uuid())
        .bind(tx.user_id)
        .bind(tx.tx_type.as_str())
        .bind(tx.amount)
        .bind(tx.bonus_portion)
        .bind(tx.balance_after)
        .bind(tx.bonus_balance_after)
        .bind(status_str(tx))
        .bind(method_json)
        .bind(tx.order_id)
        .bind(&tx.description)
        .bind(tx.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| LedgerError::PersistenceError(e.to_string()))?;

        Ok(())
    }

    /// Appends an interest calculation record.
    ///
    /// The unique `(wallet_id, period_start, period_end)` index mirrors
    /// the in-memory accrual log's idempotency key.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError::PersistenceError`] on database failure.
    pub async fn record_interest_calculation(
        &self,
        record: &InterestCalculation,
    ) -> Result<(), LedgerError> {
        sqlx::query(
            "INSERT INTO interest_calculations \
             (id, wallet_id, principal, annual_rate, period_start, period_end, \
              days_in_period, amount, status, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT (wallet_id, period_start, period_end) DO NOTHING",
        )
        .bind(record.id)
        .bind(record.wallet_id.as_uuid())
        .bind(record.principal)
        .bind(record.annual_rate)
        .bind(record.period_start)
        .bind(record.period_end)
        .bind(record.days_in_period)
        .bind(record.amount)
        .bind(accrual_status_str(record))
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| LedgerError::PersistenceError(e.to_string()))?;

        Ok(())
    }

    /// Saves a wallet state snapshot.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError::PersistenceError`] on database failure.
    pub async fn save_wallet_snapshot(&self, wallet: &Wallet) -> Result<i64, LedgerError> {
        let state_json = serde_json::to_value(wallet)
            .map_err(|e| LedgerError::PersistenceError(e.to_string()))?;

        let row = sqlx::query_scalar::<_, i64>(
            "INSERT INTO wallet_snapshots (wallet_id, state_json) VALUES ($1, $2) RETURNING id",
        )
        .bind(wallet.id.as_uuid())
        .bind(state_json)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| LedgerError::PersistenceError(e.to_string()))?;

        Ok(row)
    }

    /// Loads the latest snapshot for each wallet using `DISTINCT ON`.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError::PersistenceError`] on database failure.
    pub async fn load_latest_snapshots(&self) -> Result<Vec<WalletSnapshotRow>, LedgerError> {
        let rows = sqlx::query_as::<_, (i64, Uuid, serde_json::Value, DateTime<Utc>)>(
            "SELECT DISTINCT ON (wallet_id) id, wallet_id, state_json, snapshot_at \
             FROM wallet_snapshots ORDER BY wallet_id, snapshot_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| LedgerError::PersistenceError(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(id, wallet_id, state_json, snapshot_at)| WalletSnapshotRow {
                id,
                wallet_id,
                state_json,
                snapshot_at,
            })
            .collect())
    }

    /// Loads a wallet's transactions after the given timestamp, oldest
    /// first.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError::PersistenceError`] on database failure.
    pub async fn load_transactions_after(
        &self,
        wallet_id: Uuid,
        after: DateTime<Utc>,
    ) -> Result<Vec<StoredTransaction>, LedgerError> {
        type TxRow = (
            Uuid,
            Uuid,
            Uuid,
            String,
            Decimal,
            Decimal,
            Decimal,
            Decimal,
            String,
            Option<serde_json::Value>,
            Option<Uuid>,
            String,
            DateTime<Utc>,
        );

        let rows = sqlx::query_as::<_, TxRow>(
            "SELECT id, wallet_id, user_id, tx_type, amount, bonus_portion, balance_after, \
                    bonus_balance_after, status, method, order_id, description, created_at \
             FROM wallet_transactions \
             WHERE wallet_id = $1 AND created_at > $2 ORDER BY created_at ASC",
        )
        .bind(wallet_id)
        .bind(after)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| LedgerError::PersistenceError(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(
                |(
                    id,
                    wallet_id,
                    user_id,
                    tx_type,
                    amount,
                    bonus_portion,
                    balance_after,
                    bonus_balance_after,
                    status,
                    method,
                    order_id,
                    description,
                    created_at,
                )| StoredTransaction {
                    id,
                    wallet_id,
                    user_id,
                    tx_type,
                    amount,
                    bonus_portion,
                    balance_after,
                    bonus_balance_after,
                    status,
                    method,
                    order_id,
                    description,
                    created_at,
                },
            )
            .collect())
    }

    /// Loads all interest calculations for a wallet, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError::PersistenceError`] on database failure.
    pub async fn load_interest_calculations(
        &self,
        wallet_id: Uuid,
    ) -> Result<Vec<StoredInterestCalculation>, LedgerError> {
        type CalcRow = (
            Uuid,
            Uuid,
            Decimal,
            Decimal,
            DateTime<Utc>,
            DateTime<Utc>,
            i64,
            Decimal,
            String,
            DateTime<Utc>,
        );

        let rows = sqlx::query_as::<_, CalcRow>(
            "SELECT id, wallet_id, principal, annual_rate, period_start, period_end, \
                    days_in_period, amount, status, created_at \
             FROM interest_calculations WHERE wallet_id = $1 ORDER BY period_start ASC",
        )
        .bind(wallet_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| LedgerError::PersistenceError(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(
                |(
                    id,
                    wallet_id,
                    principal,
                    annual_rate,
                    period_start,
                    period_end,
                    days_in_period,
                    amount,
                    status,
                    created_at,
                )| StoredInterestCalculation {
                    id,
                    wallet_id,
                    principal,
                    annual_rate,
                    period_start,
                    period_end,
                    days_in_period,
                    amount,
                    status,
                    created_at,
                },
            )
            .collect())
    }

    /// Deletes snapshots older than the given number of days.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError::PersistenceError`] on database failure.
    pub async fn delete_old_snapshots(&self, before_days: u64) -> Result<u64, LedgerError> {
        let cutoff =
            Utc::now() - chrono::Duration::days(i64::try_from(before_days).unwrap_or(i64::MAX));

        let result = sqlx::query("DELETE FROM wallet_snapshots WHERE snapshot_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(|e| LedgerError::PersistenceError(e.to_string()))?;

        Ok(result.rows_affected())
    }
}

/// Status discriminator for a transaction row.
fn status_str(tx: &WalletTransaction) -> &'static str {
    use crate::domain::TransactionStatus;
    match tx.status {
        TransactionStatus::Pending => "pending",
        TransactionStatus::Processing => "processing",
        TransactionStatus::Completed => "completed",
        TransactionStatus::Failed => "failed",
        TransactionStatus::Cancelled => "cancelled",
    }
}

/// Status discriminator for an accrual row.
fn accrual_status_str(record: &InterestCalculation) -> &'static str {
    use crate::domain::AccrualStatus;
    match record.status {
        AccrualStatus::Calculated => "calculated",
        AccrualStatus::Credited => "credited",
        AccrualStatus::Cancelled => "cancelled",
    }
}
