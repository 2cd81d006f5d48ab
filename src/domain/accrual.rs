//! Interest accrual audit records and the per-period idempotency log.
//!
//! Each accrual run that credits a wallet writes one
//! [`InterestCalculation`], keyed by `(wallet_id, period_start, period_end)`
//! at day granularity. The [`AccrualLog`] enforces that key, which is the
//! safety net against double-crediting when the scheduler fires twice for
//! the same period.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::WalletId;
use crate::error::LedgerError;

/// Status of an interest calculation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccrualStatus {
    /// Computed, credit not yet applied.
    Calculated,
    /// Credit applied to the bonus balance.
    Credited,
    /// Abandoned before crediting.
    Cancelled,
}

/// One record per wallet per accrual period.
///
/// Logs principal, rate, period bounds, and the resulting amount so every
/// historical accrual is independently auditable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterestCalculation {
    /// Unique record identifier.
    pub id: Uuid,
    /// Wallet the interest was computed for.
    pub wallet_id: WalletId,
    /// Cash balance the interest was computed on.
    pub principal: Decimal,
    /// Annual rate in effect (e.g. `0.07`).
    pub annual_rate: Decimal,
    /// Start of the accrual period.
    pub period_start: DateTime<Utc>,
    /// End of the accrual period.
    pub period_end: DateTime<Utc>,
    /// Whole days in the period.
    pub days_in_period: i64,
    /// Interest amount, rounded to 2 decimal places.
    pub amount: Decimal,
    /// Record status.
    pub status: AccrualStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl InterestCalculation {
    /// Idempotency key for this record: wallet plus day-granular period
    /// bounds.
    #[must_use]
    pub fn period_key(&self) -> AccrualPeriodKey {
        AccrualPeriodKey {
            wallet_id: self.wallet_id,
            period_start: self.period_start.date_naive(),
            period_end: self.period_end.date_naive(),
        }
    }
}

/// Unique key identifying one wallet-period combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccrualPeriodKey {
    /// Wallet the period belongs to.
    pub wallet_id: WalletId,
    /// Period start date (UTC).
    pub period_start: NaiveDate,
    /// Period end date (UTC).
    pub period_end: NaiveDate,
}

/// In-memory accrual audit log with unique-period enforcement.
///
/// `try_insert` is the only way in, so a period can never be recorded
/// twice for the same wallet.
#[derive(Debug, Default)]
pub struct AccrualLog {
    records: RwLock<HashMap<AccrualPeriodKey, InterestCalculation>>,
}

impl AccrualLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a calculation record, enforcing the unique period key.
    ///
    /// # Errors
    ///
    /// [`LedgerError::DuplicateAccrualPeriod`] if a record for the same
    /// wallet and period already exists.
    pub async fn try_insert(&self, record: InterestCalculation) -> Result<(), LedgerError> {
        let key = record.period_key();
        let mut records = self.records.write().await;
        if records.contains_key(&key) {
            return Err(LedgerError::DuplicateAccrualPeriod);
        }
        records.insert(key, record);
        Ok(())
    }

    /// Transitions a record to the given status.
    pub async fn set_status(&self, key: AccrualPeriodKey, status: AccrualStatus) {
        let mut records = self.records.write().await;
        if let Some(record) = records.get_mut(&key) {
            record.status = status;
        }
    }

    /// Returns all records for a wallet, oldest first.
    pub async fn records_for(&self, wallet_id: WalletId) -> Vec<InterestCalculation> {
        let records = self.records.read().await;
        let mut out: Vec<InterestCalculation> = records
            .values()
            .filter(|r| r.wallet_id == wallet_id)
            .cloned()
            .collect();
        out.sort_by_key(|r| r.period_start);
        out
    }

    /// Returns the number of records in the log.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns `true` if the log is empty.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn make_record(wallet_id: WalletId, start: DateTime<Utc>, end: DateTime<Utc>) -> InterestCalculation {
        InterestCalculation {
            id: Uuid::new_v4(),
            wallet_id,
            principal: dec!(10000),
            annual_rate: dec!(0.07),
            period_start: start,
            period_end: end,
            days_in_period: (end - start).num_days(),
            amount: dec!(1.92),
            status: AccrualStatus::Calculated,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn insert_then_duplicate_rejected() {
        let log = AccrualLog::new();
        let wallet_id = WalletId::new();
        let end = Utc::now();
        let start = end - Duration::days(1);

        let first = log.try_insert(make_record(wallet_id, start, end)).await;
        assert!(first.is_ok());

        let second = log.try_insert(make_record(wallet_id, start, end)).await;
        assert!(matches!(second, Err(LedgerError::DuplicateAccrualPeriod)));
        assert_eq!(log.len().await, 1);
    }

    #[tokio::test]
    async fn different_periods_coexist() {
        let log = AccrualLog::new();
        let wallet_id = WalletId::new();
        let end = Utc::now();

        let _ = log
            .try_insert(make_record(wallet_id, end - Duration::days(2), end - Duration::days(1)))
            .await;
        let second = log
            .try_insert(make_record(wallet_id, end - Duration::days(1), end))
            .await;
        assert!(second.is_ok());
        assert_eq!(log.len().await, 2);
    }

    #[tokio::test]
    async fn same_period_different_wallets_coexist() {
        let log = AccrualLog::new();
        let end = Utc::now();
        let start = end - Duration::days(1);

        let _ = log.try_insert(make_record(WalletId::new(), start, end)).await;
        let second = log.try_insert(make_record(WalletId::new(), start, end)).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn set_status_transitions_record() {
        let log = AccrualLog::new();
        let wallet_id = WalletId::new();
        let end = Utc::now();
        let record = make_record(wallet_id, end - Duration::days(1), end);
        let key = record.period_key();

        let _ = log.try_insert(record).await;
        log.set_status(key, AccrualStatus::Credited).await;

        let records = log.records_for(wallet_id).await;
        assert_eq!(records.first().map(|r| r.status), Some(AccrualStatus::Credited));
    }

    #[tokio::test]
    async fn records_for_sorted_oldest_first() {
        let log = AccrualLog::new();
        let wallet_id = WalletId::new();
        let end = Utc::now();

        let _ = log
            .try_insert(make_record(wallet_id, end - Duration::days(1), end))
            .await;
        let _ = log
            .try_insert(make_record(wallet_id, end - Duration::days(3), end - Duration::days(2)))
            .await;

        let records = log.records_for(wallet_id).await;
        assert_eq!(records.len(), 2);
        let Some(first) = records.first() else {
            panic!("expected records");
        };
        assert_eq!(first.period_start.date_naive(), (end - Duration::days(3)).date_naive());
    }
}
