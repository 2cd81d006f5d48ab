//! Interest accrual engine: daily interest computation and crediting.
//!
//! Interest accrues on the cash balance only, at a fixed annual rate,
//! once per qualifying wallet per calendar day. The whole
//! compute-and-credit sequence for a wallet runs under that wallet's
//! write lock, so the `last_interest_calculation` advance and the bonus
//! credit are one atomic unit.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{
    AccrualLog, AccrualStatus, BalanceDelta, EventBus, InterestCalculation, LedgerStore, Mutation,
    TransactionType, WalletEvent, WalletId,
};
use crate::error::LedgerError;
use crate::persistence::PostgresLedger;

/// Days used to convert the annual rate to a daily rate.
const DAYS_PER_YEAR: Decimal = Decimal::from_parts(365, 0, 0, false, 0);

/// Outcome of an accrual attempt for one wallet.
#[derive(Debug, Clone, Serialize)]
pub struct AccrualOutcome {
    /// Whether interest was credited.
    pub credited: bool,
    /// Credited amount (zero when not credited).
    pub amount: Decimal,
    /// Whole days in the accrual period.
    pub days_in_period: i64,
}

impl AccrualOutcome {
    fn skipped() -> Self {
        Self {
            credited: false,
            amount: Decimal::ZERO,
            days_in_period: 0,
        }
    }
}

/// Aggregate result of a batch accrual run.
///
/// One wallet's failure never aborts the batch; failures are collected
/// here for reporting.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    /// Wallets the batch attempted.
    pub wallets_processed: usize,
    /// Wallets that received a credit.
    pub wallets_credited: usize,
    /// Sum of all credited interest.
    pub total_credited: Decimal,
    /// Per-wallet failures, as `(wallet_id, message)` pairs.
    pub errors: Vec<(WalletId, String)>,
}

/// Computes and credits daily interest for qualifying wallets.
#[derive(Debug, Clone)]
pub struct InterestAccrualEngine {
    store: Arc<LedgerStore>,
    log: Arc<AccrualLog>,
    event_bus: EventBus,
    persistence: Option<Arc<PostgresLedger>>,
    annual_rate: Decimal,
}

impl InterestAccrualEngine {
    /// Creates a new engine with the given annual rate (e.g. `0.07`).
    #[must_use]
    pub fn new(
        store: Arc<LedgerStore>,
        event_bus: EventBus,
        persistence: Option<Arc<PostgresLedger>>,
        annual_rate: Decimal,
    ) -> Self {
        Self {
            store,
            log: Arc::new(AccrualLog::new()),
            event_bus,
            persistence,
            annual_rate,
        }
    }

    /// Returns a reference to the accrual audit log.
    #[must_use]
    pub fn log(&self) -> &Arc<AccrualLog> {
        &self.log
    }

    /// Computes and credits interest for one wallet as of now.
    ///
    /// # Errors
    ///
    /// [`LedgerError::WalletNotFound`] if the wallet does not exist;
    /// store errors from the credit mutation.
    pub async fn calculate_and_credit_interest(
        &self,
        wallet_id: WalletId,
    ) -> Result<AccrualOutcome, LedgerError> {
        self.calculate_and_credit_interest_at(wallet_id, Utc::now())
            .await
    }

    /// Clock-injected variant of [`Self::calculate_and_credit_interest`];
    /// the accrual period ends at `now`.
    ///
    /// # Errors
    ///
    /// [`LedgerError::WalletNotFound`] if the wallet does not exist;
    /// store errors from the credit mutation.
    pub async fn calculate_and_credit_interest_at(
        &self,
        wallet_id: WalletId,
        now: DateTime<Utc>,
    ) -> Result<AccrualOutcome, LedgerError> {
        let entry_lock = self.store.get(wallet_id).await?;
        let mut entry = entry_lock.write().await;

        if !entry.wallet.qualifies_for_interest || !entry.wallet.is_active() {
            return Ok(AccrualOutcome::skipped());
        }

        let Some(period_start) = entry
            .wallet
            .last_interest_calculation
            .or(entry.wallet.first_deposit_date)
        else {
            // Qualification without a first deposit cannot happen through
            // the deposit processor; treat as nothing to accrue.
            return Ok(AccrualOutcome::skipped());
        };

        let days_in_period = (now - period_start).num_days();
        if days_in_period < 1 {
            // Same-day re-run: no-op, prevents double-crediting.
            return Ok(AccrualOutcome::skipped());
        }

        let principal = entry.wallet.balance;
        let amount = (principal * self.annual_rate / DAYS_PER_YEAR
            * Decimal::from(days_in_period))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

        if amount.is_zero() {
            // Still advance the period so a later non-zero balance does
            // not accrue over the zero-balance span.
            entry.wallet.last_interest_calculation = Some(now);
            return Ok(AccrualOutcome {
                credited: false,
                amount: Decimal::ZERO,
                days_in_period,
            });
        }

        let mut record = InterestCalculation {
            id: Uuid::new_v4(),
            wallet_id,
            principal,
            annual_rate: self.annual_rate,
            period_start,
            period_end: now,
            days_in_period,
            amount,
            status: AccrualStatus::Calculated,
            created_at: now,
        };
        let key = record.period_key();

        // Unique period key: a concurrent or retried run for the same
        // period becomes an idempotent no-op here.
        match self.log.try_insert(record.clone()).await {
            Ok(()) => {}
            Err(LedgerError::DuplicateAccrualPeriod) => {
                return Ok(AccrualOutcome::skipped());
            }
            Err(err) => return Err(err),
        }

        let tx = entry.apply_mutation(Mutation {
            delta: BalanceDelta::credit_bonus(amount),
            tx_type: TransactionType::InterestCredit,
            amount,
            bonus_portion: amount,
            method: None,
            order_id: None,
            description: format!("daily interest, {days_in_period} day(s)"),
        });
        let tx = match tx {
            Ok(tx) => tx,
            Err(err) => {
                // The persisted record must carry the terminal status too.
                record.status = AccrualStatus::Cancelled;
                self.log.set_status(key, record.status).await;
                drop(entry);
                if let Some(persistence) = &self.persistence
                    && let Err(persist_err) =
                        persistence.record_interest_calculation(&record).await
                {
                    tracing::warn!(
                        record_id = %record.id,
                        error = %persist_err,
                        "accrual persistence failed"
                    );
                }
                return Err(err);
            }
        };

        entry.wallet.last_interest_calculation = Some(now);
        record.status = AccrualStatus::Credited;
        self.log.set_status(key, record.status).await;
        let bonus_balance_after = tx.bonus_balance_after;
        drop(entry);

        let _ = self.event_bus.publish(WalletEvent::InterestCredited {
            wallet_id,
            amount,
            period_days: days_in_period,
            bonus_balance_after,
            timestamp: now,
        });
        tracing::info!(
            wallet_id = %wallet_id,
            %amount,
            days = days_in_period,
            "interest credited"
        );

        if let Some(persistence) = &self.persistence {
            if let Err(err) = persistence.record_transaction(&tx).await {
                tracing::warn!(tx_id = %tx.id, error = %err, "transaction persistence failed");
            }
            if let Err(err) = persistence.record_interest_calculation(&record).await {
                tracing::warn!(
                    record_id = %record.id,
                    error = %err,
                    "accrual persistence failed"
                );
            }
        }

        Ok(AccrualOutcome {
            credited: true,
            amount,
            days_in_period,
        })
    }

    /// Runs accrual for every qualifying wallet, isolating per-wallet
    /// failures into the report.
    pub async fn run_batch(&self) -> BatchReport {
        self.run_batch_at(Utc::now()).await
    }

    /// Clock-injected variant of [`Self::run_batch`].
    pub async fn run_batch_at(&self, now: DateTime<Utc>) -> BatchReport {
        let wallet_ids = self.store.qualifying_wallets().await;
        let mut report = BatchReport::default();

        for wallet_id in wallet_ids {
            report.wallets_processed += 1;
            match self.calculate_and_credit_interest_at(wallet_id, now).await {
                Ok(outcome) => {
                    if outcome.credited {
                        report.wallets_credited += 1;
                        report.total_credited += outcome.amount;
                    }
                }
                Err(err) => {
                    tracing::warn!(wallet_id = %wallet_id, error = %err, "accrual failed");
                    report.errors.push((wallet_id, err.to_string()));
                }
            }
        }

        tracing::info!(
            processed = report.wallets_processed,
            credited = report.wallets_credited,
            total = %report.total_credited,
            failures = report.errors.len(),
            "accrual batch finished"
        );
        report
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::DepositMethod;
    use crate::service::WalletService;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn make_stack() -> (WalletService, InterestAccrualEngine) {
        let store = Arc::new(LedgerStore::new());
        let event_bus = EventBus::new(1000);
        let service = WalletService::new(
            Arc::clone(&store),
            event_bus.clone(),
            None,
            dec!(10000),
        );
        let engine = InterestAccrualEngine::new(store, event_bus, None, dec!(0.07));
        (service, engine)
    }

    async fn qualified_wallet(service: &WalletService, deposit: Decimal) -> WalletId {
        let user_id = Uuid::new_v4();
        let wallet = service.get_or_create_wallet(user_id).await;
        let result = service
            .process_deposit(
                wallet.id,
                user_id,
                deposit,
                DepositMethod::Manual { note: None },
            )
            .await;
        assert!(result.is_ok());
        wallet.id
    }

    /// Backdates the wallet's period start so an accrual run sees a
    /// non-empty period.
    async fn backdate(service: &WalletService, wallet_id: WalletId, days: i64) {
        let entry_lock = service.store().get(wallet_id).await.ok();
        let Some(entry_lock) = entry_lock else {
            panic!("wallet missing");
        };
        let mut entry = entry_lock.write().await;
        let backdated = Utc::now() - Duration::days(days);
        entry.wallet.first_deposit_date = Some(backdated);
        entry.wallet.last_interest_calculation = None;
    }

    #[tokio::test]
    async fn thirty_days_on_ten_thousand_is_57_53() {
        let (service, engine) = make_stack();
        let wallet_id = qualified_wallet(&service, dec!(10000)).await;
        backdate(&service, wallet_id, 30).await;

        let outcome = engine.calculate_and_credit_interest(wallet_id).await;
        let Ok(outcome) = outcome else {
            panic!("accrual failed");
        };
        assert!(outcome.credited);
        assert_eq!(outcome.days_in_period, 30);
        // 10000 * 0.07 / 365 * 30 = 57.5342... -> 57.53
        assert_eq!(outcome.amount, dec!(57.53));

        let wallet = service.wallet(wallet_id).await.ok();
        assert_eq!(wallet.map(|w| w.bonus_balance), Some(dec!(57.53)));
    }

    #[tokio::test]
    async fn one_day_on_ten_thousand_is_1_92() {
        let (service, engine) = make_stack();
        let wallet_id = qualified_wallet(&service, dec!(10000)).await;
        backdate(&service, wallet_id, 1).await;

        let outcome = engine.calculate_and_credit_interest(wallet_id).await;
        let Ok(outcome) = outcome else {
            panic!("accrual failed");
        };
        // 10000 * 0.07 / 365 = 1.9178... -> 1.92
        assert_eq!(outcome.amount, dec!(1.92));
    }

    #[tokio::test]
    async fn credited_accrual_is_recorded_as_credited() {
        let (service, engine) = make_stack();
        let wallet_id = qualified_wallet(&service, dec!(10000)).await;
        backdate(&service, wallet_id, 1).await;

        let outcome = engine.calculate_and_credit_interest(wallet_id).await;
        assert!(matches!(outcome, Ok(AccrualOutcome { credited: true, .. })));

        // The audit record ends in the terminal status, not the
        // intermediate `calculated` one.
        let records = engine.log().records_for(wallet_id).await;
        assert_eq!(records.len(), 1);
        assert_eq!(
            records.first().map(|r| r.status),
            Some(AccrualStatus::Credited)
        );
    }

    #[tokio::test]
    async fn same_day_rerun_is_noop() {
        let (service, engine) = make_stack();
        let wallet_id = qualified_wallet(&service, dec!(10000)).await;
        backdate(&service, wallet_id, 1).await;

        let first = engine.calculate_and_credit_interest(wallet_id).await;
        assert!(matches!(first, Ok(AccrualOutcome { credited: true, .. })));

        let second = engine.calculate_and_credit_interest(wallet_id).await;
        let Ok(second) = second else {
            panic!("rerun errored");
        };
        assert!(!second.credited);
        assert_eq!(second.amount, Decimal::ZERO);

        let wallet = service.wallet(wallet_id).await.ok();
        assert_eq!(wallet.map(|w| w.bonus_balance), Some(dec!(1.92)));
    }

    #[tokio::test]
    async fn duplicate_period_key_is_idempotent_skip() {
        let (service, engine) = make_stack();
        let wallet_id = qualified_wallet(&service, dec!(10000)).await;
        backdate(&service, wallet_id, 1).await;

        let now = Utc::now();
        let first = engine
            .calculate_and_credit_interest_at(wallet_id, now)
            .await;
        assert!(matches!(first, Ok(AccrualOutcome { credited: true, .. })));

        // Simulate a retried scheduler tick for the identical period:
        // reset the cursor so the period recomputes the same bounds.
        backdate(&service, wallet_id, 1).await;
        let second = engine
            .calculate_and_credit_interest_at(wallet_id, now)
            .await;
        let Ok(second) = second else {
            panic!("retry errored");
        };
        assert!(!second.credited);
        assert_eq!(engine.log().len().await, 1);
    }

    #[tokio::test]
    async fn unqualified_wallet_is_skipped() {
        let (service, engine) = make_stack();
        let wallet_id = qualified_wallet(&service, dec!(9999)).await;
        backdate(&service, wallet_id, 10).await;

        let outcome = engine.calculate_and_credit_interest(wallet_id).await;
        let Ok(outcome) = outcome else {
            panic!("accrual errored");
        };
        assert!(!outcome.credited);

        let wallet = service.wallet(wallet_id).await.ok();
        assert_eq!(wallet.map(|w| w.bonus_balance), Some(Decimal::ZERO));
    }

    #[tokio::test]
    async fn zero_balance_advances_period_without_transaction() {
        let (service, engine) = make_stack();
        let wallet_id = qualified_wallet(&service, dec!(10000)).await;
        // Spend everything, then backdate.
        {
            let wallet = service.wallet(wallet_id).await.ok();
            let Some(wallet) = wallet else {
                panic!("wallet missing");
            };
            let _ = service
                .use_wallet_for_purchase(
                    wallet_id,
                    wallet.user_id,
                    dec!(10000),
                    Uuid::new_v4(),
                    "drain",
                )
                .await;
        }
        backdate(&service, wallet_id, 5).await;

        let outcome = engine.calculate_and_credit_interest(wallet_id).await;
        let Ok(outcome) = outcome else {
            panic!("accrual errored");
        };
        assert!(!outcome.credited);
        assert_eq!(outcome.days_in_period, 5);

        let wallet = service.wallet(wallet_id).await.ok();
        let Some(wallet) = wallet else {
            panic!("wallet missing");
        };
        assert!(wallet.last_interest_calculation.is_some());
        // deposit + purchase only; no interest transaction.
        let txs = service.transactions(wallet_id).await.unwrap_or_default();
        assert_eq!(txs.len(), 2);
    }

    #[tokio::test]
    async fn interest_accrues_on_cash_only() {
        let (service, engine) = make_stack();
        let wallet_id = qualified_wallet(&service, dec!(10000)).await;
        backdate(&service, wallet_id, 1).await;

        let first = engine.calculate_and_credit_interest(wallet_id).await;
        assert!(first.is_ok());
        backdate(&service, wallet_id, 1).await;

        // Second run: principal is still the 10000 cash balance, not
        // 10001.92 — the bonus balance earns nothing.
        let second = engine.calculate_and_credit_interest(wallet_id).await;
        let Ok(second) = second else {
            panic!("accrual errored");
        };
        assert_eq!(second.amount, dec!(1.92));
    }

    #[tokio::test]
    async fn batch_isolates_failures_and_reports() {
        let (service, engine) = make_stack();
        let healthy = qualified_wallet(&service, dec!(10000)).await;
        backdate(&service, healthy, 1).await;

        // Deposited today: zero full days, skipped without error.
        let skipped = qualified_wallet(&service, dec!(10000)).await;

        let report = engine.run_batch().await;
        assert_eq!(report.wallets_processed, 2);
        assert_eq!(report.wallets_credited, 1);
        assert_eq!(report.total_credited, dec!(1.92));
        assert!(report.errors.is_empty());

        let skipped_wallet = service.wallet(skipped).await.ok();
        assert_eq!(
            skipped_wallet.map(|w| w.bonus_balance),
            Some(Decimal::ZERO)
        );
    }

    #[tokio::test]
    async fn replay_stays_consistent_after_accrual_and_purchase() {
        let (service, engine) = make_stack();
        let wallet_id = qualified_wallet(&service, dec!(10000)).await;
        backdate(&service, wallet_id, 1).await;

        let _ = engine.calculate_and_credit_interest(wallet_id).await;

        let wallet = service.wallet(wallet_id).await.ok();
        let Some(wallet) = wallet else {
            panic!("wallet missing");
        };
        // Purchase 5000: 1.92 from bonus, 4998.08 from cash.
        let receipt = service
            .use_wallet_for_purchase(wallet_id, wallet.user_id, dec!(5000), Uuid::new_v4(), "o")
            .await;
        let Ok(receipt) = receipt else {
            panic!("purchase rejected");
        };
        assert_eq!(receipt.bonus_used, dec!(1.92));
        assert_eq!(receipt.main_used, dec!(4998.08));
        assert_eq!(receipt.balance_after, dec!(5001.92));

        let report = service.audit(wallet_id).await.ok();
        let Some(report) = report else {
            panic!("audit failed");
        };
        assert!(report.consistent);
    }
}
