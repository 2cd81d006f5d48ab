//! Daily accrual scheduler.
//!
//! [`AccrualScheduler`] is an explicit lifecycle object constructed once
//! at process start: it owns the background task that fires the accrual
//! batch at the next UTC midnight and every 24 hours after that. The
//! accrual log's unique period key is the safety net if two instances
//! ever fire for the same period.

use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::service::InterestAccrualEngine;

/// Seconds in one day.
const DAY_SECS: u64 = 24 * 60 * 60;

/// Time-driven trigger for the interest accrual batch.
///
/// `start` is idempotent while a task is running; `stop` aborts the task.
/// All per-wallet failures are handled inside the batch, so the task
/// itself never terminates on a wallet error.
#[derive(Debug)]
pub struct AccrualScheduler {
    engine: Arc<InterestAccrualEngine>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl AccrualScheduler {
    /// Creates a scheduler for the given engine. Does not start it.
    #[must_use]
    pub fn new(engine: Arc<InterestAccrualEngine>) -> Self {
        Self {
            engine,
            handle: Mutex::new(None),
        }
    }

    /// Starts the background task: first fire at the next UTC midnight,
    /// then every 24 hours. No-op if already running.
    pub async fn start(&self) {
        let mut handle = self.handle.lock().await;
        if handle.as_ref().is_some_and(|h| !h.is_finished()) {
            tracing::debug!("accrual scheduler already running");
            return;
        }

        let engine = Arc::clone(&self.engine);
        let delay = seconds_until_next_midnight(Utc::now());
        tracing::info!(first_fire_in_secs = delay, "accrual scheduler started");

        *handle = Some(tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_secs(delay)).await;
            let mut ticker =
                tokio::time::interval(std::time::Duration::from_secs(DAY_SECS));
            loop {
                // First tick completes immediately, covering the
                // midnight fire itself.
                ticker.tick().await;
                let report = engine.run_batch().await;
                if !report.errors.is_empty() {
                    tracing::warn!(
                        failures = report.errors.len(),
                        "accrual batch completed with failures"
                    );
                }
            }
        }));
    }

    /// Stops the background task if it is running.
    pub async fn stop(&self) {
        let mut handle = self.handle.lock().await;
        if let Some(task) = handle.take() {
            task.abort();
            tracing::info!("accrual scheduler stopped");
        }
    }

    /// Returns `true` if the background task is running.
    pub async fn is_running(&self) -> bool {
        let handle = self.handle.lock().await;
        handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

/// Seconds from `now` until the next UTC midnight.
///
/// Returns a full day when called exactly at midnight, so a tick never
/// fires twice for the same calendar day.
#[must_use]
pub fn seconds_until_next_midnight(now: DateTime<Utc>) -> u64 {
    let next_midnight = (now + ChronoDuration::days(1))
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
        .unwrap_or(now);
    (next_midnight - now).num_seconds().max(0).unsigned_abs()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{EventBus, LedgerStore};
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn make_scheduler() -> AccrualScheduler {
        let store = Arc::new(LedgerStore::new());
        let event_bus = EventBus::new(100);
        let engine = Arc::new(InterestAccrualEngine::new(
            store,
            event_bus,
            None,
            dec!(0.07),
        ));
        AccrualScheduler::new(engine)
    }

    #[test]
    fn midday_delay_is_half_a_day() {
        let Some(now) = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).single() else {
            panic!("invalid timestamp");
        };
        assert_eq!(seconds_until_next_midnight(now), 12 * 60 * 60);
    }

    #[test]
    fn just_before_midnight_is_one_second() {
        let Some(now) = Utc.with_ymd_and_hms(2024, 6, 15, 23, 59, 59).single() else {
            panic!("invalid timestamp");
        };
        assert_eq!(seconds_until_next_midnight(now), 1);
    }

    #[test]
    fn exactly_midnight_is_a_full_day() {
        let Some(now) = Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).single() else {
            panic!("invalid timestamp");
        };
        assert_eq!(seconds_until_next_midnight(now), DAY_SECS);
    }

    #[tokio::test]
    async fn start_stop_lifecycle() {
        let scheduler = make_scheduler();
        assert!(!scheduler.is_running().await);

        scheduler.start().await;
        assert!(scheduler.is_running().await);

        // Second start is a no-op, not a second task.
        scheduler.start().await;
        assert!(scheduler.is_running().await);

        scheduler.stop().await;
        assert!(!scheduler.is_running().await);
    }

    #[tokio::test]
    async fn stop_without_start_is_harmless() {
        let scheduler = make_scheduler();
        scheduler.stop().await;
        assert!(!scheduler.is_running().await);
    }
}
