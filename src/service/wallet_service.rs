//! Wallet service: deposits, purchase debits, refunds, and wallet admin.
//!
//! Orchestration layer over the [`LedgerStore`]. Every mutation method
//! follows the pattern: acquire the wallet's write lock → decide under
//! the lock → `apply_mutation` → emit event → best-effort persistence.
//! The check-then-act sequence never leaves the critical section, so two
//! concurrent purchases can never both observe the same pre-mutation
//! balance.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{
    BalanceDelta, DepositMethod, DepositRequest, EventBus, LedgerStore, Mutation,
    TransactionType, Wallet, WalletEvent, WalletId, WalletStatus, WalletTransaction,
};
use crate::error::LedgerError;
use crate::persistence::PostgresLedger;

/// Result of a successful deposit.
#[derive(Debug, Clone, Serialize)]
pub struct DepositReceipt {
    /// Audit record for the deposit.
    pub transaction_id: Uuid,
    /// Whether *this* deposit triggered interest qualification (false for
    /// wallets that already qualified).
    pub qualifies_for_bonus: bool,
    /// Immediate welcome bonus credited with the deposit. Always zero:
    /// qualification unlocks daily accrual, which is the only bonus
    /// source.
    pub bonus_amount: Decimal,
    /// Cash balance after the deposit.
    pub balance_after: Decimal,
    /// Cumulative deposits after this one.
    pub total_deposited: Decimal,
}

/// Result of a successful purchase debit.
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseReceipt {
    /// Audit record for the purchase.
    pub transaction_id: Uuid,
    /// Portion drawn from the bonus balance.
    pub bonus_used: Decimal,
    /// Portion drawn from the cash balance.
    pub main_used: Decimal,
    /// Cash balance after the debit.
    pub balance_after: Decimal,
    /// Bonus balance after the debit.
    pub bonus_balance_after: Decimal,
}

/// Result of a refund credit.
#[derive(Debug, Clone, Serialize)]
pub struct RefundReceipt {
    /// Audit record for the refund.
    pub transaction_id: Uuid,
    /// Amount credited to the cash balance.
    pub amount: Decimal,
    /// Cash balance after the credit.
    pub balance_after: Decimal,
}

/// Replay consistency report for a wallet (audit endpoint).
#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    /// Wallet identifier.
    pub wallet_id: WalletId,
    /// Whether replaying history reproduces the live balances.
    pub consistent: bool,
    /// Live cash balance.
    pub balance: Decimal,
    /// Live bonus balance.
    pub bonus_balance: Decimal,
    /// Cash balance reconstructed from completed transactions.
    pub replayed_balance: Decimal,
    /// Bonus balance reconstructed from completed transactions.
    pub replayed_bonus_balance: Decimal,
    /// Number of transactions replayed.
    pub transaction_count: usize,
}

/// Orchestration layer for all wallet operations.
#[derive(Debug, Clone)]
pub struct WalletService {
    store: Arc<LedgerStore>,
    event_bus: EventBus,
    persistence: Option<Arc<PostgresLedger>>,
    qualifying_threshold: Decimal,
}

impl WalletService {
    /// Creates a new `WalletService`.
    #[must_use]
    pub fn new(
        store: Arc<LedgerStore>,
        event_bus: EventBus,
        persistence: Option<Arc<PostgresLedger>>,
        qualifying_threshold: Decimal,
    ) -> Self {
        Self {
            store,
            event_bus,
            persistence,
            qualifying_threshold,
        }
    }

    /// Returns a reference to the inner [`LedgerStore`].
    #[must_use]
    pub fn store(&self) -> &Arc<LedgerStore> {
        &self.store
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Returns the user's wallet, creating one lazily on first access.
    pub async fn get_or_create_wallet(&self, user_id: Uuid) -> Wallet {
        let (entry_lock, created) = self.store.get_or_create_wallet(user_id).await;
        let wallet = entry_lock.read().await.wallet.clone();

        if created {
            let _ = self.event_bus.publish(WalletEvent::WalletCreated {
                wallet_id: wallet.id,
                user_id,
                timestamp: Utc::now(),
            });
            tracing::info!(wallet_id = %wallet.id, %user_id, "wallet created");
        }
        wallet
    }

    /// Returns a snapshot of the wallet with the given ID.
    ///
    /// # Errors
    ///
    /// [`LedgerError::WalletNotFound`] if the wallet does not exist.
    pub async fn wallet(&self, wallet_id: WalletId) -> Result<Wallet, LedgerError> {
        let entry_lock = self.store.get(wallet_id).await?;
        let entry = entry_lock.read().await;
        Ok(entry.wallet.clone())
    }

    /// Returns a snapshot of the wallet owned by the given user, if any.
    ///
    /// # Errors
    ///
    /// [`LedgerError::WalletNotFoundForUser`] if the user has no wallet.
    pub async fn wallet_by_user(&self, user_id: Uuid) -> Result<Wallet, LedgerError> {
        let entry_lock = self.store.get_by_user(user_id).await?;
        let entry = entry_lock.read().await;
        Ok(entry.wallet.clone())
    }

    /// Applies a validated incoming deposit, deciding bonus-tier
    /// qualification on the wallet's first deposit.
    ///
    /// Qualification is permanent either way: a first deposit at or above
    /// the threshold enables accrual forever; one below it never can,
    /// regardless of later deposits.
    ///
    /// # Errors
    ///
    /// [`LedgerError::InvalidRequest`] for non-positive amounts or a
    /// wallet/user mismatch; [`LedgerError::WalletNotFound`] /
    /// [`LedgerError::WalletNotActive`] from the store.
    pub async fn process_deposit(
        &self,
        wallet_id: WalletId,
        user_id: Uuid,
        amount: Decimal,
        method: DepositMethod,
    ) -> Result<DepositReceipt, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidRequest(format!(
                "deposit amount must be positive, got {amount}"
            )));
        }

        let entry_lock = self.store.get(wallet_id).await?;
        let mut entry = entry_lock.write().await;

        if entry.wallet.user_id != user_id {
            return Err(LedgerError::InvalidRequest(
                "wallet does not belong to user".to_string(),
            ));
        }
        if !entry.wallet.is_active() {
            return Err(LedgerError::WalletNotActive {
                wallet_id: *wallet_id.as_uuid(),
                status: entry.wallet.status.as_str(),
            });
        }

        // First-deposit decision, taken once and never revisited.
        let first_deposit = entry.wallet.first_deposit_date.is_none();
        let qualifies_now = first_deposit && amount >= self.qualifying_threshold;
        if first_deposit {
            entry.wallet.first_deposit_date = Some(Utc::now());
            if qualifies_now {
                entry.wallet.qualifies_for_interest = true;
            }
        }
        entry.wallet.total_deposited += amount;

        let method_str = method.as_str();
        let tx = entry.apply_mutation(Mutation {
            delta: BalanceDelta::credit_cash(amount),
            tx_type: TransactionType::Deposit,
            amount,
            bonus_portion: Decimal::ZERO,
            method: Some(method),
            order_id: None,
            description: format!("{method_str} deposit"),
        })?;

        let receipt = DepositReceipt {
            transaction_id: tx.id,
            qualifies_for_bonus: qualifies_now,
            bonus_amount: Decimal::ZERO,
            balance_after: tx.balance_after,
            total_deposited: entry.wallet.total_deposited,
        };
        drop(entry);

        let _ = self.event_bus.publish(WalletEvent::DepositApplied {
            wallet_id,
            amount,
            balance_after: receipt.balance_after,
            qualified: qualifies_now,
            method: method_str,
            timestamp: Utc::now(),
        });
        tracing::info!(
            wallet_id = %wallet_id,
            %amount,
            qualified = qualifies_now,
            "deposit applied"
        );

        self.persist_transaction(&tx).await;
        Ok(receipt)
    }

    /// Debits a purchase from the wallet, drawing down the bonus balance
    /// before the cash balance, atomically.
    ///
    /// On insufficient total funds nothing moves; a `Failed` transaction
    /// is appended for audit visibility and the error carries the
    /// available/required context.
    ///
    /// # Errors
    ///
    /// [`LedgerError::InsufficientFunds`] on shortfall;
    /// [`LedgerError::InvalidRequest`], [`LedgerError::WalletNotFound`],
    /// [`LedgerError::WalletNotActive`] on precondition failures.
    pub async fn use_wallet_for_purchase(
        &self,
        wallet_id: WalletId,
        user_id: Uuid,
        amount: Decimal,
        order_id: Uuid,
        description: &str,
    ) -> Result<PurchaseReceipt, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidRequest(format!(
                "purchase amount must be positive, got {amount}"
            )));
        }

        let entry_lock = self.store.get(wallet_id).await?;
        let mut entry = entry_lock.write().await;

        if entry.wallet.user_id != user_id {
            return Err(LedgerError::InvalidRequest(
                "wallet does not belong to user".to_string(),
            ));
        }
        if !entry.wallet.is_active() {
            return Err(LedgerError::WalletNotActive {
                wallet_id: *wallet_id.as_uuid(),
                status: entry.wallet.status.as_str(),
            });
        }

        // Bonus-first split, decided on the balances this lock protects.
        let bonus_used = amount.min(entry.wallet.bonus_balance);
        let main_used = amount - bonus_used;

        if main_used > entry.wallet.balance {
            let available = entry.wallet.available();
            entry.record_failed_attempt(Mutation {
                delta: BalanceDelta::default(),
                tx_type: TransactionType::Purchase,
                amount,
                bonus_portion: Decimal::ZERO,
                method: None,
                order_id: Some(order_id),
                description: description.to_string(),
            });
            return Err(LedgerError::InsufficientFunds {
                available,
                required: amount,
            });
        }

        let tx = entry.apply_mutation(Mutation {
            delta: BalanceDelta::debit_split(main_used, bonus_used),
            tx_type: TransactionType::Purchase,
            amount,
            bonus_portion: bonus_used,
            method: None,
            order_id: Some(order_id),
            description: description.to_string(),
        })?;

        let receipt = PurchaseReceipt {
            transaction_id: tx.id,
            bonus_used,
            main_used,
            balance_after: tx.balance_after,
            bonus_balance_after: tx.bonus_balance_after,
        };
        drop(entry);

        let _ = self.event_bus.publish(WalletEvent::PurchaseDebited {
            wallet_id,
            order_id,
            bonus_used,
            main_used,
            balance_after: receipt.balance_after,
            bonus_balance_after: receipt.bonus_balance_after,
            timestamp: Utc::now(),
        });
        tracing::info!(
            wallet_id = %wallet_id,
            %order_id,
            %bonus_used,
            %main_used,
            "purchase debited"
        );

        self.persist_transaction(&tx).await;
        Ok(receipt)
    }

    /// Reverses a purchase by crediting the full amount back to the cash
    /// balance. The original bonus/cash split is deliberately not
    /// reversed; refunds always land in cash.
    ///
    /// # Errors
    ///
    /// [`LedgerError::InvalidRequest`], [`LedgerError::WalletNotFound`],
    /// [`LedgerError::WalletNotActive`] on precondition failures.
    pub async fn refund_purchase(
        &self,
        wallet_id: WalletId,
        user_id: Uuid,
        amount: Decimal,
        order_id: Uuid,
    ) -> Result<RefundReceipt, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidRequest(format!(
                "refund amount must be positive, got {amount}"
            )));
        }

        let entry_lock = self.store.get(wallet_id).await?;
        let mut entry = entry_lock.write().await;

        if entry.wallet.user_id != user_id {
            return Err(LedgerError::InvalidRequest(
                "wallet does not belong to user".to_string(),
            ));
        }

        let tx = entry.apply_mutation(Mutation {
            delta: BalanceDelta::credit_cash(amount),
            tx_type: TransactionType::Refund,
            amount,
            bonus_portion: Decimal::ZERO,
            method: None,
            order_id: Some(order_id),
            description: "purchase refund".to_string(),
        })?;

        let receipt = RefundReceipt {
            transaction_id: tx.id,
            amount,
            balance_after: tx.balance_after,
        };
        drop(entry);

        let _ = self.event_bus.publish(WalletEvent::RefundCredited {
            wallet_id,
            order_id,
            amount,
            timestamp: Utc::now(),
        });
        tracing::info!(wallet_id = %wallet_id, %order_id, %amount, "refund credited");

        self.persist_transaction(&tx).await;
        Ok(receipt)
    }

    /// Announces a pending external deposit awaiting confirmation.
    ///
    /// # Errors
    ///
    /// [`LedgerError::InvalidRequest`] for non-positive amounts.
    pub async fn submit_deposit_request(
        &self,
        user_id: Uuid,
        amount: Decimal,
        method: DepositMethod,
    ) -> Result<DepositRequest, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidRequest(format!(
                "deposit amount must be positive, got {amount}"
            )));
        }
        let request = DepositRequest::new(user_id, amount, method);
        self.store.submit_deposit_request(request.clone()).await;
        tracing::info!(request_id = %request.id, %user_id, %amount, "deposit request submitted");
        Ok(request)
    }

    /// Confirms a pending deposit: routes the amount through
    /// [`Self::process_deposit`] against the user's (lazily created)
    /// wallet. On failure the request goes back to pending.
    ///
    /// # Errors
    ///
    /// [`LedgerError::DepositRequestNotFound`] for unknown or settled
    /// requests; any error from the deposit itself.
    pub async fn confirm_deposit_request(
        &self,
        request_id: Uuid,
    ) -> Result<(DepositRequest, DepositReceipt), LedgerError> {
        let mut request = self.store.take_pending_deposit(request_id).await?;
        let wallet = self.get_or_create_wallet(request.user_id).await;

        let result = self
            .process_deposit(
                wallet.id,
                request.user_id,
                request.amount,
                request.method.clone(),
            )
            .await;

        match result {
            Ok(receipt) => {
                request.confirm();
                self.store.submit_deposit_request(request.clone()).await;
                Ok((request, receipt))
            }
            Err(err) => {
                self.store.submit_deposit_request(request).await;
                Err(err)
            }
        }
    }

    /// Rejects a pending deposit. Terminal; the amount is never applied.
    ///
    /// # Errors
    ///
    /// [`LedgerError::DepositRequestNotFound`] for unknown or settled
    /// requests.
    pub async fn reject_deposit_request(
        &self,
        request_id: Uuid,
    ) -> Result<DepositRequest, LedgerError> {
        let mut request = self.store.take_pending_deposit(request_id).await?;
        request.reject();
        self.store.submit_deposit_request(request.clone()).await;
        tracing::info!(request_id = %request_id, "deposit request rejected");
        Ok(request)
    }

    /// Transitions a wallet's lifecycle status.
    ///
    /// # Errors
    ///
    /// [`LedgerError::WalletNotFound`] or [`LedgerError::InvalidRequest`]
    /// from the store.
    pub async fn set_wallet_status(
        &self,
        wallet_id: WalletId,
        status: WalletStatus,
    ) -> Result<Wallet, LedgerError> {
        let wallet = self.store.set_status(wallet_id, status).await?;
        let _ = self.event_bus.publish(WalletEvent::StatusChanged {
            wallet_id,
            status,
            timestamp: Utc::now(),
        });
        tracing::info!(wallet_id = %wallet_id, status = status.as_str(), "wallet status changed");
        Ok(wallet)
    }

    /// Returns the wallet's transaction history in serialization order.
    ///
    /// # Errors
    ///
    /// [`LedgerError::WalletNotFound`] if the wallet does not exist.
    pub async fn transactions(
        &self,
        wallet_id: WalletId,
    ) -> Result<Vec<WalletTransaction>, LedgerError> {
        let entry_lock = self.store.get(wallet_id).await?;
        let entry = entry_lock.read().await;
        Ok(entry.transactions.clone())
    }

    /// Replays the wallet's completed transactions and compares the
    /// result with the live balances.
    ///
    /// # Errors
    ///
    /// [`LedgerError::WalletNotFound`] if the wallet does not exist.
    pub async fn audit(&self, wallet_id: WalletId) -> Result<AuditReport, LedgerError> {
        let entry_lock = self.store.get(wallet_id).await?;
        let entry = entry_lock.read().await;
        let (replayed_balance, replayed_bonus) = entry.replayed_balances();
        Ok(AuditReport {
            wallet_id,
            consistent: entry.replay_consistent(),
            balance: entry.wallet.balance,
            bonus_balance: entry.wallet.bonus_balance,
            replayed_balance,
            replayed_bonus_balance: replayed_bonus,
            transaction_count: entry.transactions.len(),
        })
    }

    /// Best-effort write-behind to the audit database. Failures are
    /// logged, never propagated: a database outage must not block a
    /// balance mutation that already committed in the store.
    async fn persist_transaction(&self, tx: &WalletTransaction) {
        if let Some(persistence) = &self.persistence
            && let Err(err) = persistence.record_transaction(tx).await
        {
            tracing::warn!(tx_id = %tx.id, error = %err, "transaction persistence failed");
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn make_service() -> WalletService {
        let store = Arc::new(LedgerStore::new());
        let event_bus = EventBus::new(1000);
        WalletService::new(store, event_bus, None, dec!(10000))
    }

    fn bank_transfer() -> DepositMethod {
        DepositMethod::BankTransfer {
            reference: Some("REF-1".to_string()),
            bank_name: None,
        }
    }

    async fn wallet_with_deposit(service: &WalletService, amount: Decimal) -> Wallet {
        let user_id = Uuid::new_v4();
        let wallet = service.get_or_create_wallet(user_id).await;
        let result = service
            .process_deposit(wallet.id, user_id, amount, bank_transfer())
            .await;
        assert!(result.is_ok());
        service.wallet(wallet.id).await.unwrap_or(wallet)
    }

    #[tokio::test]
    async fn deposit_increases_balance_and_total() {
        let service = make_service();
        let wallet = wallet_with_deposit(&service, dec!(500)).await;
        assert_eq!(wallet.balance, dec!(500));
        assert_eq!(wallet.total_deposited, dec!(500));
        assert!(wallet.first_deposit_date.is_some());
    }

    #[tokio::test]
    async fn first_deposit_below_threshold_never_qualifies() {
        let service = make_service();
        let wallet = wallet_with_deposit(&service, dec!(9999)).await;
        assert!(!wallet.qualifies_for_interest);

        // A later large deposit does not change the decision.
        let result = service
            .process_deposit(wallet.id, wallet.user_id, dec!(50000), bank_transfer())
            .await;
        let Ok(receipt) = result else {
            panic!("second deposit rejected");
        };
        assert!(!receipt.qualifies_for_bonus);

        let wallet = service.wallet(wallet.id).await.ok();
        assert_eq!(wallet.map(|w| w.qualifies_for_interest), Some(false));
    }

    #[tokio::test]
    async fn first_deposit_at_threshold_qualifies_permanently() {
        let service = make_service();
        let user_id = Uuid::new_v4();
        let wallet = service.get_or_create_wallet(user_id).await;

        let receipt = service
            .process_deposit(wallet.id, user_id, dec!(10000), bank_transfer())
            .await;
        let Ok(receipt) = receipt else {
            panic!("deposit rejected");
        };
        assert!(receipt.qualifies_for_bonus);
        assert_eq!(receipt.bonus_amount, Decimal::ZERO);

        // Spend it all; qualification survives a zero balance.
        let purchase = service
            .use_wallet_for_purchase(wallet.id, user_id, dec!(10000), Uuid::new_v4(), "order")
            .await;
        assert!(purchase.is_ok());

        let wallet = service.wallet(wallet.id).await.ok();
        let Some(wallet) = wallet else {
            panic!("wallet lookup failed");
        };
        assert_eq!(wallet.balance, Decimal::ZERO);
        assert!(wallet.qualifies_for_interest);
    }

    #[tokio::test]
    async fn later_deposits_report_not_qualifying() {
        let service = make_service();
        let wallet = wallet_with_deposit(&service, dec!(10000)).await;

        let receipt = service
            .process_deposit(wallet.id, wallet.user_id, dec!(10000), bank_transfer())
            .await;
        let Ok(receipt) = receipt else {
            panic!("deposit rejected");
        };
        // Wallet already qualified; this deposit did not trigger it.
        assert!(!receipt.qualifies_for_bonus);
    }

    #[tokio::test]
    async fn non_positive_deposit_rejected() {
        let service = make_service();
        let user_id = Uuid::new_v4();
        let wallet = service.get_or_create_wallet(user_id).await;

        let zero = service
            .process_deposit(wallet.id, user_id, Decimal::ZERO, bank_transfer())
            .await;
        assert!(matches!(zero, Err(LedgerError::InvalidRequest(_))));

        let negative = service
            .process_deposit(wallet.id, user_id, dec!(-5), bank_transfer())
            .await;
        assert!(matches!(negative, Err(LedgerError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn purchase_draws_bonus_before_cash() {
        let service = make_service();
        let wallet = wallet_with_deposit(&service, dec!(50)).await;
        // Seed the bonus balance directly; accrual is tested elsewhere.
        {
            let entry_lock = service.store().get(wallet.id).await.ok();
            let Some(entry_lock) = entry_lock else {
                panic!("wallet missing");
            };
            entry_lock.write().await.wallet.bonus_balance = dec!(100);
        }

        let receipt = service
            .use_wallet_for_purchase(wallet.id, wallet.user_id, dec!(120), Uuid::new_v4(), "order")
            .await;
        let Ok(receipt) = receipt else {
            panic!("purchase rejected");
        };
        assert_eq!(receipt.bonus_used, dec!(100));
        assert_eq!(receipt.main_used, dec!(20));
        assert_eq!(receipt.balance_after, dec!(30));
        assert_eq!(receipt.bonus_balance_after, Decimal::ZERO);
    }

    #[tokio::test]
    async fn insufficient_funds_reports_shortfall_and_writes_failed_tx() {
        let service = make_service();
        let wallet = wallet_with_deposit(&service, dec!(30)).await;

        let result = service
            .use_wallet_for_purchase(wallet.id, wallet.user_id, dec!(120), Uuid::new_v4(), "order")
            .await;
        let Err(LedgerError::InsufficientFunds { available, required }) = result else {
            panic!("expected insufficient funds");
        };
        assert_eq!(available, dec!(30));
        assert_eq!(required, dec!(120));

        // Balance untouched, failed record appended, replay still clean.
        let report = service.audit(wallet.id).await.ok();
        let Some(report) = report else {
            panic!("audit failed");
        };
        assert!(report.consistent);
        assert_eq!(report.balance, dec!(30));
        assert_eq!(report.transaction_count, 2);
    }

    #[tokio::test]
    async fn concurrent_purchases_exactly_one_succeeds() {
        let service = Arc::new(make_service());
        let wallet = wallet_with_deposit(&service, dec!(100)).await;

        let mut handles = Vec::new();
        for _ in 0..2 {
            let service = Arc::clone(&service);
            let wallet_id = wallet.id;
            let user_id = wallet.user_id;
            handles.push(tokio::spawn(async move {
                service
                    .use_wallet_for_purchase(wallet_id, user_id, dec!(100), Uuid::new_v4(), "o")
                    .await
            }));
        }

        let mut successes = 0;
        let mut shortfalls = 0;
        for handle in handles {
            match handle.await {
                Ok(Ok(_)) => successes += 1,
                Ok(Err(LedgerError::InsufficientFunds { .. })) => shortfalls += 1,
                other => panic!("unexpected outcome: {other:?}"),
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(shortfalls, 1);

        let wallet = service.wallet(wallet.id).await.ok();
        assert_eq!(wallet.map(|w| w.balance), Some(Decimal::ZERO));
    }

    #[tokio::test]
    async fn refund_credits_cash_regardless_of_original_split() {
        let service = make_service();
        let wallet = wallet_with_deposit(&service, dec!(50)).await;
        {
            let entry_lock = service.store().get(wallet.id).await.ok();
            let Some(entry_lock) = entry_lock else {
                panic!("wallet missing");
            };
            entry_lock.write().await.wallet.bonus_balance = dec!(100);
        }

        let order_id = Uuid::new_v4();
        let _ = service
            .use_wallet_for_purchase(wallet.id, wallet.user_id, dec!(120), order_id, "order")
            .await;

        let refund = service
            .refund_purchase(wallet.id, wallet.user_id, dec!(120), order_id)
            .await;
        let Ok(refund) = refund else {
            panic!("refund rejected");
        };
        // Full cash credit: 30 remaining + 120 refund; bonus stays at 0.
        assert_eq!(refund.balance_after, dec!(150));
        let wallet = service.wallet(wallet.id).await.ok();
        let Some(wallet) = wallet else {
            panic!("wallet lookup failed");
        };
        assert_eq!(wallet.bonus_balance, Decimal::ZERO);
    }

    #[tokio::test]
    async fn frozen_wallet_rejects_deposit_and_purchase() {
        let service = make_service();
        let wallet = wallet_with_deposit(&service, dec!(100)).await;
        let _ = service
            .set_wallet_status(wallet.id, WalletStatus::Frozen)
            .await;

        let deposit = service
            .process_deposit(wallet.id, wallet.user_id, dec!(10), bank_transfer())
            .await;
        assert!(matches!(deposit, Err(LedgerError::WalletNotActive { .. })));

        let purchase = service
            .use_wallet_for_purchase(wallet.id, wallet.user_id, dec!(10), Uuid::new_v4(), "o")
            .await;
        assert!(matches!(purchase, Err(LedgerError::WalletNotActive { .. })));
    }

    #[tokio::test]
    async fn wrong_user_is_rejected() {
        let service = make_service();
        let wallet = wallet_with_deposit(&service, dec!(100)).await;

        let result = service
            .process_deposit(wallet.id, Uuid::new_v4(), dec!(10), bank_transfer())
            .await;
        assert!(matches!(result, Err(LedgerError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn deposit_request_confirm_flow() {
        let service = make_service();
        let user_id = Uuid::new_v4();

        let request = service
            .submit_deposit_request(user_id, dec!(10000), bank_transfer())
            .await;
        let Ok(request) = request else {
            panic!("submit rejected");
        };

        let confirmed = service.confirm_deposit_request(request.id).await;
        let Ok((settled, receipt)) = confirmed else {
            panic!("confirm rejected");
        };
        assert_eq!(
            settled.status,
            crate::domain::DepositRequestStatus::Confirmed
        );
        assert!(receipt.qualifies_for_bonus);

        // Settled requests cannot be confirmed again, and the retry must
        // not consume the settled record.
        let again = service.confirm_deposit_request(request.id).await;
        assert!(matches!(
            again,
            Err(LedgerError::DepositRequestNotFound(_))
        ));
        let stored = service.store().pending_deposit(request.id).await;
        assert_eq!(
            stored.map(|r| r.status),
            Ok(crate::domain::DepositRequestStatus::Confirmed)
        );
    }

    #[tokio::test]
    async fn deposit_request_reject_flow() {
        let service = make_service();
        let user_id = Uuid::new_v4();

        let request = service
            .submit_deposit_request(user_id, dec!(500), bank_transfer())
            .await;
        let Ok(request) = request else {
            panic!("submit rejected");
        };

        let rejected = service.reject_deposit_request(request.id).await;
        let Ok(rejected) = rejected else {
            panic!("reject failed");
        };
        assert_eq!(
            rejected.status,
            crate::domain::DepositRequestStatus::Rejected
        );

        // Nothing reached any wallet.
        let wallet = service.wallet_by_user(user_id).await;
        assert!(matches!(wallet, Err(LedgerError::WalletNotFoundForUser(_))));
    }

    #[tokio::test]
    async fn events_emitted_per_mutation() {
        let service = make_service();
        let mut rx = service.event_bus().subscribe();

        let user_id = Uuid::new_v4();
        let wallet = service.get_or_create_wallet(user_id).await;
        let _ = service
            .process_deposit(wallet.id, user_id, dec!(10000), bank_transfer())
            .await;

        let created = rx.recv().await;
        let Ok(created) = created else {
            panic!("expected wallet_created");
        };
        assert_eq!(created.event_type_str(), "wallet_created");

        let deposited = rx.recv().await;
        let Ok(deposited) = deposited else {
            panic!("expected deposit_applied");
        };
        assert_eq!(deposited.event_type_str(), "deposit_applied");
    }
}
