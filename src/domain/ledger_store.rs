//! Concurrent wallet storage with per-wallet fine-grained locking.
//!
//! [`LedgerStore`] keeps all wallets in a `HashMap` where each entry is
//! individually protected by a [`tokio::sync::RwLock`]. The wallet row is
//! the unit of mutual exclusion: mutations on the same wallet are strictly
//! serialized while different wallets are mutated fully in parallel.
//!
//! [`WalletEntry::apply_mutation`] is the single mutation path. Nothing
//! outside it writes `balance` or `bonus_balance`, and it is only
//! reachable through an entry's write lock, so every read-decide-write
//! sequence a caller performs under that lock is one critical section.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::WalletId;
use super::deposit_request::{DepositRequest, DepositRequestStatus};
use super::transaction::{
    BalanceDelta, DepositMethod, TransactionStatus, TransactionType, WalletTransaction,
};
use super::wallet::{Wallet, WalletStatus, WalletSummary};
use crate::error::LedgerError;

/// Description of a single balance mutation handed to
/// [`WalletEntry::apply_mutation`].
#[derive(Debug, Clone)]
pub struct Mutation {
    /// Signed change to both balances.
    pub delta: BalanceDelta,
    /// Transaction type recorded in the audit trail.
    pub tx_type: TransactionType,
    /// Positive magnitude recorded on the transaction.
    pub amount: Decimal,
    /// Portion of `amount` that moved through the bonus balance.
    pub bonus_portion: Decimal,
    /// Method details for deposits, pass-through.
    pub method: Option<DepositMethod>,
    /// Order back-reference for purchase/refund.
    pub order_id: Option<Uuid>,
    /// Human-readable description.
    pub description: String,
}

/// A wallet together with its append-only transaction history.
///
/// Stored behind `Arc<RwLock<...>>` in the [`LedgerStore`]; holding the
/// write lock is what serializes mutations on this wallet.
#[derive(Debug)]
pub struct WalletEntry {
    /// The wallet aggregate.
    pub wallet: Wallet,
    /// Append-only transaction history, in true serialization order.
    pub transactions: Vec<WalletTransaction>,
}

impl WalletEntry {
    /// Creates an entry for a freshly created wallet.
    #[must_use]
    pub fn new(wallet: Wallet) -> Self {
        Self {
            wallet,
            transactions: Vec::new(),
        }
    }

    /// Applies a balance mutation atomically: status check, negative-
    /// balance rejection, balance write, and audit-record append happen
    /// as one unit under the caller-held write lock. On rejection no
    /// state is touched.
    ///
    /// # Errors
    ///
    /// [`LedgerError::WalletNotActive`] if the wallet is frozen or
    /// closed; [`LedgerError::InsufficientFunds`] if either resulting
    /// balance would go negative.
    pub fn apply_mutation(&mut self, mutation: Mutation) -> Result<WalletTransaction, LedgerError> {
        if !self.wallet.is_active() {
            return Err(LedgerError::WalletNotActive {
                wallet_id: *self.wallet.id.as_uuid(),
                status: self.wallet.status.as_str(),
            });
        }

        let new_balance = self.wallet.balance + mutation.delta.balance;
        let new_bonus = self.wallet.bonus_balance + mutation.delta.bonus_balance;
        if new_balance < Decimal::ZERO || new_bonus < Decimal::ZERO {
            return Err(LedgerError::InsufficientFunds {
                available: self.wallet.available(),
                required: mutation.amount,
            });
        }

        let now = Utc::now();
        self.wallet.balance = new_balance;
        self.wallet.bonus_balance = new_bonus;
        self.wallet.last_modified_at = now;

        let tx = WalletTransaction {
            id: Uuid::new_v4(),
            wallet_id: self.wallet.id,
            user_id: self.wallet.user_id,
            tx_type: mutation.tx_type,
            amount: mutation.amount,
            bonus_portion: mutation.bonus_portion,
            balance_after: new_balance,
            bonus_balance_after: new_bonus,
            status: TransactionStatus::Completed,
            method: mutation.method,
            order_id: mutation.order_id,
            description: mutation.description,
            created_at: now,
            processed_at: Some(now),
        };
        self.transactions.push(tx.clone());
        Ok(tx)
    }

    /// Records a rejected attempt for audit visibility without touching
    /// the balances. Replay ignores non-completed records.
    pub fn record_failed_attempt(&mut self, mutation: Mutation) -> WalletTransaction {
        let now = Utc::now();
        let tx = WalletTransaction {
            id: Uuid::new_v4(),
            wallet_id: self.wallet.id,
            user_id: self.wallet.user_id,
            tx_type: mutation.tx_type,
            amount: mutation.amount,
            bonus_portion: mutation.bonus_portion,
            balance_after: self.wallet.balance,
            bonus_balance_after: self.wallet.bonus_balance,
            status: TransactionStatus::Failed,
            method: mutation.method,
            order_id: mutation.order_id,
            description: mutation.description,
            created_at: now,
            processed_at: Some(now),
        };
        self.transactions.push(tx.clone());
        tx
    }

    /// Replays the completed transaction chain and returns the balances
    /// it reproduces. Must equal the wallet's current balances at all
    /// times.
    #[must_use]
    pub fn replayed_balances(&self) -> (Decimal, Decimal) {
        let mut balance = Decimal::ZERO;
        let mut bonus = Decimal::ZERO;
        for tx in &self.transactions {
            if tx.status != TransactionStatus::Completed {
                continue;
            }
            balance += tx.cash_delta();
            bonus += tx.bonus_delta();
        }
        (balance, bonus)
    }

    /// Returns `true` if replaying history reproduces the live balances.
    #[must_use]
    pub fn replay_consistent(&self) -> bool {
        self.replayed_balances() == (self.wallet.balance, self.wallet.bonus_balance)
    }
}

/// Inner maps guarded by a single lock so wallet creation and the
/// user-uniqueness check are one critical section.
#[derive(Debug, Default)]
struct StoreInner {
    by_id: HashMap<WalletId, Arc<RwLock<WalletEntry>>>,
    by_user: HashMap<Uuid, WalletId>,
}

/// Central store for all wallets and pending deposit requests.
///
/// # Concurrency
///
/// - `get_or_create_wallet` is serialized on the outer lock together with
///   the `user_id` index, so concurrent calls for the same user can never
///   create duplicate wallets.
/// - Mutations on the same wallet are serialized by the per-entry write
///   lock; different wallets proceed in parallel.
#[derive(Debug, Default)]
pub struct LedgerStore {
    inner: RwLock<StoreInner>,
    pending_deposits: RwLock<HashMap<Uuid, DepositRequest>>,
}

impl LedgerStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the wallet for the user, creating one with zero balances
    /// if none exists. Idempotent and safe to call concurrently for the
    /// same user. The boolean is `true` when a wallet was created.
    pub async fn get_or_create_wallet(
        &self,
        user_id: Uuid,
    ) -> (Arc<RwLock<WalletEntry>>, bool) {
        // Fast path: shared lock, wallet already exists.
        {
            let inner = self.inner.read().await;
            if let Some(id) = inner.by_user.get(&user_id)
                && let Some(entry) = inner.by_id.get(id)
            {
                return (Arc::clone(entry), false);
            }
        }

        let mut inner = self.inner.write().await;
        // Re-check under the write lock: another task may have won the race.
        if let Some(id) = inner.by_user.get(&user_id)
            && let Some(entry) = inner.by_id.get(id)
        {
            return (Arc::clone(entry), false);
        }

        let wallet = Wallet::new(user_id);
        let id = wallet.id;
        let entry = Arc::new(RwLock::new(WalletEntry::new(wallet)));
        inner.by_id.insert(id, Arc::clone(&entry));
        inner.by_user.insert(user_id, id);
        (entry, true)
    }

    /// Returns a shared reference to the wallet entry behind its lock.
    ///
    /// # Errors
    ///
    /// [`LedgerError::WalletNotFound`] if no wallet with the given ID
    /// exists.
    pub async fn get(&self, wallet_id: WalletId) -> Result<Arc<RwLock<WalletEntry>>, LedgerError> {
        let inner = self.inner.read().await;
        inner
            .by_id
            .get(&wallet_id)
            .cloned()
            .ok_or(LedgerError::WalletNotFound(*wallet_id.as_uuid()))
    }

    /// Looks up a wallet by its owning user.
    ///
    /// # Errors
    ///
    /// [`LedgerError::WalletNotFoundForUser`] if the user has no wallet.
    pub async fn get_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Arc<RwLock<WalletEntry>>, LedgerError> {
        let inner = self.inner.read().await;
        let id = inner
            .by_user
            .get(&user_id)
            .ok_or(LedgerError::WalletNotFoundForUser(user_id))?;
        inner
            .by_id
            .get(id)
            .cloned()
            .ok_or(LedgerError::WalletNotFoundForUser(user_id))
    }

    /// Transitions a wallet's lifecycle status, returning the updated
    /// wallet.
    ///
    /// # Errors
    ///
    /// [`LedgerError::WalletNotFound`] if the wallet does not exist;
    /// [`LedgerError::InvalidRequest`] when reopening a closed wallet.
    pub async fn set_status(
        &self,
        wallet_id: WalletId,
        status: WalletStatus,
    ) -> Result<Wallet, LedgerError> {
        let entry_lock = self.get(wallet_id).await?;
        let mut entry = entry_lock.write().await;
        // Closed is terminal.
        if entry.wallet.status == WalletStatus::Closed && status != WalletStatus::Closed {
            return Err(LedgerError::InvalidRequest(
                "closed wallets cannot be reopened".to_string(),
            ));
        }
        entry.wallet.status = status;
        entry.wallet.last_modified_at = Utc::now();
        Ok(entry.wallet.clone())
    }

    /// Returns the IDs of all wallets with interest accrual enabled and
    /// status active, in no particular order.
    pub async fn qualifying_wallets(&self) -> Vec<WalletId> {
        let inner = self.inner.read().await;
        let mut ids = Vec::new();
        for (id, entry_lock) in &inner.by_id {
            let entry = entry_lock.read().await;
            if entry.wallet.qualifies_for_interest && entry.wallet.is_active() {
                ids.push(*id);
            }
        }
        ids
    }

    /// Returns summaries of all wallets.
    pub async fn list(&self) -> Vec<WalletSummary> {
        let inner = self.inner.read().await;
        let mut summaries = Vec::with_capacity(inner.by_id.len());
        for entry_lock in inner.by_id.values() {
            let entry = entry_lock.read().await;
            summaries.push(WalletSummary::from(&entry.wallet));
        }
        summaries
    }

    /// Returns full clones of all wallets, for snapshotting.
    pub async fn wallets(&self) -> Vec<Wallet> {
        let inner = self.inner.read().await;
        let mut wallets = Vec::with_capacity(inner.by_id.len());
        for entry_lock in inner.by_id.values() {
            wallets.push(entry_lock.read().await.wallet.clone());
        }
        wallets
    }

    /// Inserts a recovered wallet together with its transaction history.
    ///
    /// Intended for startup restore from the audit database; an existing
    /// entry with the same ID is left untouched and `false` is returned.
    pub async fn restore_wallet(
        &self,
        wallet: Wallet,
        transactions: Vec<WalletTransaction>,
    ) -> bool {
        let mut inner = self.inner.write().await;
        if inner.by_id.contains_key(&wallet.id) {
            return false;
        }
        let id = wallet.id;
        let user_id = wallet.user_id;
        let entry = WalletEntry {
            wallet,
            transactions,
        };
        inner.by_id.insert(id, Arc::new(RwLock::new(entry)));
        inner.by_user.insert(user_id, id);
        true
    }

    /// Stores a pending deposit request awaiting upstream confirmation.
    pub async fn submit_deposit_request(&self, request: DepositRequest) {
        let mut pending = self.pending_deposits.write().await;
        pending.insert(request.id, request);
    }

    /// Removes and returns a pending deposit request for settlement.
    ///
    /// # Errors
    ///
    /// [`LedgerError::DepositRequestNotFound`] if the request does not
    /// exist or was already settled.
    pub async fn take_pending_deposit(&self, id: Uuid) -> Result<DepositRequest, LedgerError> {
        let mut pending = self.pending_deposits.write().await;
        let request = pending
            .get(&id)
            .ok_or(LedgerError::DepositRequestNotFound(id))?;
        // Settled requests stay readable; only a pending one is consumed.
        if request.status != DepositRequestStatus::Pending {
            return Err(LedgerError::DepositRequestNotFound(id));
        }
        pending
            .remove(&id)
            .ok_or(LedgerError::DepositRequestNotFound(id))
    }

    /// Returns a snapshot of a pending deposit request.
    ///
    /// # Errors
    ///
    /// [`LedgerError::DepositRequestNotFound`] if the request does not
    /// exist.
    pub async fn pending_deposit(&self, id: Uuid) -> Result<DepositRequest, LedgerError> {
        let pending = self.pending_deposits.read().await;
        pending
            .get(&id)
            .cloned()
            .ok_or(LedgerError::DepositRequestNotFound(id))
    }

    /// Returns the number of wallets in the store.
    pub async fn len(&self) -> usize {
        self.inner.read().await.by_id.len()
    }

    /// Returns `true` if the store contains no wallets.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.by_id.is_empty()
    }
}
