//! Domain layer: wallet aggregate, ledger store, accrual log, and events.

pub mod accrual;
pub mod deposit_request;
pub mod event_bus;
pub mod ledger_store;
pub mod transaction;
pub mod wallet;
pub mod wallet_event;
pub mod wallet_id;

pub use accrual::{AccrualLog, AccrualPeriodKey, AccrualStatus, InterestCalculation};
pub use deposit_request::{DepositRequest, DepositRequestStatus};
pub use event_bus::EventBus;
pub use ledger_store::{LedgerStore, Mutation, WalletEntry};
pub use transaction::{
    BalanceDelta, DepositMethod, TransactionStatus, TransactionType, WalletTransaction,
};
pub use wallet::{Wallet, WalletStatus, WalletSummary};
pub use wallet_event::WalletEvent;
pub use wallet_id::WalletId;
