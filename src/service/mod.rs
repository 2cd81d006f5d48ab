//! Service layer: wallet operations and the interest accrual engine.

pub mod accrual;
pub mod wallet_service;

pub use accrual::{AccrualOutcome, BatchReport, InterestAccrualEngine};
pub use wallet_service::{
    AuditReport, DepositReceipt, PurchaseReceipt, RefundReceipt, WalletService,
};
