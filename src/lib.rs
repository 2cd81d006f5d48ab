//! # wallet-ledger
//!
//! Customer wallet and interest-accrual ledger service.
//!
//! Each user owns one wallet with two balances: a cash balance fed by
//! deposits and refunds, and a bonus balance fed by daily interest. A
//! first deposit at or above the qualifying threshold permanently
//! unlocks accrual; purchases draw the bonus balance down before cash.
//! Every mutation appends an immutable transaction record, so balances
//! can always be reconstructed by replay.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── WalletService + InterestAccrualEngine (service/)
//!     ├── AccrualScheduler (scheduler)
//!     ├── EventBus (domain/)
//!     │
//!     ├── LedgerStore (domain/)
//!     │
//!     └── PostgreSQL Persistence (audit trail)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod scheduler;
pub mod service;
pub mod ws;
