//! Persistence layer: PostgreSQL audit trail and wallet snapshots.
//!
//! The in-memory [`crate::domain::LedgerStore`] is authoritative for live
//! balances; this layer keeps the durable record — every transaction,
//! every interest calculation, and periodic wallet snapshots — using
//! `sqlx::PgPool` for async PostgreSQL access. All writes are
//! write-behind and best-effort from the services' point of view.

pub mod models;
pub mod postgres;
pub mod recovery;

pub use postgres::PostgresLedger;
pub use recovery::{RestoreReport, restore_from_audit};
