//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::EventBus;
use crate::service::{InterestAccrualEngine, WalletService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Wallet service for deposits, purchases, refunds, and admin.
    pub wallet_service: Arc<WalletService>,
    /// Interest accrual engine for on-demand and batch accrual.
    pub accrual_engine: Arc<InterestAccrualEngine>,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
}
