//! REST endpoint handlers organized by resource.

pub mod accrual;
pub mod funding;
pub mod system;
pub mod wallet;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(wallet::routes())
        .merge(funding::routes())
        .merge(accrual::routes())
}
