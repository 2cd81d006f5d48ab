//! wallet-ledger server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints, and
//! the daily interest accrual scheduler.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use wallet_ledger::api;
use wallet_ledger::app_state::AppState;
use wallet_ledger::config::LedgerConfig;
use wallet_ledger::domain::{EventBus, LedgerStore};
use wallet_ledger::persistence::{PostgresLedger, restore_from_audit};
use wallet_ledger::scheduler::AccrualScheduler;
use wallet_ledger::service::{InterestAccrualEngine, WalletService};
use wallet_ledger::ws::handler::ws_handler;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = LedgerConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, "starting wallet-ledger");

    // Optional audit database
    let persistence = if config.persistence_enabled {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("audit database connected");
        Some(Arc::new(PostgresLedger::new(pool)))
    } else {
        tracing::warn!("persistence disabled, running in-memory only");
        None
    };

    // Build domain layer
    let store = Arc::new(LedgerStore::new());
    let event_bus = EventBus::new(config.event_bus_capacity);

    // Build service layer
    let wallet_service = Arc::new(WalletService::new(
        Arc::clone(&store),
        event_bus.clone(),
        persistence.clone(),
        config.qualifying_threshold,
    ));
    let accrual_engine = Arc::new(InterestAccrualEngine::new(
        Arc::clone(&store),
        event_bus.clone(),
        persistence.clone(),
        config.interest_rate,
    ));

    // Rebuild the in-memory ledger from the audit trail
    if let Some(persistence) = &persistence {
        restore_from_audit(persistence, &store, accrual_engine.log()).await?;
    }

    // Snapshot cleanup, once at startup
    if let Some(persistence) = &persistence
        && config.cleanup_after_days > 0
    {
        match persistence.delete_old_snapshots(config.cleanup_after_days).await {
            Ok(deleted) => tracing::info!(deleted, "old snapshots cleaned up"),
            Err(err) => tracing::warn!(error = %err, "snapshot cleanup failed"),
        }
    }

    // Periodic wallet snapshots
    if let Some(persistence) = &persistence
        && config.snapshot_interval_secs > 0
    {
        let store = Arc::clone(&store);
        let persistence = Arc::clone(persistence);
        let mut ticker =
            tokio::time::interval(Duration::from_secs(config.snapshot_interval_secs));
        tokio::spawn(async move {
            // The first tick fires immediately; the restore above already
            // reflects the database, so skip it.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                for wallet in store.wallets().await {
                    if let Err(err) = persistence.save_wallet_snapshot(&wallet).await {
                        tracing::warn!(
                            wallet_id = %wallet.id,
                            error = %err,
                            "wallet snapshot failed"
                        );
                    }
                }
            }
        });
    }

    // Daily accrual at UTC midnight
    let scheduler = Arc::new(AccrualScheduler::new(Arc::clone(&accrual_engine)));
    if config.scheduler_enabled {
        scheduler.start().await;
    } else {
        tracing::warn!("accrual scheduler disabled");
    }

    // Build application state
    let app_state = AppState {
        wallet_service,
        accrual_engine,
        event_bus,
    };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
