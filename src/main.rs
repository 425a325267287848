//! retail_ledger - ledger daemon
//!
//! Runs the ledger core with its scheduled jobs until shut down. Without a
//! `DATABASE_URL` it runs on the in-memory store.

use std::sync::Arc;

use retail_ledger::db;
use retail_ledger::identifier::AccountNumberGenerator;
use retail_ledger::jobs::JobScheduler;
use retail_ledger::notify::TracingNotifier;
use retail_ledger::store::{InMemoryLedgerStore, LedgerStore, PgLedgerStore};
use retail_ledger::{Config, InterestAccrualEngine, Ledger};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "retail_ledger=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing();

    let config = Config::from_env()?;

    tracing::info!(environment = %config.environment, "Starting retail_ledger");

    let (store, pool): (Arc<dyn LedgerStore>, _) = match config.database_url.as_deref() {
        Some(url) => {
            tracing::info!("Connecting to database...");
            let pool = db::connect(url, config.database_max_connections).await?;

            if !db::check_schema(&pool).await? {
                tracing::error!("Database schema is not complete. Please run migrations.");
                return Err(anyhow::anyhow!("Database schema incomplete"));
            }
            tracing::info!("Database connected successfully");

            (Arc::new(PgLedgerStore::new(pool.clone())), Some(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory store");
            (Arc::new(InMemoryLedgerStore::new()), None)
        }
    };

    let generator = AccountNumberGenerator::new(config.identifier.clone())?;
    let ledger = Arc::new(Ledger::new(
        store,
        generator,
        Arc::new(TracingNotifier),
        config.lock_timeout,
    ));

    let engine = Arc::new(InterestAccrualEngine::new(
        ledger.clone(),
        config.interest.clone(),
    ));
    let scheduler = JobScheduler::with_config(engine, config.jobs.clone()).start();

    tracing::info!(
        otp_ttl_secs = config.workflow.otp_ttl.num_seconds(),
        session_ttl_secs = config.workflow.session_ttl.num_seconds(),
        max_answer_attempts = config.workflow.max_answer_attempts,
        max_otp_attempts = config.workflow.max_otp_attempts,
        "Ledger ready; transfer authorization limits loaded for the request layer"
    );

    shutdown_signal().await;

    // Cleanup
    tracing::info!("Ledger shutting down...");
    scheduler.abort();
    if let Some(pool) = pool {
        pool.close().await;
        tracing::info!("Database connections closed");
    }
    tracing::info!("Goodbye!");

    Ok(())
}

/// Shutdown signal handler for graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}
