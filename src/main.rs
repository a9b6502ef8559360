//! revise-scheduler - spaced-repetition revision backend
//!
//! Serves the item API and runs the due-item reminder scan. Uses PostgreSQL
//! when `DATABASE_URL` is set and in-memory storage otherwise.

use std::net::SocketAddr;
use std::sync::Arc;

use revise_scheduler::api::{self, AppState};
use revise_scheduler::domain::{SharedClock, SystemClock};
use revise_scheduler::jobs::{
    ReminderScanner, ReminderScheduler, ReminderSchedulerConfig, TracingNotifier,
};
use revise_scheduler::repository::{
    InMemoryReviseItemRepository, InMemoryUserDirectory, PgReviseItemRepository, PgUserDirectory,
    ReviseItemRepository, UserDirectory,
};
use revise_scheduler::{db, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging
fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "revise_scheduler=debug,tower_http=debug".into());

    if config.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;
    init_tracing(&config);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let clock: SharedClock = Arc::new(SystemClock);

    tracing::info!(
        environment = %config.environment,
        interval_slots = config.revision_intervals.len(),
        "Starting revise-scheduler"
    );

    match config.database_url.clone() {
        Some(database_url) => {
            tracing::info!("Connecting to database...");
            let pool = db::connect(&database_url, config.database_max_connections).await?;
            db::verify_connection(&pool).await?;

            // Verify database schema
            if !db::check_schema(&pool).await? {
                tracing::error!("Database schema is not complete. Please run migrations.");
                return Err(anyhow::anyhow!("Database schema incomplete"));
            }
            tracing::info!("Database connected successfully");

            let items = PgReviseItemRepository::new(pool.clone());
            let users: Arc<dyn UserDirectory> = Arc::new(PgUserDirectory::new(pool.clone()));
            run(&config, addr, items, users, clock).await?;

            pool.close().await;
            tracing::info!("Database connections closed");
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory storage");
            let items = InMemoryReviseItemRepository::new();
            let users: Arc<dyn UserDirectory> = Arc::new(InMemoryUserDirectory::new(items.clone()));
            run(&config, addr, items, users, clock).await?;
        }
    }

    tracing::info!("Goodbye!");
    Ok(())
}

/// Serve HTTP and run the reminder scheduler until a shutdown signal
async fn run<R>(
    config: &Config,
    addr: SocketAddr,
    items: R,
    users: Arc<dyn UserDirectory>,
    clock: SharedClock,
) -> anyhow::Result<()>
where
    R: ReviseItemRepository + Clone + 'static,
{
    let scanner = ReminderScanner::with_config(
        Arc::clone(&users),
        Arc::new(TracingNotifier),
        Arc::clone(&clock),
        ReminderSchedulerConfig::from(config),
    );
    let scheduler = ReminderScheduler::new(scanner).start();

    let app = api::build_router(AppState {
        items,
        users,
        clock,
        intervals: Arc::new(config.revision_intervals.clone()),
    });

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);

    // Graceful shutdown
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    tracing::info!("Server shutting down...");
    scheduler.stop().await;

    served?;
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
