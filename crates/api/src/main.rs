use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use microsaas_api::config::AppConfig;
use microsaas_api::logging;
use microsaas_api::router::build_app_router;
use microsaas_api::state::AppState;
use microsaas_events::{EventBus, HistoryWriter, Mailer, NotificationDispatcher, PgHistoryStore};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env().expect("Invalid configuration");
    logging::init(&config.log);
    tracing::info!(
        host = %config.server.host,
        port = %config.server.port,
        app = %config.mail.application_name,
        "Loaded server configuration"
    );

    // --- Database ---
    let pool = microsaas_db::create_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    microsaas_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    microsaas_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Event services ---
    let event_bus = Arc::new(EventBus::new());
    let cancel = CancellationToken::new();

    let history_store = Arc::new(PgHistoryStore::new(pool.clone()));
    let history_handle =
        HistoryWriter::start(Arc::clone(&history_store), &event_bus, cancel.clone()).await;
    let notification_handle = NotificationDispatcher::start(&event_bus, cancel.clone()).await;
    tracing::info!("Event services started (history writer, notification dispatcher)");

    let mailer = Mailer::from_config(config.mail.clone(), Arc::clone(&event_bus))
        .expect("Invalid mail configuration");

    // --- App ---
    let state = AppState {
        pool,
        mailer: Arc::new(mailer),
        history: history_store,
        consumers: Arc::from([history_handle.status(), notification_handle.status()]),
    };
    let app = build_app_router(state, &config.server);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.server.host.parse().expect("Invalid HOST address"),
        config.server.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    cancel.cancel();
    let timeout = Duration::from_secs(config.server.shutdown_timeout_secs);
    for handle in [history_handle, notification_handle] {
        let name = handle.name();
        if handle.stopped(timeout).await {
            tracing::info!(consumer = name, "Event consumer shut down");
        }
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
