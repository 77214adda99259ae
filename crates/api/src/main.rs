use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aqualog_api::config::ServerConfig;
use aqualog_api::router::build_app_router;
use aqualog_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aqualog_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = aqualog_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    aqualog_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    aqualog_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    bootstrap_admin(&pool).await;

    // --- Event bus ---
    let event_bus = Arc::new(aqualog_events::EventBus::default());

    // Spawn audit persistence (writes all domain events to audit_logs).
    let persistence_handle = tokio::spawn(aqualog_events::AuditPersistence::run(
        pool.clone(),
        event_bus.subscribe(),
    ));
    tracing::info!("Audit persistence started");

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        event_bus: Arc::clone(&event_bus),
    };

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
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

    // Drop the event bus sender to close the broadcast channel.
    // This signals audit persistence to shut down.
    drop(event_bus);
    let _ = tokio::time::timeout(Duration::from_secs(5), persistence_handle).await;
    tracing::info!("Audit persistence shut down");

    tracing::info!("Graceful shutdown complete");
}

/// Create the first admin account on an empty `users` table.
///
/// The password comes from the `ADMIN_PASSWORD` env var; without it the
/// bootstrap is skipped (and nobody can log in), which is logged loudly.
async fn bootstrap_admin(pool: &aqualog_db::DbPool) {
    use aqualog_api::auth::password::hash_password;
    use aqualog_db::repositories::UserRepo;

    let user_count = UserRepo::count(pool)
        .await
        .expect("Failed to count users for admin bootstrap");
    if user_count > 0 {
        return;
    }

    let Ok(password) = std::env::var("ADMIN_PASSWORD") else {
        tracing::warn!(
            "users table is empty and ADMIN_PASSWORD is not set; \
             no account can log in until one is created"
        );
        return;
    };

    let hash = hash_password(&password).expect("Failed to hash bootstrap admin password");
    let admin = UserRepo::create(pool, "admin", &hash, Some("Administrator"), "admin")
        .await
        .expect("Failed to create bootstrap admin user");
    tracing::info!(user_id = admin.id, "Created bootstrap admin user");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server shuts
/// down cleanly whether stopped interactively or by a process manager
/// (e.g. systemd, Docker, Kubernetes).
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
