//! JWT Pizza service binary.
//!
//! Serves the JSON API on `PIZZA_HOST:PIZZA_PORT`.
//!
//! # Startup
//!
//! 1. Load configuration (fatal on error)
//! 2. Initialize Sentry, then tracing
//! 3. Connect to `PostgreSQL` and bootstrap the schema; seed the default
//!    admin if one is configured and no admin exists yet
//! 4. Start the metrics reporter if a metrics endpoint is configured
//! 5. Serve until Ctrl+C or SIGTERM, then flush metrics once more

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;

use pizza_core::Role;
use pizza_service::config::{DefaultAdmin, ServiceConfig};
use pizza_service::db::{self, Database};
use pizza_service::metrics::{Metrics, MetricsExporter, MetricsReporter};
use pizza_service::models::NewUser;
use pizza_service::state::AppState;
use secrecy::ExposeSecret;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ServiceConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing(config: &ServiceConfig) {
    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pizza_service=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(config.log_json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!config.log_json).then(tracing_subscriber::fmt::layer))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

/// Create the configured admin account if the database has no admin.
async fn seed_default_admin(db: &Database, admin: &DefaultAdmin) -> Result<(), db::DbError> {
    let seeded = db
        .users()
        .seed_admin(&NewUser {
            name: admin.name.clone(),
            email: admin.email.clone(),
            password: admin.password.expose_secret().to_string(),
            roles: vec![Role::Admin],
        })
        .await;

    match seeded {
        Ok(Some(user)) => {
            tracing::info!(user_id = %user.id, email = %user.email, "Default admin created");
        }
        Ok(None) => tracing::debug!("Admin already present, skipping seed"),
        // Another instance seeded concurrently, or the email is taken
        Err(db::DbError::Conflict(_)) => {
            tracing::warn!(email = %admin.email, "Default admin email already registered");
        }
        Err(e) => return Err(e),
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let config = ServiceConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);
    init_tracing(&config);

    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");
    tracing::info!("Database pool created");

    let database = Database::new(pool.clone());
    let created = database
        .initialize()
        .await
        .expect("Failed to initialize database schema");
    if created {
        tracing::info!("Database schema created");
    }
    if let Some(admin) = &config.default_admin {
        seed_default_admin(&database, admin)
            .await
            .expect("Failed to create default admin");
    }

    let metrics = Metrics::new();
    let reporter = config.metrics.as_ref().map(|metrics_config| {
        let exporter = MetricsExporter::new(metrics_config).expect("Failed to build metrics client");
        tracing::info!(url = %metrics_config.url, "Metrics reporter started");
        MetricsReporter::start(metrics.clone(), exporter, metrics_config.interval)
    });

    let state = AppState::new(config.clone(), pool, metrics)
        .expect("Failed to initialize application state");
    let app = pizza_service::app(state);

    let addr = config.socket_addr();
    tracing::info!("pizza service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");

    if let Some(reporter) = reporter {
        reporter.stop().await;
        tracing::info!("Metrics reporter stopped");
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
