//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ServiceConfig;
use crate::db::Database;
use crate::metrics::Metrics;
use crate::services::auth::{AuthService, TokenService};
use crate::services::factory::{FactoryClient, FactoryError};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the database handle and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServiceConfig,
    db: Database,
    tokens: TokenService,
    factory: FactoryClient,
    metrics: Metrics,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Service configuration
    /// * `pool` - `PostgreSQL` connection pool
    /// * `metrics` - Aggregator shared with the metrics reporter
    ///
    /// # Errors
    ///
    /// Returns an error if the factory HTTP client cannot be built.
    pub fn new(config: ServiceConfig, pool: PgPool, metrics: Metrics) -> Result<Self, FactoryError> {
        let factory = FactoryClient::new(&config.factory)?;
        let tokens = TokenService::new(&config.jwt_secret);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                db: Database::new(pool),
                tokens,
                factory,
                metrics,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn db(&self) -> &Database {
        &self.inner.db
    }

    #[must_use]
    pub fn factory(&self) -> &FactoryClient {
        &self.inner.factory
    }

    #[must_use]
    pub fn metrics(&self) -> &Metrics {
        &self.inner.metrics
    }

    /// Authentication service over this state's database and token keys.
    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(&self.inner.db, &self.inner.tokens)
    }
}
