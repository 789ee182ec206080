//! Data access layer over `PostgreSQL`.
//!
//! # Schema: `pizza`
//!
//! - `user` - Accounts (argon2 password hash, unique email)
//! - `user_role` - Role assignments, `object_id` scopes franchisee roles
//! - `auth` - Sessions keyed by the signature segment of the bearer token
//! - `menu` - Menu items
//! - `franchise` / `store` - Franchises and their stores
//! - `diner_order` / `order_item` - Placed orders
//!
//! The schema is created by [`Database::initialize`], either on service
//! startup or with:
//! ```bash
//! cargo run -p pizza-cli -- db init
//! ```
//!
//! Every repository operation acquires one pooled connection for its whole
//! duration. The connection guard returns it to the pool on every exit path.

pub mod franchises;
pub mod menu;
pub mod orders;
pub mod schema;
pub mod sessions;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::postgres::{PgPoolOptions, Postgres};
use sqlx::{Encode, PgConnection, PgPool, Type};
use thiserror::Error;

pub use franchises::FranchiseRepository;
pub use menu::MenuRepository;
pub use orders::OrderRepository;
pub use sessions::{SessionRepository, token_signature};
pub use users::UserRepository;

use crate::credentials::HashError;

/// Page size used when a franchise listing does not ask for one.
pub const DEFAULT_FRANCHISE_LIMIT: i64 = 10;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum DbError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// No account matches, or the password did not verify.
    #[error("unknown user")]
    UnknownUser,

    /// A lookup by value matched no row.
    #[error("No ID found")]
    NoIdFound {
        table: &'static str,
        column: &'static str,
    },

    /// A multi-step delete failed and was rolled back.
    #[error("unable to delete franchise")]
    UnableToDelete(#[source] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Password hashing failed.
    #[error(transparent)]
    PasswordHash(#[from] HashError),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Handle to the pizza database.
///
/// Cheap to clone; hands out repositories borrowing the pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    #[must_use]
    pub const fn users(&self) -> UserRepository<'_> {
        UserRepository::new(&self.pool)
    }

    #[must_use]
    pub const fn sessions(&self) -> SessionRepository<'_> {
        SessionRepository::new(&self.pool)
    }

    #[must_use]
    pub const fn menu(&self) -> MenuRepository<'_> {
        MenuRepository::new(&self.pool)
    }

    #[must_use]
    pub const fn orders(&self) -> OrderRepository<'_> {
        OrderRepository::new(&self.pool)
    }

    #[must_use]
    pub const fn franchises(&self) -> FranchiseRepository<'_> {
        FranchiseRepository::new(&self.pool)
    }

    /// Bootstrap the schema. Returns `true` if it did not exist before.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Database` if any statement fails; nothing is
    /// created in that case.
    pub async fn initialize(&self) -> Result<bool, DbError> {
        schema::initialize_database(&self.pool).await
    }
}

// =============================================================================
// Shared helpers
// =============================================================================

/// Resolve the `id` of the row in `table` whose `column` equals `value`.
///
/// `table` and `column` are compile-time identifiers; only `value` is bound.
///
/// # Errors
///
/// Returns `DbError::NoIdFound` if no row matches.
pub async fn get_id<T>(
    conn: &mut PgConnection,
    table: &'static str,
    column: &'static str,
    value: T,
) -> Result<i32, DbError>
where
    T: for<'e> Encode<'e, Postgres> + Type<Postgres> + Send + 'static,
{
    let sql = format!("SELECT id FROM {table} WHERE {column} = $1");
    sqlx::query_scalar::<_, i32>(&sql)
        .bind(value)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(DbError::NoIdFound { table, column })
}

/// Row offset of a zero-based page.
#[must_use]
pub const fn page_offset(page: i64, limit: i64) -> i64 {
    let page = if page < 0 { 0 } else { page };
    page.saturating_mul(limit)
}

/// Translate a user-facing name filter into a `LIKE` pattern.
#[must_use]
pub fn name_pattern(filter: &str) -> String {
    filter.replace('*', "%")
}

/// Split a `limit + 1` row fetch into the page and a "more available" flag.
pub(crate) fn trim_page<T>(mut rows: Vec<T>, limit: i64) -> (Vec<T>, bool) {
    let limit = usize::try_from(limit).unwrap_or(0);
    let more = rows.len() > limit;
    rows.truncate(limit);
    (rows, more)
}

/// Map a unique-constraint violation to `DbError::Conflict`.
pub(crate) fn conflict_on_unique(err: sqlx::Error, what: &str) -> DbError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        return DbError::Conflict(format!("{what} already exists"));
    }
    DbError::Database(err)
}
