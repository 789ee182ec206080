//! CLI command implementations.

pub mod admin;
pub mod db;

use pizza_core::EmailError;
use pizza_service::db::{Database, DbError, create_pool};
use secrecy::SecretString;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Connect(#[from] sqlx::Error),

    /// Data access error.
    #[error(transparent)]
    Database(#[from] DbError),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),
}

/// Connect to the database named by `PIZZA_DATABASE_URL` or `DATABASE_URL`.
async fn connect() -> Result<Database, CommandError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("PIZZA_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| CommandError::MissingEnvVar("PIZZA_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = create_pool(&SecretString::from(database_url)).await?;
    Ok(Database::new(pool))
}
