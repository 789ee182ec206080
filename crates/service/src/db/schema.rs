//! Schema bootstrap.

use sqlx::{Connection, PgPool};

use super::DbError;

/// Schema holding every table of the service.
pub const SCHEMA: &str = "pizza";

/// Advisory lock key serializing concurrent bootstraps.
const BOOTSTRAP_LOCK_KEY: i64 = 0x7069_7a7a_61;

/// Table definitions, in dependency order.
pub const TABLE_STATEMENTS: &[&str] = &[
    r"CREATE TABLE IF NOT EXISTS pizza.user (
        id SERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        password TEXT NOT NULL
    )",
    r"CREATE UNIQUE INDEX IF NOT EXISTS user_email_lower_idx ON pizza.user (lower(email))",
    r"CREATE TABLE IF NOT EXISTS pizza.auth (
        token TEXT PRIMARY KEY,
        user_id INTEGER NOT NULL REFERENCES pizza.user (id)
    )",
    r"CREATE TABLE IF NOT EXISTS pizza.menu (
        id SERIAL PRIMARY KEY,
        title TEXT NOT NULL,
        image TEXT NOT NULL,
        price NUMERIC(14, 6) NOT NULL CHECK (price >= 0),
        description TEXT NOT NULL
    )",
    r"CREATE TABLE IF NOT EXISTS pizza.franchise (
        id SERIAL PRIMARY KEY,
        name TEXT NOT NULL UNIQUE
    )",
    r"CREATE TABLE IF NOT EXISTS pizza.store (
        id SERIAL PRIMARY KEY,
        franchise_id INTEGER NOT NULL REFERENCES pizza.franchise (id),
        name TEXT NOT NULL
    )",
    r"CREATE TABLE IF NOT EXISTS pizza.user_role (
        id SERIAL PRIMARY KEY,
        user_id INTEGER NOT NULL REFERENCES pizza.user (id),
        role TEXT NOT NULL,
        object_id INTEGER
    )",
    r"CREATE INDEX IF NOT EXISTS user_role_user_id_idx ON pizza.user_role (user_id)",
    r"CREATE INDEX IF NOT EXISTS user_role_object_id_idx ON pizza.user_role (object_id)",
    r"CREATE TABLE IF NOT EXISTS pizza.diner_order (
        id SERIAL PRIMARY KEY,
        diner_id INTEGER NOT NULL REFERENCES pizza.user (id),
        franchise_id INTEGER REFERENCES pizza.franchise (id),
        store_id INTEGER REFERENCES pizza.store (id),
        date TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    r"CREATE INDEX IF NOT EXISTS diner_order_diner_id_idx ON pizza.diner_order (diner_id)",
    r"CREATE TABLE IF NOT EXISTS pizza.order_item (
        id SERIAL PRIMARY KEY,
        order_id INTEGER NOT NULL REFERENCES pizza.diner_order (id),
        menu_id INTEGER NOT NULL REFERENCES pizza.menu (id),
        description TEXT NOT NULL,
        price NUMERIC(14, 6) NOT NULL
    )",
];

/// Create the `pizza` schema and its tables if missing.
///
/// Runs in one transaction under an advisory lock, so two processes booting
/// against an empty database do not race. Every statement is idempotent.
///
/// Returns `true` if the schema did not exist before this call.
///
/// # Errors
///
/// Returns `DbError::Database` if any statement fails.
pub async fn initialize_database(pool: &PgPool) -> Result<bool, DbError> {
    let mut conn = pool.acquire().await?;
    let mut tx = conn.begin().await?;

    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(BOOTSTRAP_LOCK_KEY)
        .execute(&mut *tx)
        .await?;

    let existed: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM information_schema.schemata WHERE schema_name = $1)",
    )
    .bind(SCHEMA)
    .fetch_one(&mut *tx)
    .await?;

    if !existed {
        tracing::info!(schema = SCHEMA, "Creating database schema");
        sqlx::query("CREATE SCHEMA IF NOT EXISTS pizza")
            .execute(&mut *tx)
            .await?;
    }

    for statement in TABLE_STATEMENTS {
        sqlx::query(statement).execute(&mut *tx).await?;
    }

    tx.commit().await?;
    Ok(!existed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statements_are_idempotent() {
        for statement in TABLE_STATEMENTS {
            assert!(
                statement.contains("IF NOT EXISTS"),
                "statement is not idempotent: {statement}"
            );
        }
    }

    #[test]
    fn test_tables_live_in_schema() {
        for statement in TABLE_STATEMENTS {
            assert!(statement.contains(&format!("{SCHEMA}.")));
        }
    }

    #[test]
    fn test_referenced_tables_are_created_first() {
        let created: Vec<&str> = TABLE_STATEMENTS
            .iter()
            .filter_map(|s| s.strip_prefix("CREATE TABLE IF NOT EXISTS "))
            .filter_map(|s| s.split_whitespace().next())
            .collect();

        for (position, statement) in TABLE_STATEMENTS.iter().enumerate() {
            for referenced in statement
                .split("REFERENCES ")
                .skip(1)
                .filter_map(|s| s.split_whitespace().next())
            {
                let defined_at = created.iter().position(|table| *table == referenced);
                assert!(
                    defined_at.is_some(),
                    "{referenced} is referenced but never created"
                );
                let defined_statement = TABLE_STATEMENTS
                    .iter()
                    .position(|s| s.starts_with(&format!("CREATE TABLE IF NOT EXISTS {referenced} ")));
                assert!(defined_statement < Some(position));
            }
        }
    }
}
