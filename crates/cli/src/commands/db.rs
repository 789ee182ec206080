//! Schema bootstrap.

use super::{CommandError, connect};

/// Create the pizza schema and its tables if absent.
pub async fn init() -> Result<(), CommandError> {
    let db = connect().await?;
    if db.initialize().await? {
        tracing::info!("Schema created");
    } else {
        tracing::info!("Schema already exists, tables verified");
    }
    Ok(())
}
