//! Admin user management.

use pizza_core::{Email, Role, UserId};
use pizza_service::models::NewUser;

use super::{CommandError, connect};

/// Create a user holding the admin role, bootstrapping the schema first.
///
/// # Returns
///
/// The ID of the created user.
pub async fn create_user(name: &str, email: &str, password: &str) -> Result<UserId, CommandError> {
    let email = Email::parse(email)?;
    let db = connect().await?;
    db.initialize().await?;

    let user = db
        .users()
        .add_user(&NewUser {
            name: name.to_owned(),
            email,
            password: password.to_owned(),
            roles: vec![Role::Admin],
        })
        .await?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );
    Ok(user.id)
}
