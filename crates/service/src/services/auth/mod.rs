//! Authentication service.
//!
//! Registration and login issue a bearer token and persist its session row.
//! A request is authenticated only if its token verifies *and* the session
//! row still exists, so logout revokes a token immediately.

mod error;
mod token;

pub use error::AuthError;
pub use token::TokenService;

use pizza_core::{Email, Role};

use crate::db::{Database, DbError};
use crate::models::{NewUser, User};

/// Authentication service.
pub struct AuthService<'a> {
    db: &'a Database,
    tokens: &'a TokenService,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(db: &'a Database, tokens: &'a TokenService) -> Self {
        Self { db, tokens }
    }

    /// Register a new diner and log them in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingFields` if any field is absent or empty.
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::Database` with `DbError::Conflict` if the email is
    /// already registered.
    pub async fn register(
        &self,
        name: Option<&str>,
        email: Option<&str>,
        password: Option<&str>,
    ) -> Result<(User, String), AuthError> {
        let (Some(name), Some(email), Some(password)) = (
            name.filter(|s| !s.trim().is_empty()),
            email.filter(|s| !s.trim().is_empty()),
            password.filter(|s| !s.is_empty()),
        ) else {
            return Err(AuthError::MissingFields);
        };

        let email = Email::parse(email)?;
        let user = self
            .db
            .users()
            .add_user(&NewUser {
                name: name.trim().to_string(),
                email,
                password: password.to_string(),
                roles: vec![Role::Diner],
            })
            .await?;

        let token = self.set_auth(&user).await?;
        Ok((user, token))
    }

    /// Log in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Database` with `DbError::UnknownUser` if the email
    /// is unknown or the password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, String), AuthError> {
        // A malformed email cannot belong to any account
        let email = Email::parse(email).map_err(|_| DbError::UnknownUser)?;
        let user = self.db.users().get_user(&email, password).await?;

        let token = self.set_auth(&user).await?;
        Ok((user, token))
    }

    /// End the session of `token`. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Database` if the delete fails.
    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        self.db.sessions().logout_user(token).await?;
        Ok(())
    }

    /// Resolve a bearer token to the user it was issued for.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Unauthenticated` if the token has no session or
    /// does not verify.
    pub async fn authenticate(&self, token: &str) -> Result<User, AuthError> {
        if !self.db.sessions().is_logged_in(token).await? {
            return Err(AuthError::Unauthenticated);
        }
        self.tokens.verify(token)
    }

    /// Issue a fresh token for `user` and persist its session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Token` if signing fails or `AuthError::Database`
    /// if the session cannot be stored.
    pub async fn set_auth(&self, user: &User) -> Result<String, AuthError> {
        let token = self.tokens.issue(user)?;
        self.db.sessions().login_user(user.id, &token).await?;
        Ok(token)
    }
}
