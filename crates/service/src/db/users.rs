//! User repository for database operations.

use pizza_core::{Email, FranchiseId, Role, RoleKind, UserId};
use sqlx::{Connection, PgConnection, PgPool, Postgres, QueryBuilder};

use super::{DbError, conflict_on_unique};
use crate::credentials::{hash_password, verify_password};
use crate::models::{NewUser, User, UserUpdate};
use crate::policy::UserGrant;

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a user and its role assignments.
    ///
    /// The password is hashed before storage. An empty role list stores a
    /// single diner role.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Conflict` if the email already exists in any case.
    /// Returns `DbError::Database` for other database errors.
    pub async fn add_user(&self, user: &NewUser) -> Result<User, DbError> {
        let password_hash = hash_password(&user.password)?;
        let roles = if user.roles.is_empty() {
            vec![Role::Diner]
        } else {
            user.roles.clone()
        };

        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let id: UserId = sqlx::query_scalar(
            "INSERT INTO pizza.user (name, email, password) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "email"))?;

        for role in &roles {
            insert_role(&mut tx, id, role).await?;
        }

        tx.commit().await?;

        Ok(User {
            id,
            name: user.name.clone(),
            email: user.email.clone(),
            roles,
        })
    }

    /// Look up a user by email and verify the password.
    ///
    /// Emails match case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `DbError::UnknownUser` if no account has this email or the
    /// password does not match.
    pub async fn get_user(&self, email: &Email, password: &str) -> Result<User, DbError> {
        let mut conn = self.pool.acquire().await?;

        let row: Option<(UserId, String, Email, String)> = sqlx::query_as(
            "SELECT id, name, email, password FROM pizza.user WHERE lower(email) = lower($1)",
        )
        .bind(email)
        .fetch_optional(&mut *conn)
        .await?;

        let Some((id, name, email, password_hash)) = row else {
            return Err(DbError::UnknownUser);
        };
        if !verify_password(password, &password_hash) {
            return Err(DbError::UnknownUser);
        }

        let roles = load_roles(&mut conn, id).await?;
        Ok(User {
            id,
            name,
            email,
            roles,
        })
    }

    /// Whether any user holds the admin role.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Database` if the query fails.
    pub async fn admin_exists(&self) -> Result<bool, DbError> {
        let mut conn = self.pool.acquire().await?;
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM pizza.user_role WHERE role = $1)")
                .bind(RoleKind::Admin.as_str())
                .fetch_one(&mut *conn)
                .await?;
        Ok(exists)
    }

    /// Create `admin` with the admin role unless some admin already exists.
    ///
    /// Returns the created user, or `None` if nothing was written.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Conflict` if the email belongs to another account.
    pub async fn seed_admin(&self, admin: &NewUser) -> Result<Option<User>, DbError> {
        if self.admin_exists().await? {
            return Ok(None);
        }
        let admin = NewUser {
            roles: vec![Role::Admin],
            ..admin.clone()
        };
        self.add_user(&admin).await.map(Some)
    }

    /// Get a user by id.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Database` if the query fails.
    /// Returns `DbError::DataCorruption` if a stored role is invalid.
    pub async fn get_user_by_id(&self, id: UserId) -> Result<Option<User>, DbError> {
        let mut conn = self.pool.acquire().await?;
        fetch_user(&mut conn, id).await
    }

    /// Apply a partial update to the granted user and return the refreshed
    /// record. Roles are never changed.
    ///
    /// # Errors
    ///
    /// Returns `DbError::UnknownUser` if the user does not exist.
    /// Returns `DbError::Conflict` if the new email is taken.
    pub async fn update_user(
        &self,
        grant: &UserGrant,
        update: &UserUpdate,
    ) -> Result<User, DbError> {
        let id = grant.user_id();
        let password_hash = update.password.as_deref().map(hash_password).transpose()?;

        let mut conn = self.pool.acquire().await?;

        if !update.is_empty() {
            let mut builder: QueryBuilder<'_, Postgres> =
                QueryBuilder::new("UPDATE pizza.user SET ");
            let mut columns = builder.separated(", ");
            if let Some(name) = &update.name {
                columns.push("name = ");
                columns.push_bind_unseparated(name.clone());
            }
            if let Some(email) = &update.email {
                columns.push("email = ");
                columns.push_bind_unseparated(email.clone());
            }
            if let Some(hash) = password_hash {
                columns.push("password = ");
                columns.push_bind_unseparated(hash);
            }
            builder.push(" WHERE id = ");
            builder.push_bind(id);

            let result = builder
                .build()
                .execute(&mut *conn)
                .await
                .map_err(|e| conflict_on_unique(e, "email"))?;
            if result.rows_affected() == 0 {
                return Err(DbError::UnknownUser);
            }
        }

        fetch_user(&mut conn, id).await?.ok_or(DbError::UnknownUser)
    }
}

// =============================================================================
// Row helpers
// =============================================================================

async fn fetch_user(conn: &mut PgConnection, id: UserId) -> Result<Option<User>, DbError> {
    let row: Option<(UserId, String, Email)> =
        sqlx::query_as("SELECT id, name, email FROM pizza.user WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

    match row {
        Some((id, name, email)) => {
            let roles = load_roles(conn, id).await?;
            Ok(Some(User {
                id,
                name,
                email,
                roles,
            }))
        }
        None => Ok(None),
    }
}

/// Load the roles of a user, in assignment order.
pub(crate) async fn load_roles(conn: &mut PgConnection, id: UserId) -> Result<Vec<Role>, DbError> {
    let rows: Vec<(String, Option<FranchiseId>)> =
        sqlx::query_as("SELECT role, object_id FROM pizza.user_role WHERE user_id = $1 ORDER BY id")
            .bind(id)
            .fetch_all(&mut *conn)
            .await?;

    rows.into_iter()
        .map(|(kind, object_id)| {
            let kind = kind
                .parse::<RoleKind>()
                .map_err(|e| DbError::DataCorruption(format!("invalid role in database: {e}")))?;
            Role::from_parts(kind, object_id)
                .map_err(|e| DbError::DataCorruption(format!("invalid role in database: {e}")))
        })
        .collect()
}

/// Insert one `user_role` row.
pub(crate) async fn insert_role(
    conn: &mut PgConnection,
    user_id: UserId,
    role: &Role,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO pizza.user_role (user_id, role, object_id) VALUES ($1, $2, $3)")
        .bind(user_id)
        .bind(role.kind().as_str())
        .bind(role.object_id())
        .execute(&mut *conn)
        .await?;
    Ok(())
}
