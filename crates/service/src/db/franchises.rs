//! Franchise and store repository.
//!
//! Listing is shaped by the caller's role: admins receive each franchise
//! with its admins and per-store revenue, everyone else receives the store
//! names only.

use std::collections::HashMap;

use pizza_core::{Email, FranchiseId, Price, Role, RoleKind, StoreId, UserId};
use sqlx::{Connection, PgConnection, PgPool};

use super::users::insert_role;
use super::{DbError, conflict_on_unique, name_pattern, page_offset, trim_page};
use crate::models::{Franchise, FranchiseAdmin, NewFranchise, NewStore, Store, User};
use crate::policy::{AdminGrant, FranchiseGrant, UserGrant, can_view_all_franchise_detail};

/// Repository for franchises and their stores.
pub struct FranchiseRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> FranchiseRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of franchises whose name matches `name_filter` (`*` is a
    /// wildcard, case is ignored), and whether a further page exists.
    ///
    /// `page` is zero-based. Fetches `limit + 1` rows to detect the next page.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Database` if a query fails.
    pub async fn get_franchises(
        &self,
        user: Option<&User>,
        page: i64,
        limit: i64,
        name_filter: &str,
    ) -> Result<(Vec<Franchise>, bool), DbError> {
        let limit = limit.max(0);
        let mut conn = self.pool.acquire().await?;

        let rows: Vec<(FranchiseId, String)> = sqlx::query_as(
            r"
            SELECT id, name FROM pizza.franchise
            WHERE name ILIKE $1
            ORDER BY id
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(name_pattern(name_filter))
        .bind(limit.saturating_add(1))
        .bind(page_offset(page, limit))
        .fetch_all(&mut *conn)
        .await?;

        let (rows, more) = trim_page(rows, limit);

        let franchises = if user.is_some_and(can_view_all_franchise_detail) {
            let mut detailed = Vec::with_capacity(rows.len());
            for (id, name) in rows {
                detailed.push(load_detail(&mut conn, id, name).await?);
            }
            detailed
        } else {
            let ids: Vec<FranchiseId> = rows.iter().map(|(id, _)| *id).collect();
            let mut stores = load_store_names(&mut conn, &ids).await?;
            rows.into_iter()
                .map(|(id, name)| Franchise {
                    id,
                    name,
                    admins: None,
                    stores: stores.remove(&id).unwrap_or_default(),
                })
                .collect()
        };

        Ok((franchises, more))
    }

    /// Franchises in which the granted user holds the franchisee role, with
    /// full detail. Empty if none.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Database` if a query fails.
    pub async fn get_user_franchises(&self, grant: &UserGrant) -> Result<Vec<Franchise>, DbError> {
        let mut conn = self.pool.acquire().await?;

        let rows: Vec<(FranchiseId, String)> = sqlx::query_as(
            r"
            SELECT f.id, f.name
            FROM pizza.franchise f
            WHERE f.id IN (
                SELECT object_id FROM pizza.user_role
                WHERE user_id = $1 AND role = $2 AND object_id IS NOT NULL
            )
            ORDER BY f.id
            ",
        )
        .bind(grant.user_id())
        .bind(RoleKind::Franchisee.as_str())
        .fetch_all(&mut *conn)
        .await?;

        let mut franchises = Vec::with_capacity(rows.len());
        for (id, name) in rows {
            franchises.push(load_detail(&mut conn, id, name).await?);
        }
        Ok(franchises)
    }

    /// Load one franchise with its admins and per-store revenue.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Database` if a query fails.
    pub async fn get_franchise(&self, id: FranchiseId) -> Result<Option<Franchise>, DbError> {
        let mut conn = self.pool.acquire().await?;

        let name: Option<String> =
            sqlx::query_scalar("SELECT name FROM pizza.franchise WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?;

        match name {
            Some(name) => Ok(Some(load_detail(&mut conn, id, name).await?)),
            None => Ok(None),
        }
    }

    /// Create a franchise and give each listed admin the franchisee role.
    ///
    /// Admin emails are resolved case-insensitively before anything is
    /// written. An admin listed twice is assigned once.
    ///
    /// # Errors
    ///
    /// Returns `DbError::UnknownUser` if an admin email has no account.
    /// Returns `DbError::Conflict` if the franchise name is taken.
    pub async fn create_franchise(
        &self,
        _grant: &AdminGrant,
        franchise: &NewFranchise,
    ) -> Result<Franchise, DbError> {
        let mut conn = self.pool.acquire().await?;

        let mut admins: Vec<FranchiseAdmin> = Vec::with_capacity(franchise.admins.len());
        for admin in &franchise.admins {
            let row: Option<(UserId, String, Email)> = sqlx::query_as(
                "SELECT id, name, email FROM pizza.user WHERE lower(email) = lower($1)",
            )
            .bind(&admin.email)
            .fetch_optional(&mut *conn)
            .await?;
            let (id, name, email) = row.ok_or(DbError::UnknownUser)?;
            if admins.iter().any(|a| a.id == id) {
                continue;
            }
            admins.push(FranchiseAdmin { id, name, email });
        }

        let mut tx = conn.begin().await?;

        let id: FranchiseId =
            sqlx::query_scalar("INSERT INTO pizza.franchise (name) VALUES ($1) RETURNING id")
                .bind(&franchise.name)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| conflict_on_unique(e, "franchise"))?;

        let role = Role::FranchiseAdmin { franchise_id: id };
        for admin in &admins {
            insert_role(&mut tx, admin.id, &role).await?;
        }

        tx.commit().await?;

        Ok(Franchise {
            id,
            name: franchise.name.clone(),
            admins: Some(admins),
            stores: Vec::new(),
        })
    }

    /// Delete a franchise together with its stores, its franchisee roles and
    /// the franchise/store linkage of its orders.
    ///
    /// All steps run in one transaction. Deleting a missing franchise is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns `DbError::UnableToDelete` wrapping the failed step's error;
    /// the transaction has been rolled back.
    pub async fn delete_franchise(
        &self,
        _grant: &AdminGrant,
        id: FranchiseId,
    ) -> Result<(), DbError> {
        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await.map_err(DbError::UnableToDelete)?;

        let result = delete_franchise_rows(&mut tx, id).await;
        match result {
            Ok(()) => tx.commit().await.map_err(DbError::UnableToDelete),
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    tracing::error!(error = %rollback, franchise_id = %id, "Rollback failed");
                }
                Err(DbError::UnableToDelete(e))
            }
        }
    }

    /// Create a store in the granted franchise.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Database` if the insert fails.
    pub async fn create_store(
        &self,
        grant: &FranchiseGrant,
        store: &NewStore,
    ) -> Result<Store, DbError> {
        let mut conn = self.pool.acquire().await?;
        let id: StoreId = sqlx::query_scalar(
            "INSERT INTO pizza.store (franchise_id, name) VALUES ($1, $2) RETURNING id",
        )
        .bind(grant.franchise_id())
        .bind(&store.name)
        .fetch_one(&mut *conn)
        .await?;

        Ok(Store {
            id,
            franchise_id: Some(grant.franchise_id()),
            name: store.name.clone(),
            total_revenue: None,
        })
    }

    /// Delete a store of the granted franchise. No-op if it does not exist.
    ///
    /// Orders placed at the store keep their history but lose the store
    /// reference.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Database` if a statement fails.
    pub async fn delete_store(&self, grant: &FranchiseGrant, id: StoreId) -> Result<(), DbError> {
        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        sqlx::query(
            r"
            UPDATE pizza.diner_order SET store_id = NULL
            WHERE store_id IN (SELECT id FROM pizza.store WHERE franchise_id = $1 AND id = $2)
            ",
        )
        .bind(grant.franchise_id())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM pizza.store WHERE franchise_id = $1 AND id = $2")
            .bind(grant.franchise_id())
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

// =============================================================================
// Row helpers
// =============================================================================

async fn delete_franchise_rows(conn: &mut PgConnection, id: FranchiseId) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE pizza.diner_order SET franchise_id = NULL, store_id = NULL WHERE franchise_id = $1",
    )
    .bind(id)
    .execute(&mut *conn)
    .await?;

    sqlx::query(
        r"
        UPDATE pizza.diner_order SET store_id = NULL
        WHERE store_id IN (SELECT id FROM pizza.store WHERE franchise_id = $1)
        ",
    )
    .bind(id)
    .execute(&mut *conn)
    .await?;

    sqlx::query("DELETE FROM pizza.store WHERE franchise_id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    sqlx::query("DELETE FROM pizza.user_role WHERE role = $1 AND object_id = $2")
        .bind(RoleKind::Franchisee.as_str())
        .bind(id)
        .execute(&mut *conn)
        .await?;

    sqlx::query("DELETE FROM pizza.franchise WHERE id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Admins and revenue-bearing stores of one franchise.
async fn load_detail(
    conn: &mut PgConnection,
    id: FranchiseId,
    name: String,
) -> Result<Franchise, DbError> {
    let admins: Vec<(UserId, String, Email)> = sqlx::query_as(
        r"
        SELECT u.id, u.name, u.email
        FROM pizza.user_role ur
        JOIN pizza.user u ON u.id = ur.user_id
        WHERE ur.role = $1 AND ur.object_id = $2
        ORDER BY u.id
        ",
    )
    .bind(RoleKind::Franchisee.as_str())
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    let stores: Vec<(StoreId, String, Price)> = sqlx::query_as(
        r"
        SELECT s.id, s.name, COALESCE(SUM(oi.price), 0) AS total_revenue
        FROM pizza.store s
        LEFT JOIN pizza.diner_order o ON o.store_id = s.id
        LEFT JOIN pizza.order_item oi ON oi.order_id = o.id
        WHERE s.franchise_id = $1
        GROUP BY s.id, s.name
        ORDER BY s.id
        ",
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Franchise {
        id,
        name,
        admins: Some(
            admins
                .into_iter()
                .map(|(id, name, email)| FranchiseAdmin { id, name, email })
                .collect(),
        ),
        stores: stores
            .into_iter()
            .map(|(store_id, name, revenue)| Store {
                id: store_id,
                franchise_id: None,
                name,
                total_revenue: Some(revenue),
            })
            .collect(),
    })
}

/// Store names of several franchises, grouped by franchise.
async fn load_store_names(
    conn: &mut PgConnection,
    ids: &[FranchiseId],
) -> Result<HashMap<FranchiseId, Vec<Store>>, DbError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let raw_ids: Vec<i32> = ids.iter().map(FranchiseId::as_i32).collect();
    let rows: Vec<(StoreId, FranchiseId, String)> = sqlx::query_as(
        "SELECT id, franchise_id, name FROM pizza.store WHERE franchise_id = ANY($1) ORDER BY id",
    )
    .bind(&raw_ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut stores: HashMap<FranchiseId, Vec<Store>> = HashMap::new();
    for (id, franchise_id, name) in rows {
        stores.entry(franchise_id).or_default().push(Store {
            id,
            franchise_id: None,
            name,
            total_revenue: None,
        });
    }
    Ok(stores)
}
