//! Menu repository.

use pizza_core::{MenuItemId, Price};
use sqlx::PgPool;

use super::DbError;
use crate::models::{MenuItem, NewMenuItem};
use crate::policy::AdminGrant;

/// Repository for menu items.
pub struct MenuRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> MenuRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The full menu, by id ascending.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Database` if the query fails.
    pub async fn get_menu(&self) -> Result<Vec<MenuItem>, DbError> {
        let mut conn = self.pool.acquire().await?;
        let rows: Vec<(MenuItemId, String, String, String, Price)> = sqlx::query_as(
            "SELECT id, title, description, image, price FROM pizza.menu ORDER BY id",
        )
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, title, description, image, price)| MenuItem {
                id,
                title,
                description,
                image,
                price,
            })
            .collect())
    }

    /// Add an item to the menu.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Database` if the insert fails.
    pub async fn add_menu_item(
        &self,
        _grant: &AdminGrant,
        item: &NewMenuItem,
    ) -> Result<MenuItem, DbError> {
        let mut conn = self.pool.acquire().await?;
        let id: MenuItemId = sqlx::query_scalar(
            r"
            INSERT INTO pizza.menu (title, description, image, price)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(&item.title)
        .bind(&item.description)
        .bind(&item.image)
        .bind(item.price)
        .fetch_one(&mut *conn)
        .await?;

        Ok(MenuItem {
            id,
            title: item.title.clone(),
            description: item.description.clone(),
            image: item.image.clone(),
            price: item.price,
        })
    }
}
