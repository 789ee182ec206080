//! Order repository.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use pizza_core::{FranchiseId, MenuItemId, OrderId, OrderItemId, Price, StoreId};
use sqlx::{Connection, PgPool};

use super::{DbError, get_id};
use crate::models::{NewOrder, Order, OrderHistory, OrderItem, User};

type OrderRow = (OrderId, Option<FranchiseId>, Option<StoreId>, DateTime<Utc>);
type ItemRow = (OrderItemId, OrderId, MenuItemId, String, Price);

/// Row offset of a one-based order history page. Pages below 1 clamp to 1.
#[must_use]
pub const fn history_offset(page: i64, per_page: i64) -> i64 {
    let page = if page < 1 { 1 } else { page };
    (page - 1).saturating_mul(per_page)
}

/// Repository for diner orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of the orders placed by `user`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Database` if a query fails.
    pub async fn get_orders(
        &self,
        user: &User,
        page: i64,
        per_page: i64,
    ) -> Result<OrderHistory, DbError> {
        let page = page.max(1);
        let mut conn = self.pool.acquire().await?;

        let rows: Vec<OrderRow> = sqlx::query_as(
            r"
            SELECT id, franchise_id, store_id, date
            FROM pizza.diner_order
            WHERE diner_id = $1
            ORDER BY id
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(user.id)
        .bind(per_page)
        .bind(history_offset(page, per_page))
        .fetch_all(&mut *conn)
        .await?;

        let order_ids: Vec<i32> = rows.iter().map(|row| row.0.as_i32()).collect();
        let item_rows: Vec<ItemRow> = sqlx::query_as(
            r"
            SELECT id, order_id, menu_id, description, price
            FROM pizza.order_item
            WHERE order_id = ANY($1)
            ORDER BY id
            ",
        )
        .bind(&order_ids)
        .fetch_all(&mut *conn)
        .await?;

        let mut items: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for (id, order_id, menu_id, description, price) in item_rows {
            items.entry(order_id).or_default().push(OrderItem {
                id,
                menu_id,
                description,
                price,
            });
        }

        let orders = rows
            .into_iter()
            .map(|(id, franchise_id, store_id, date)| Order {
                id,
                franchise_id,
                store_id,
                date,
                items: items.remove(&id).unwrap_or_default(),
            })
            .collect();

        Ok(OrderHistory {
            diner_id: user.id,
            orders,
            page,
        })
    }

    /// Place an order for `user`.
    ///
    /// Every menu id is resolved before anything is written; the order row
    /// and its items are then inserted in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `DbError::NoIdFound` if an item references an unknown menu id.
    /// Returns `DbError::Database` if a write fails; nothing is persisted.
    pub async fn add_diner_order(&self, user: &User, order: &NewOrder) -> Result<Order, DbError> {
        let mut conn = self.pool.acquire().await?;

        let mut menu_ids = Vec::with_capacity(order.items.len());
        for item in &order.items {
            let id = get_id(&mut conn, "pizza.menu", "id", item.menu_id).await?;
            menu_ids.push(MenuItemId::new(id));
        }

        let mut tx = conn.begin().await?;

        let (id, date): (OrderId, DateTime<Utc>) = sqlx::query_as(
            r"
            INSERT INTO pizza.diner_order (diner_id, franchise_id, store_id)
            VALUES ($1, $2, $3)
            RETURNING id, date
            ",
        )
        .bind(user.id)
        .bind(order.franchise_id)
        .bind(order.store_id)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(order.items.len());
        for (item, menu_id) in order.items.iter().zip(menu_ids) {
            let item_id: OrderItemId = sqlx::query_scalar(
                r"
                INSERT INTO pizza.order_item (order_id, menu_id, description, price)
                VALUES ($1, $2, $3, $4)
                RETURNING id
                ",
            )
            .bind(id)
            .bind(menu_id)
            .bind(&item.description)
            .bind(item.price)
            .fetch_one(&mut *tx)
            .await?;

            items.push(OrderItem {
                id: item_id,
                menu_id,
                description: item.description.clone(),
                price: item.price,
            });
        }

        tx.commit().await?;

        Ok(Order {
            id,
            franchise_id: Some(order.franchise_id),
            store_id: Some(order.store_id),
            date,
            items,
        })
    }
}
