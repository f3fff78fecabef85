//! Order repository.
//!
//! An order and its lines are written in one transaction; either the whole
//! order exists or none of it does.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use sari_core::{CurrencyCode, OrderId, OrderStatus, PaymentMethod, ProductId, UserId};

use super::RepositoryError;
use crate::models::{NewOrder, Order, OrderItem};

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    user_id: i32,
    customer_name: String,
    address: String,
    delivery_method: String,
    payment_method: String,
    total: Decimal,
    currency: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self) -> Result<Order, RepositoryError> {
        let corrupt = |what: &str, err: String| {
            RepositoryError::DataCorruption(format!("invalid {what} in database: {err}"))
        };

        Ok(Order {
            id: OrderId::new(self.id),
            user_id: UserId::new(self.user_id),
            customer_name: self.customer_name,
            address: self.address,
            delivery_method: self
                .delivery_method
                .parse::<PaymentMethod>()
                .map_err(|e| corrupt("delivery method", e))?,
            payment_method: self
                .payment_method
                .parse::<PaymentMethod>()
                .map_err(|e| corrupt("payment method", e))?,
            total: self.total,
            currency: self
                .currency
                .parse::<CurrencyCode>()
                .map_err(|e| corrupt("currency", e.to_string()))?,
            status: self
                .status
                .parse::<OrderStatus>()
                .map_err(|e| corrupt("status", e))?,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    product_id: i32,
    name: String,
    description: String,
    quantity: i32,
    unit_price: Decimal,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            product_id: ProductId::new(row.product_id),
            name: row.name,
            description: row.description,
            quantity: u32::try_from(row.quantity).unwrap_or(1),
            unit_price: row.unit_price,
        }
    }
}

/// Repository for orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Persist a new order and its lines in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any insert fails; nothing is
    /// committed in that case.
    pub async fn create(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row: OrderRow = sqlx::query_as(
            r"
            INSERT INTO shop.order
                (id, user_id, customer_name, address, delivery_method,
                 payment_method, total, currency, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, user_id, customer_name, address, delivery_method,
                      payment_method, total, currency, status, created_at
            ",
        )
        .bind(order.id.as_uuid())
        .bind(order.user_id.as_i32())
        .bind(&order.customer_name)
        .bind(&order.address)
        .bind(order.method.as_str())
        .bind(order.method.as_str())
        .bind(order.total)
        .bind(order.currency.code())
        .bind(order.status.as_str())
        .fetch_one(&mut *tx)
        .await?;

        for item in &order.items {
            sqlx::query(
                r"
                INSERT INTO shop.order_item
                    (order_id, product_id, name, description, quantity, unit_price)
                VALUES ($1, $2, $3, $4, $5, $6)
                ",
            )
            .bind(order.id.as_uuid())
            .bind(item.product_id.as_i32())
            .bind(&item.name)
            .bind(&item.description)
            .bind(i32::try_from(item.quantity).unwrap_or(i32::MAX))
            .bind(item.unit_price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        row.into_order()
    }

    /// A user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows: Vec<OrderRow> = sqlx::query_as(
            r"
            SELECT id, user_id, customer_name, address, delivery_method,
                   payment_method, total, currency, status, created_at
            FROM shop.order
            WHERE user_id = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(user_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(OrderRow::into_order).collect()
    }

    /// The lines of one order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let rows: Vec<OrderItemRow> = sqlx::query_as(
            r"
            SELECT product_id, name, description, quantity, unit_price
            FROM shop.order_item
            WHERE order_id = $1
            ORDER BY id ASC
            ",
        )
        .bind(order_id.as_uuid())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(OrderItem::from).collect())
    }
}
