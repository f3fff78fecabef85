//! Address repository.
//!
//! Every mutation is a single-row statement scoped to the owning user, so
//! two sessions editing the address book concurrently cannot clobber each
//! other the way whole-list rewrites would.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use sari_core::{AddressId, UserId};

use super::RepositoryError;

/// A saved delivery address.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub address: String,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct AddressRow {
    id: Uuid,
    user_id: i32,
    address: String,
    created_at: DateTime<Utc>,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Self {
            id: AddressId::new(row.id),
            user_id: UserId::new(row.user_id),
            address: row.address,
            created_at: row.created_at,
        }
    }
}

/// Repository for saved addresses.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a user's addresses in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        let rows: Vec<AddressRow> = sqlx::query_as(
            r"
            SELECT id, user_id, address, created_at
            FROM shop.address
            WHERE user_id = $1
            ORDER BY created_at ASC, id ASC
            ",
        )
        .bind(user_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Address::from).collect())
    }

    /// Get one of a user's addresses.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<Option<Address>, RepositoryError> {
        let row: Option<AddressRow> = sqlx::query_as(
            r"
            SELECT id, user_id, address, created_at
            FROM shop.address
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(id.as_uuid())
        .bind(user_id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Address::from))
    }

    /// Append a new address with a freshly generated id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(&self, user_id: UserId, address: &str) -> Result<Address, RepositoryError> {
        let row: AddressRow = sqlx::query_as(
            r"
            INSERT INTO shop.address (id, user_id, address)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, address, created_at
            ",
        )
        .bind(AddressId::generate().as_uuid())
        .bind(user_id.as_i32())
        .bind(address)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Replace the text of one address.
    ///
    /// Returns `false` if the user has no address with that id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &self,
        user_id: UserId,
        id: AddressId,
        address: &str,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE shop.address
            SET address = $1
            WHERE id = $2 AND user_id = $3
            ",
        )
        .bind(address)
        .bind(id.as_uuid())
        .bind(user_id.as_i32())
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete one address.
    ///
    /// Returns `false` if the user has no address with that id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, user_id: UserId, id: AddressId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM shop.address
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(id.as_uuid())
        .bind(user_id.as_i32())
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
