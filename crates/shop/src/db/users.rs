//! User repository: profiles, credentials, and the loyalty balance.
//!
//! The loyalty balance is only touched through `add_points` and
//! `redeem_points`, both single atomic statements. Profile saves are
//! guarded on the record's `updated_at` version token.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::Row;

use sari_core::{Email, UserId, loyalty};

use super::RepositoryError;
use crate::models::{ProfileUpdate, User};

/// Row shape shared by every query that returns a full user record.
#[derive(sqlx::FromRow)]
struct UserRow {
    id: i32,
    email: String,
    display_name: Option<String>,
    photo_url: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    points: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> Result<User, RepositoryError> {
        let email = Email::parse(&self.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(User {
            id: UserId::new(self.id),
            email,
            display_name: self.display_name,
            photo_url: self.photo_url,
            phone: self.phone,
            address: self.address,
            points: self.points,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const USER_COLUMNS: &str =
    "id, email, display_name, photo_url, phone, address, points, created_at, updated_at";

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

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `DataCorruption` if the stored email is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM shop.user WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `DataCorruption` if the stored email is invalid.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM shop.user WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }

    /// Create a new user with email, display name, and password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    pub async fn create_with_password(
        &self,
        email: &Email,
        display_name: &str,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row: UserRow = sqlx::query_as(&format!(
            "INSERT INTO shop.user (email, display_name) VALUES ($1, $2) RETURNING {USER_COLUMNS}"
        ))
        .bind(email.as_str())
        .bind(display_name)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        sqlx::query("INSERT INTO shop.user_password (user_id, password_hash) VALUES ($1, $2)")
            .bind(row.id)
            .bind(password_hash)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        row.into_user()
    }

    /// Get a user's password hash by email.
    ///
    /// Returns `None` if the user doesn't exist or has no password set.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query(
            r"
            SELECT u.id, u.email, u.display_name, u.photo_url, u.phone, u.address,
                   u.points, u.created_at, u.updated_at,
                   p.password_hash
            FROM shop.user u
            JOIN shop.user_password p ON u.id = p.user_id
            WHERE u.email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let password_hash: String = row.try_get("password_hash")?;
        let user = UserRow {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            display_name: row.try_get("display_name")?,
            photo_url: row.try_get("photo_url")?,
            phone: row.try_get("phone")?,
            address: row.try_get("address")?,
            points: row.try_get("points")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        }
        .into_user()?;

        Ok(Some((user, password_hash)))
    }

    /// Apply a profile save guarded by the edit session's version token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` when the record changed since
    /// the token was captured (or when the new email is already taken),
    /// and `NotFound` if the user vanished.
    pub async fn update_profile(
        &self,
        id: UserId,
        update: &ProfileUpdate,
        expected_updated_at: DateTime<Utc>,
    ) -> Result<User, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            r"
            UPDATE shop.user
            SET display_name = $1, email = $2, phone = $3, address = $4,
                photo_url = $5, updated_at = now()
            WHERE id = $6 AND updated_at = $7
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(update.display_name.as_deref())
        .bind(update.email.as_str())
        .bind(update.phone.as_deref())
        .bind(update.address.as_deref())
        .bind(update.photo_url.as_deref())
        .bind(id.as_i32())
        .bind(expected_updated_at)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        match row {
            Some(row) => row.into_user(),
            None => {
                // Distinguish a stale token from a deleted user.
                let exists = self.get_by_id(id).await?.is_some();
                if exists {
                    Err(RepositoryError::Conflict(
                        "profile was changed by another session".to_owned(),
                    ))
                } else {
                    Err(RepositoryError::NotFound)
                }
            }
        }
    }

    /// Atomically add points to a user's balance.
    ///
    /// Returns the new balance.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn add_points(&self, id: UserId, points: i64) -> Result<i64, RepositoryError> {
        let row = sqlx::query(
            r"
            UPDATE shop.user
            SET points = points + $1, updated_at = now()
            WHERE id = $2
            RETURNING points
            ",
        )
        .bind(points)
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => Ok(row.try_get("points")?),
            None => Err(RepositoryError::NotFound),
        }
    }

    /// Atomically redeem one decrement of points.
    ///
    /// The guard keeps the balance from ever going below zero; no row is
    /// updated when the balance is under the redemption floor.
    ///
    /// Returns the new balance, or `None` when the balance was
    /// insufficient (nothing is mutated in that case).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn redeem_points(&self, id: UserId) -> Result<Option<i64>, RepositoryError> {
        let row = sqlx::query(
            r"
            UPDATE shop.user
            SET points = points - $1, updated_at = now()
            WHERE id = $2 AND points >= $1
            RETURNING points
            ",
        )
        .bind(loyalty::REDEEM_COST)
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(row.try_get("points")?)),
            None => Ok(None),
        }
    }
}
