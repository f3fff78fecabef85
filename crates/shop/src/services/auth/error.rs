//! Authentication error types.

use thiserror::Error;

use sari_core::EmailError;

use crate::db::RepositoryError;

/// Errors from authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The email address is structurally invalid.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// The password does not meet requirements.
    #[error("weak password: {0}")]
    WeakPassword(String),

    /// Wrong email or password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// No user with this identity.
    #[error("user not found")]
    UserNotFound,

    /// The email is already registered.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Hashing the password failed.
    #[error("password hashing failed")]
    PasswordHash,

    /// Underlying repository failure.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}
