//! User and profile models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sari_core::{Email, UserId};

/// A shop user and their profile record.
///
/// `points` is the loyalty balance; it is only ever changed through the
/// repository's atomic increment and guarded decrement, never by profile
/// saves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub points: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The merged field set written by a profile save.
///
/// Values here are the final state, already merged over the current record
/// by the handler. Points are deliberately absent.
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub email: Email,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub photo_url: Option<String>,
}
