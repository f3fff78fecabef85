//! Session-stored types.
//!
//! The session is the explicit per-user context the checkout and profile
//! flows share: the signed-in identity, the cart, the wizard state, and the
//! profile edit lock all live here and nowhere else.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sari_core::{Email, UserId};

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
}

/// Marker held while a profile edit session is open.
///
/// `expected_updated_at` is the record's version token captured when the
/// edit began; the save is guarded on it so a concurrent writer surfaces
/// as a conflict instead of being silently overwritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileEditLock {
    pub expected_updated_at: DateTime<Utc>,
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the cart contents.
    pub const CART: &str = "cart";

    /// Key for the checkout wizard state.
    pub const CHECKOUT: &str = "checkout";

    /// Key for the profile edit lock.
    pub const PROFILE_EDIT: &str = "profile_edit";
}
