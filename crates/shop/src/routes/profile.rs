//! Profile route handlers.
//!
//! The profile screen's server side: the live snapshot, the guarded edit
//! session, the photo upload, and the loyalty-point operations. A save is
//! only accepted while an edit session is open, and it carries the version
//! token captured when editing began - a concurrent writer turns into a
//! 409 instead of being silently overwritten.

use axum::{
    Json,
    extract::{Multipart, State},
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use sari_core::{Email, loyalty};

use crate::db::{OrderRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::auth::{RequireAuth, set_current_user};
use crate::models::{CurrentUser, Order, OrderItem, ProfileEditLock, ProfileUpdate, User};
use crate::models::session_keys;
use crate::state::AppState;

// =============================================================================
// Views
// =============================================================================

/// Profile snapshot returned to the client.
#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub display_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub photo_url: Option<String>,
    pub points: i64,
    pub editing: bool,
}

impl ProfileView {
    fn from_user(user: &User, editing: bool) -> Self {
        Self {
            display_name: user.display_name.clone(),
            email: user.email.to_string(),
            phone: user.phone.clone(),
            address: user.address.clone(),
            photo_url: user.photo_url.clone(),
            points: user.points,
            editing,
        }
    }
}

/// Loyalty balance after a purchase or redemption.
#[derive(Debug, Serialize)]
pub struct PointsView {
    pub points_changed: i64,
    pub balance: i64,
    pub message: String,
}

/// An order in the history view.
#[derive(Debug, Serialize)]
pub struct OrderHistoryView {
    pub order_id: String,
    pub created_at: String,
    pub status: String,
    pub total: String,
    pub payment_method: String,
    pub address: String,
    pub items: Vec<OrderHistoryItemView>,
}

#[derive(Debug, Serialize)]
pub struct OrderHistoryItemView {
    pub name: String,
    pub quantity: u32,
    pub unit_price: String,
}

fn history_view(order: &Order, items: &[OrderItem]) -> OrderHistoryView {
    OrderHistoryView {
        order_id: order.id.to_string(),
        created_at: order.created_at.to_rfc3339(),
        status: order.status.to_string(),
        total: sari_core::Price::new(order.total, order.currency).display(),
        payment_method: order.payment_method.label().to_owned(),
        address: order.address.clone(),
        items: items
            .iter()
            .map(|item| OrderHistoryItemView {
                name: item.name.clone(),
                quantity: item.quantity,
                unit_price: sari_core::Price::new(item.unit_price, order.currency).display(),
            })
            .collect(),
    }
}

// =============================================================================
// Requests
// =============================================================================

/// Point purchase request.
#[derive(Debug, Deserialize)]
pub struct PurchasePointsRequest {
    pub amount: Decimal,
}

// =============================================================================
// Edit-lock helpers
// =============================================================================

async fn edit_lock(session: &Session) -> Result<Option<ProfileEditLock>> {
    Ok(session
        .get::<ProfileEditLock>(session_keys::PROFILE_EDIT)
        .await?)
}

async fn clear_edit_lock(session: &Session) -> Result<()> {
    session
        .remove::<ProfileEditLock>(session_keys::PROFILE_EDIT)
        .await?;
    Ok(())
}

async fn fetch_profile(state: &AppState, user: &CurrentUser) -> Result<User> {
    UserRepository::new(state.pool())
        .get_by_id(user.id)
        .await?
        .ok_or_else(|| AppError::Unprocessable("Your profile could not be found".to_owned()))
}

// =============================================================================
// Handlers
// =============================================================================

/// The live profile snapshot.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
) -> Result<impl IntoResponse> {
    let profile = fetch_profile(&state, &user).await?;
    let editing = edit_lock(&session).await?.is_some();
    Ok(Json(ProfileView::from_user(&profile, editing)))
}

/// Begin an edit session.
///
/// Captures the record's current version token; the eventual save is
/// validated against it.
#[instrument(skip(state, session))]
pub async fn edit_begin(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
) -> Result<impl IntoResponse> {
    let profile = fetch_profile(&state, &user).await?;

    let lock = ProfileEditLock {
        expected_updated_at: profile.updated_at,
    };
    session.insert(session_keys::PROFILE_EDIT, &lock).await?;

    Ok(Json(ProfileView::from_user(&profile, true)))
}

/// Discard the edit session without saving.
#[instrument(skip(state, session))]
pub async fn edit_cancel(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
) -> Result<impl IntoResponse> {
    clear_edit_lock(&session).await?;
    let profile = fetch_profile(&state, &user).await?;
    Ok(Json(ProfileView::from_user(&profile, false)))
}

/// Save the profile.
///
/// Multipart fields: `display_name`, `email`, `phone`, `address`, and an
/// optional `photo` file. A present field replaces the stored value (an
/// empty string clears it); absent fields keep their current value. The
/// photo, if any, is uploaded to object storage first and its public URL
/// joins the merged write.
#[instrument(skip(state, session, multipart))]
pub async fn save(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let Some(lock) = edit_lock(&session).await? else {
        return Err(AppError::Conflict(
            "No profile edit in progress".to_owned(),
        ));
    };

    let current = fetch_profile(&state, &user).await?;

    let mut display_name = current.display_name.clone();
    let mut email = current.email.clone();
    let mut phone = current.phone.clone();
    let mut address = current.address.clone();
    let mut photo_url = current.photo_url.clone();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_owned();
        match name.as_str() {
            "photo" => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_owned();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("invalid photo upload: {e}")))?;
                if bytes.is_empty() {
                    continue;
                }
                let url = state
                    .media()
                    .upload_profile_photo(user.id, bytes.to_vec(), &content_type)
                    .await?;
                photo_url = Some(url);
            }
            "display_name" | "email" | "phone" | "address" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("invalid field {name}: {e}")))?;
                let trimmed = value.trim().to_owned();
                match name.as_str() {
                    "display_name" => {
                        display_name = (!trimmed.is_empty()).then_some(trimmed);
                    }
                    "email" => {
                        email = Email::parse(&trimmed)
                            .map_err(|e| AppError::BadRequest(format!("invalid email: {e}")))?;
                    }
                    "phone" => phone = (!trimmed.is_empty()).then_some(trimmed),
                    "address" => address = (!trimmed.is_empty()).then_some(trimmed),
                    _ => {}
                }
            }
            _ => {
                // Unknown fields are ignored so older clients keep working
            }
        }
    }

    let update = ProfileUpdate {
        display_name,
        email,
        phone,
        address,
        photo_url,
    };

    let updated = UserRepository::new(state.pool())
        .update_profile(user.id, &update, lock.expected_updated_at)
        .await?;

    // Keep the session identity in step with the saved record.
    let current_user = CurrentUser {
        id: updated.id,
        email: updated.email.clone(),
    };
    set_current_user(&session, &current_user).await?;
    clear_edit_lock(&session).await?;

    Ok(Json(ProfileView::from_user(&updated, false)))
}

/// Buy loyalty points directly.
///
/// The amount must cover at least one earn unit; the earned count is
/// `floor(amount / EARN_UNIT)` and lands in one atomic increment.
#[instrument(skip(state))]
pub async fn purchase_points(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(form): Json<PurchasePointsRequest>,
) -> Result<impl IntoResponse> {
    if form.amount < Decimal::from(loyalty::MIN_PURCHASE_AMOUNT) {
        return Err(AppError::BadRequest(format!(
            "Minimum purchase amount is {}",
            loyalty::MIN_PURCHASE_AMOUNT
        )));
    }

    let earned = loyalty::points_earned(form.amount);
    let balance = UserRepository::new(state.pool())
        .add_points(user.id, earned)
        .await?;

    Ok(Json(PointsView {
        points_changed: earned,
        balance,
        message: format!("You earned {earned} points"),
    }))
}

/// Redeem one decrement of loyalty points.
///
/// Rejected without mutation when the balance is under the floor.
#[instrument(skip(state))]
pub async fn redeem_points(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse> {
    let balance = UserRepository::new(state.pool())
        .redeem_points(user.id)
        .await?
        .ok_or_else(|| AppError::Conflict("Not Enough Points".to_owned()))?;

    Ok(Json(PointsView {
        points_changed: -loyalty::REDEEM_COST,
        balance,
        message: format!("{} points redeemed", loyalty::REDEEM_COST),
    }))
}

/// The caller's order history, newest first.
#[instrument(skip(state))]
pub async fn orders(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse> {
    let repo = OrderRepository::new(state.pool());
    let orders = repo.list_for_user(user.id).await?;

    let mut views = Vec::with_capacity(orders.len());
    for order in &orders {
        let items = repo.items(order.id).await?;
        views.push(history_view(order, &items));
    }

    Ok(Json(views))
}
