//! Checkout route handlers.
//!
//! The three-step wizard: address selection (with the saved-address book),
//! delivery-method choice, and review/placement. Wizard state lives in the
//! session; every precondition is re-validated server-side at placement so
//! nothing is written for an empty cart or a dangling selection.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use sari_core::{AddressId, PaymentMethod, Price, UserId, loyalty};

use crate::cart::ResolvedCart;
use crate::checkout::{CheckoutError, CheckoutState, CheckoutStep};
use crate::db::{AddressRepository, OrderRepository, UserRepository};
use crate::db::addresses::Address;
use crate::error::{AppError, Result};
use crate::middleware::auth::RequireAuth;
use crate::models::NewOrder;
use crate::routes::cart::CartView;
use crate::routes::session_state::{
    clear_checkout, load_cart, load_checkout, save_cart, save_checkout,
};
use crate::state::AppState;

// =============================================================================
// Views
// =============================================================================

/// Saved address display data.
#[derive(Debug, Clone, Serialize)]
pub struct AddressView {
    pub id: AddressId,
    pub address: String,
}

impl From<&Address> for AddressView {
    fn from(address: &Address) -> Self {
        Self {
            id: address.id,
            address: address.address.clone(),
        }
    }
}

/// Wizard state as shown to the client.
#[derive(Debug, Serialize)]
pub struct CheckoutView {
    pub step: CheckoutStep,
    pub selected_address: Option<AddressId>,
    pub method: Option<PaymentMethod>,
    pub addresses: Vec<AddressView>,
}

/// The review screen: itemized cart, total, method, resolved address.
#[derive(Debug, Serialize)]
pub struct ReviewView {
    pub cart: CartView,
    pub total: String,
    pub total_display: String,
    pub method: PaymentMethod,
    pub address: String,
}

/// Placement result.
#[derive(Debug, Serialize)]
pub struct PlacedOrderView {
    pub order_id: String,
    pub status: String,
    pub total: String,
    pub total_display: String,
    pub points_earned: i64,
    /// Hosted checkout URL to open externally; only for the e-wallet method.
    pub checkout_url: Option<String>,
}

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct AddressForm {
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct SelectAddressRequest {
    pub address_id: AddressId,
}

#[derive(Debug, Deserialize)]
pub struct ChooseMethodRequest {
    pub method: PaymentMethod,
}

// =============================================================================
// Wizard handlers
// =============================================================================

async fn wizard_view(
    state: &AppState,
    session: &Session,
    user_id: UserId,
) -> Result<CheckoutView> {
    let checkout = load_checkout(session).await?;
    let addresses = AddressRepository::new(state.pool()).list(user_id).await?;

    Ok(CheckoutView {
        step: checkout.step(),
        selected_address: checkout.selected_address(),
        method: checkout.method(),
        addresses: addresses.iter().map(AddressView::from).collect(),
    })
}

/// Current wizard state plus the saved address book.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
) -> Result<impl IntoResponse> {
    Ok(Json(wizard_view(&state, &session, user.id).await?))
}

/// Select one of the saved addresses. Local to the wizard; no writes.
#[instrument(skip(state, session))]
pub async fn select_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Json(form): Json<SelectAddressRequest>,
) -> Result<impl IntoResponse> {
    AddressRepository::new(state.pool())
        .get(user.id, form.address_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("address {}", form.address_id)))?;

    let mut checkout = load_checkout(&session).await?;
    checkout.select_address(form.address_id);
    save_checkout(&session, &checkout).await?;

    Ok(Json(wizard_view(&state, &session, user.id).await?))
}

/// Choose the delivery/payment method at the delivery step.
#[instrument(skip(state, session))]
pub async fn choose_method(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Json(form): Json<ChooseMethodRequest>,
) -> Result<impl IntoResponse> {
    let mut checkout = load_checkout(&session).await?;
    checkout.choose_method(form.method)?;
    save_checkout(&session, &checkout).await?;

    Ok(Json(wizard_view(&state, &session, user.id).await?))
}

/// Advance the wizard one step.
#[instrument(skip(state, session))]
pub async fn advance(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
) -> Result<impl IntoResponse> {
    let mut checkout = load_checkout(&session).await?;
    checkout.advance()?;
    save_checkout(&session, &checkout).await?;

    Ok(Json(wizard_view(&state, &session, user.id).await?))
}

/// Return to the address step.
#[instrument(skip(state, session))]
pub async fn back(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
) -> Result<impl IntoResponse> {
    let mut checkout = load_checkout(&session).await?;
    checkout.back_to_address();
    save_checkout(&session, &checkout).await?;

    Ok(Json(wizard_view(&state, &session, user.id).await?))
}

// =============================================================================
// Address book handlers
// =============================================================================

fn validate_address_text(text: &str) -> Result<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest("Address cannot be empty".to_owned()));
    }
    Ok(trimmed)
}

/// Append a new saved address.
#[instrument(skip(state))]
pub async fn create_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(form): Json<AddressForm>,
) -> Result<impl IntoResponse> {
    let text = validate_address_text(&form.address)?;
    let address = AddressRepository::new(state.pool())
        .insert(user.id, text)
        .await?;

    Ok((StatusCode::CREATED, Json(AddressView::from(&address))))
}

/// Replace the text of a saved address.
#[instrument(skip(state))]
pub async fn update_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
    Json(form): Json<AddressForm>,
) -> Result<impl IntoResponse> {
    let text = validate_address_text(&form.address)?;
    let updated = AddressRepository::new(state.pool())
        .update(user.id, id, text)
        .await?;

    if !updated {
        return Err(AppError::NotFound(format!("address {id}")));
    }
    Ok(Json(AddressView {
        id,
        address: text.to_owned(),
    }))
}

/// Delete a saved address, clearing the wizard selection if it pointed at
/// the removed entry.
#[instrument(skip(state, session))]
pub async fn delete_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Path(id): Path<AddressId>,
) -> Result<impl IntoResponse> {
    let deleted = AddressRepository::new(state.pool())
        .delete(user.id, id)
        .await?;

    if !deleted {
        return Err(AppError::NotFound(format!("address {id}")));
    }

    let mut checkout = load_checkout(&session).await?;
    checkout.address_removed(id);
    save_checkout(&session, &checkout).await?;

    Ok(Json(wizard_view(&state, &session, user.id).await?))
}

// =============================================================================
// Review and placement
// =============================================================================

async fn resolve_session_cart(
    state: &AppState,
    session: &Session,
) -> Result<(crate::cart::Cart, ResolvedCart)> {
    let cart = load_cart(session).await?;
    let products = state
        .catalog()
        .get_many(
            state.pool(),
            cart.items()
                .iter()
                .map(|i| i.product_id)
                .collect::<Vec<_>>(),
        )
        .await?;
    let resolved = cart.resolve(&products);
    Ok((cart, resolved))
}

/// The review screen.
#[instrument(skip(state, session))]
pub async fn review(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
) -> Result<impl IntoResponse> {
    let checkout = load_checkout(&session).await?;
    if checkout.step() != CheckoutStep::Review {
        return Err(AppError::Checkout(CheckoutError::WrongStep));
    }
    let address_id = checkout
        .selected_address()
        .ok_or(AppError::Checkout(CheckoutError::AddressRequired))?;
    let method = checkout
        .method()
        .ok_or(AppError::Checkout(CheckoutError::MethodRequired))?;

    let address = AddressRepository::new(state.pool())
        .get(user.id, address_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("address {address_id}")))?;

    let (_, resolved) = resolve_session_cart(&state, &session).await?;

    Ok(Json(ReviewView {
        cart: CartView::from(&resolved),
        total: resolved.total.amount_display(),
        total_display: resolved.total.display(),
        method,
        address: address.address,
    }))
}

/// Place the order.
///
/// Every precondition is checked before the first write: an empty cart, a
/// missing address selection, a missing method, or a profile without a
/// display name all abort with nothing persisted. After the order is
/// committed, the points increment and the payment link follow; a failure
/// there is surfaced as-is with no compensating action - the order stands.
#[instrument(skip(state, session))]
pub async fn place(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
) -> Result<impl IntoResponse> {
    // All preconditions before any remote write.
    let (mut cart, resolved) = resolve_session_cart(&state, &session).await?;
    if cart.is_empty() {
        return Err(AppError::BadRequest("Your cart is empty".to_owned()));
    }

    let checkout = load_checkout(&session).await?;
    if !checkout.ready_to_place() {
        return Err(AppError::Checkout(match checkout.selected_address() {
            None => CheckoutError::AddressRequired,
            Some(_) if checkout.method().is_none() => CheckoutError::MethodRequired,
            Some(_) => CheckoutError::WrongStep,
        }));
    }
    // ready_to_place guarantees both are present
    let address_id = checkout
        .selected_address()
        .ok_or(AppError::Checkout(CheckoutError::AddressRequired))?;
    let method = checkout
        .method()
        .ok_or(AppError::Checkout(CheckoutError::MethodRequired))?;

    let address = AddressRepository::new(state.pool())
        .get(user.id, address_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("address {address_id}")))?;

    let users = UserRepository::new(state.pool());
    let profile = users
        .get_by_id(user.id)
        .await?
        .ok_or_else(|| AppError::Unprocessable("Your profile could not be found".to_owned()))?;
    let customer_name = profile
        .display_name
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| {
            AppError::Unprocessable(
                "Please set your display name before placing an order".to_owned(),
            )
        })?;

    // Build and persist the order.
    let new_order = NewOrder::from_resolved(
        user.id,
        customer_name,
        address.address,
        method,
        &resolved,
    );
    let order = OrderRepository::new(state.pool()).create(&new_order).await?;
    tracing::info!(order_id = %order.id, total = %order.total, "order placed");

    // Loyalty points earned on the recomputed total.
    let points_earned = loyalty::points_earned(order.total);
    if points_earned > 0 {
        let balance = users.add_points(user.id, points_earned).await?;
        tracing::info!(points_earned, balance, "loyalty points credited");
    }

    // One payment link, for the real order total, only for e-wallet.
    let checkout_url = if method == PaymentMethod::EWallet {
        let total = Price::new(order.total, order.currency);
        let link = state
            .payments()
            .create_link(&total, &format!("Order {}", order.id))
            .await?;
        Some(link.checkout_url)
    } else {
        None
    };

    // Success: clear the cart and the wizard for the next purchase.
    cart.clear();
    save_cart(&session, &cart).await?;
    clear_checkout(&session).await?;

    let total = Price::new(order.total, order.currency);
    Ok((
        StatusCode::CREATED,
        Json(PlacedOrderView {
            order_id: order.id.to_string(),
            status: order.status.to_string(),
            total: total.amount_display(),
            total_display: total.display(),
            points_earned,
            checkout_url,
        }),
    ))
}
