//! Cart route handlers.
//!
//! The cart lives in the session; every response carries the freshly
//! resolved view so the client never has to track prices itself.

use axum::{Json, extract::State, response::IntoResponse};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use sari_core::ProductId;

use crate::cart::{Cart, ResolvedCart};
use crate::error::{AppError, Result};
use crate::middleware::auth::RequireAuth;
use crate::routes::session_state::{load_cart, save_cart};
use crate::state::AppState;

/// Cart line display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartItemView {
    pub product_id: i32,
    pub name: String,
    pub description: String,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
}

/// Cart display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u32,
}

impl From<&ResolvedCart> for CartView {
    fn from(resolved: &ResolvedCart) -> Self {
        Self {
            items: resolved
                .lines
                .iter()
                .map(|line| CartItemView {
                    product_id: line.product_id.as_i32(),
                    name: line.name.clone(),
                    description: line.description.clone(),
                    quantity: line.quantity,
                    price: line.unit_price.display(),
                    line_price: line.line_total.display(),
                })
                .collect(),
            subtotal: resolved.total.display(),
            item_count: resolved.lines.iter().map(|l| l.quantity).sum(),
        }
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: i32,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartRequest {
    pub product_id: i32,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartRequest {
    pub product_id: i32,
}

/// Resolve a cart against the catalog and render the view.
async fn render_cart(state: &AppState, cart: &Cart) -> Result<CartView> {
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
    Ok(CartView::from(&cart.resolve(&products)))
}

/// Display the cart.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    session: Session,
) -> Result<impl IntoResponse> {
    let cart = load_cart(&session).await?;
    Ok(Json(render_cart(&state, &cart).await?))
}

/// Add an item to the cart.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    session: Session,
    Json(form): Json<AddToCartRequest>,
) -> Result<impl IntoResponse> {
    let product_id = ProductId::new(form.product_id);

    // Only catalog products can be added
    state
        .catalog()
        .get(state.pool(), product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;

    let mut cart = load_cart(&session).await?;
    cart.add(product_id, form.quantity.unwrap_or(1));
    save_cart(&session, &cart).await?;

    Ok(Json(render_cart(&state, &cart).await?))
}

/// Update a cart line's quantity; zero removes the line.
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    session: Session,
    Json(form): Json<UpdateCartRequest>,
) -> Result<impl IntoResponse> {
    let product_id = ProductId::new(form.product_id);

    let mut cart = load_cart(&session).await?;
    if !cart.set_quantity(product_id, form.quantity) {
        return Err(AppError::NotFound(format!(
            "cart line for product {product_id}"
        )));
    }
    save_cart(&session, &cart).await?;

    Ok(Json(render_cart(&state, &cart).await?))
}

/// Remove an item from the cart.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    session: Session,
    Json(form): Json<RemoveFromCartRequest>,
) -> Result<impl IntoResponse> {
    let product_id = ProductId::new(form.product_id);

    let mut cart = load_cart(&session).await?;
    if !cart.remove(product_id) {
        return Err(AppError::NotFound(format!(
            "cart line for product {product_id}"
        )));
    }
    save_cart(&session, &cart).await?;

    Ok(Json(render_cart(&state, &cart).await?))
}

/// Total unit count, for the client's cart badge.
#[instrument(skip(session))]
pub async fn count(
    RequireAuth(_user): RequireAuth,
    session: Session,
) -> Result<impl IntoResponse> {
    let cart = load_cart(&session).await?;
    Ok(Json(
        serde_json::json!({ "count": cart.total_quantity() }),
    ))
}
