//! HTTP route handlers for the shop service.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                     - Liveness check
//! GET  /health/ready               - Readiness check (verifies database)
//!
//! # Auth
//! POST /auth/register              - Create account and sign in
//! POST /auth/login                 - Sign in
//! POST /auth/logout                - Sign out (flushes cart and wizard)
//!
//! # Cart (session-held, requires auth)
//! GET  /cart                       - Resolved cart with totals
//! POST /cart/add                   - Add item (merges quantities)
//! POST /cart/update                - Set line quantity (0 removes)
//! POST /cart/remove                - Remove line
//! GET  /cart/count                 - Unit count for the badge
//!
//! # Checkout wizard (requires auth)
//! GET    /checkout                 - Wizard state + saved addresses
//! POST   /checkout/addresses       - Add saved address
//! PUT    /checkout/addresses/{id}  - Edit saved address
//! DELETE /checkout/addresses/{id}  - Remove saved address
//! POST   /checkout/select-address  - Select address for this order
//! POST   /checkout/method          - Choose delivery/payment method
//! POST   /checkout/advance         - Next step (validates preconditions)
//! POST   /checkout/back            - Return to the address step
//! GET    /checkout/review          - Review screen
//! POST   /checkout/place           - Place the order
//!
//! # Profile (requires auth)
//! GET  /profile                    - Live profile snapshot
//! POST /profile/edit               - Begin edit session (captures version)
//! POST /profile/cancel             - Discard edit session
//! PUT  /profile                    - Save (multipart, guarded by version)
//! POST /profile/points/purchase    - Buy points
//! POST /profile/points/redeem      - Redeem 5 points
//! GET  /profile/orders             - Order history
//! ```

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod profile;
mod session_state;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/count", get(cart::count))
}

/// Create the checkout wizard router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show))
        .route("/addresses", post(checkout::create_address))
        .route("/addresses/{id}", put(checkout::update_address))
        .route("/addresses/{id}", delete(checkout::delete_address))
        .route("/select-address", post(checkout::select_address))
        .route("/method", post(checkout::choose_method))
        .route("/advance", post(checkout::advance))
        .route("/back", post(checkout::back))
        .route("/review", get(checkout::review))
        .route("/place", post(checkout::place))
}

/// Create the profile routes router.
pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(profile::show).put(profile::save))
        .route("/edit", post(profile::edit_begin))
        .route("/cancel", post(profile::edit_cancel))
        .route("/points/purchase", post(profile::purchase_points))
        .route("/points/redeem", post(profile::redeem_points))
        .route("/orders", get(profile::orders))
}

/// Create all routes for the shop service.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .nest("/profile", profile_routes())
}
