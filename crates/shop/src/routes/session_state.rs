//! Typed access to the session-held flow state.
//!
//! The cart and the checkout wizard are shared between route modules, so
//! their load/store helpers live here instead of being duplicated per
//! file.

use tower_sessions::Session;

use crate::cart::Cart;
use crate::checkout::CheckoutState;
use crate::error::Result;
use crate::models::session_keys;

/// Load the cart, defaulting to an empty one.
pub async fn load_cart(session: &Session) -> Result<Cart> {
    Ok(session
        .get::<Cart>(session_keys::CART)
        .await?
        .unwrap_or_default())
}

/// Store the cart.
pub async fn save_cart(session: &Session, cart: &Cart) -> Result<()> {
    session.insert(session_keys::CART, cart).await?;
    Ok(())
}

/// Load the checkout wizard state, defaulting to a fresh wizard.
pub async fn load_checkout(session: &Session) -> Result<CheckoutState> {
    Ok(session
        .get::<CheckoutState>(session_keys::CHECKOUT)
        .await?
        .unwrap_or_default())
}

/// Store the checkout wizard state.
pub async fn save_checkout(session: &Session, state: &CheckoutState) -> Result<()> {
    session.insert(session_keys::CHECKOUT, state).await?;
    Ok(())
}

/// Drop the wizard state, e.g. after a placed order.
pub async fn clear_checkout(session: &Session) -> Result<()> {
    session
        .remove::<CheckoutState>(session_keys::CHECKOUT)
        .await?;
    Ok(())
}
