//! Authentication route handlers.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::auth::set_current_user;
use crate::models::{CurrentUser, User};
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub display_name: String,
    pub password: String,
}

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// The signed-in identity returned after register/login.
#[derive(Debug, Serialize)]
pub struct SessionUserResponse {
    pub id: i32,
    pub email: String,
    pub display_name: Option<String>,
}

impl From<&User> for SessionUserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.as_i32(),
            email: user.email.to_string(),
            display_name: user.display_name.clone(),
        }
    }
}

/// Register a new account and sign it in.
#[instrument(skip(state, session, form))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<RegisterRequest>,
) -> Result<impl IntoResponse> {
    let auth = AuthService::new(state.pool());
    let user = auth
        .register(&form.email, form.display_name.trim(), &form.password)
        .await?;

    establish_session(&session, &user).await?;

    Ok((StatusCode::CREATED, Json(SessionUserResponse::from(&user))))
}

/// Sign in with email and password.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    let auth = AuthService::new(state.pool());
    let user = auth.login(&form.email, &form.password).await?;

    establish_session(&session, &user).await?;

    Ok(Json(SessionUserResponse::from(&user)))
}

/// Sign out.
///
/// Flushing the session drops the identity together with the cart, the
/// checkout wizard, and any open profile edit - the navigation-reset
/// semantics of the mobile client's logout.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<impl IntoResponse> {
    clear_sentry_user();
    session.flush().await?;
    Ok(Json(serde_json::json!({ "signed_out": true })))
}

async fn establish_session(session: &Session, user: &User) -> Result<()> {
    let current = CurrentUser {
        id: user.id,
        email: user.email.clone(),
    };
    set_current_user(session, &current).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}
