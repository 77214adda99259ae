//! Handlers for `/auth`: login, token refresh, and logout.
//!
//! Access tokens are short-lived JWTs; refresh tokens are opaque, stored
//! hashed, and rotated on every refresh.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use aqualog_core::audit::action_types;
use aqualog_core::error::CoreError;
use aqualog_core::types::DbId;
use aqualog_db::models::user::User;
use aqualog_db::repositories::{SessionRepo, UserRepo};
use aqualog_events::DomainEvent;

use crate::auth::jwt::{generate_access_token, generate_refresh_token, hash_refresh_token};
use crate::auth::password::verify_password;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Request body for refresh and logout.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Public view of a user returned with a token pair.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: DbId,
    pub username: String,
    pub display_name: Option<String>,
    pub role: String,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            display_name: user.display_name.clone(),
            role: user.role.clone(),
        }
    }
}

/// Token pair issued on login and refresh.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserView,
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let user = UserRepo::find_by_username(&state.pool, body.username.trim())
        .await?
        .ok_or_else(invalid_credentials)?;

    let password_ok = verify_password(&body.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("password verification failed: {e}")))?;
    if !password_ok {
        return Err(invalid_credentials());
    }

    let tokens = issue_tokens(&state, &user).await?;

    state.event_bus.publish(
        DomainEvent::new(action_types::LOGIN)
            .with_entity("user", user.id.to_string())
            .with_actor(user.id),
    );

    Ok(Json(tokens))
}

/// POST /api/v1/auth/refresh
///
/// Exchange a live refresh token for a new token pair. The presented
/// token is revoked (rotation) so a replayed token fails.
pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> AppResult<impl IntoResponse> {
    let presented_hash = hash_refresh_token(body.refresh_token.trim());
    let session = SessionRepo::find_live_by_hash(&state.pool, &presented_hash)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid or expired refresh token".into(),
            ))
        })?;

    let user = UserRepo::find_by_id(&state.pool, session.user_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Account is disabled".into())))?;

    SessionRepo::revoke_by_hash(&state.pool, &presented_hash).await?;
    let tokens = issue_tokens(&state, &user).await?;

    Ok(Json(tokens))
}

/// POST /api/v1/auth/logout
///
/// Revoke the presented refresh token. Idempotent.
pub async fn logout(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> AppResult<impl IntoResponse> {
    let presented_hash = hash_refresh_token(body.refresh_token.trim());
    SessionRepo::revoke_by_hash(&state.pool, &presented_hash).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn invalid_credentials() -> AppError {
    // One message for both unknown-user and wrong-password: do not leak
    // which usernames exist.
    AppError::Core(CoreError::Unauthorized(
        "Invalid username or password".into(),
    ))
}

/// Generate an access token and a fresh stored refresh session.
async fn issue_tokens(state: &AppState, user: &User) -> AppResult<TokenResponse> {
    let access_token = generate_access_token(user.id, &user.role, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("token generation failed: {e}")))?;

    let (refresh_plaintext, refresh_hash) = generate_refresh_token();
    let expires_at =
        chrono::Utc::now() + chrono::Duration::days(state.config.jwt.refresh_token_expiry_days);
    SessionRepo::create(&state.pool, user.id, &refresh_hash, expires_at).await?;

    Ok(TokenResponse {
        access_token,
        refresh_token: refresh_plaintext,
        user: UserView::from(user),
    })
}
