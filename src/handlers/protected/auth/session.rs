// handlers/protected/auth/session.rs - profile and logout for the caller

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::models::UserProfile;
use crate::error::ApiError;
use crate::middleware::AuthUser;

/// GET /auth/profile - the caller's account joined with its department
pub async fn profile(State(state): State<AppState>, user: AuthUser) -> Result<Json<UserProfile>, ApiError> {
    let profile = state.users.profile(user.user_id).await?;
    Ok(Json(profile))
}

/// POST /auth/logout - acknowledge the logout
///
/// Tokens are stateless and stay valid until they expire; the call exists so
/// the logout shows up in the activity log.
pub async fn logout(user: AuthUser) -> Json<Value> {
    tracing::info!("User {} logged out", user.user_id);
    Json(json!({ "message": "Logged out successfully" }))
}
