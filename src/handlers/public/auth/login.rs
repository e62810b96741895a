// handlers/public/auth/login.rs - POST /auth/login

use axum::{extract::State, Extension, Json};
use serde::Deserialize;

use crate::app::AppState;
use crate::auth::LoginOutcome;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::middleware::AuthUser;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub school_id: Option<String>,
    pub password: Option<String>,
}

/// Exchange `{school_id, password}` for an access/refresh token pair.
///
/// The established identity is attached to the response so the login
/// itself is recorded in the activity log.
pub async fn post(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<(Extension<AuthUser>, Json<LoginOutcome>), ApiError> {
    let school_id = body.school_id.as_deref().map(str::trim).unwrap_or_default();
    let password = body.password.as_deref().unwrap_or_default();
    if school_id.is_empty() || password.is_empty() {
        return Err(ApiError::bad_request("School ID and password are required"));
    }

    let outcome = state.credentials.authenticate(school_id, password).await?;
    let caller = AuthUser {
        user_id: outcome.user.id,
        school_id: outcome.user.school_id.clone(),
        role: outcome.user.role,
        department_id: outcome.user.department_id,
    };

    Ok((Extension(caller), Json(outcome)))
}
