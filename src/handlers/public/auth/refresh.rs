// handlers/public/auth/refresh.rs - POST /auth/refresh

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::app::AppState;
use crate::auth::{AuthError, TokenPair};
use crate::error::ApiError;
use crate::extract::ApiJson;

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    #[serde(rename = "refreshToken")]
    pub refresh_token: Option<String>,
}

pub async fn post(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RefreshRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let token = body
        .refresh_token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::bad_request("Refresh token is required"))?;

    match state.credentials.refresh(token) {
        Ok(pair) => Ok(Json(pair)),
        Err(AuthError::TokenExpired) | Err(AuthError::TokenInvalid(_)) => {
            Err(ApiError::unauthorized("Invalid refresh token"))
        }
        Err(other) => Err(other.into()),
    }
}
