// handlers/public/auth/register.rs - POST /auth/register

use axum::extract::State;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::password::hash_password;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::RegistrationInput;

pub async fn post(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegistrationInput>,
) -> ApiResult<Value> {
    let new_user = body.validate().map_err(ApiError::bad_request)?;
    let hash = hash_password(&new_user.password, state.config.security.bcrypt_cost).await?;

    let user = state.users.create(&new_user, &hash).await.map_err(|e| match e {
        // Unknown department is a client mistake, not a missing resource
        crate::database::DatabaseError::NotFound(msg) => ApiError::bad_request(msg),
        other => other.into(),
    })?;

    Ok(ApiResponse::created(json!({
        "message": "User registered successfully",
        "user": user,
    })))
}
