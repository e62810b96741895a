// handlers/protected/requests/process.rs - PUT /requests/:id

use axum::extract::State;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::{authorize, ApiResponse, ApiResult, AuthUser};
use crate::services::request_service::ProcessRequestInput;
use crate::types::Action;

/// Approve or reject a Pending request. `{status, remarks}`
pub async fn put(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<ProcessRequestInput>,
) -> ApiResult<Value> {
    authorize(&user, Action::ProcessRequest.allowed_roles())?;

    let status = state.requests.process(&user, id, input).await?;
    Ok(ApiResponse::success(json!({
        "message": "Request processed successfully",
        "status": status,
    })))
}
