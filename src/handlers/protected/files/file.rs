// handlers/protected/files/file.rs - attachment listing and removal

use axum::extract::State;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::extract::ApiPath;
use crate::middleware::{authorize, ApiResponse, ApiResult, AuthUser};
use crate::types::Action;

/// GET /files/record/:record_id
pub async fn list_for_record(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(record_id): ApiPath<i64>,
) -> ApiResult<Value> {
    authorize(&user, Action::ViewFiles.allowed_roles())?;

    let files = state.files.list_for_record(user.scope(None), record_id).await?;
    Ok(ApiResponse::success(json!({ "files": files })))
}

/// DELETE /files/:id
pub async fn delete(State(state): State<AppState>, user: AuthUser, ApiPath(id): ApiPath<i64>) -> ApiResult<Value> {
    authorize(&user, Action::DeleteFile.allowed_roles())?;

    state.files.delete(&user, user.scope(None), id).await?;
    Ok(ApiResponse::success(json!({ "message": "File deleted successfully" })))
}
