// handlers/protected/records/record.rs - GET/PUT/DELETE /records/:id

use axum::extract::State;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::models::RecordInput;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::{authorize, ApiResponse, ApiResult, AuthUser};
use crate::types::Action;

/// GET /records/:id - the record with its attachments
pub async fn get(State(state): State<AppState>, user: AuthUser, ApiPath(id): ApiPath<i64>) -> ApiResult<Value> {
    authorize(&user, Action::ViewRecords.allowed_roles())?;

    let record = state.records.get(user.scope(None), id).await?;
    let files = state.files.files_of(id).await?;

    Ok(ApiResponse::success(json!({
        "record": record,
        "files": files,
    })))
}

/// PUT /records/:id - replace the descriptive fields
pub async fn put(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<RecordInput>,
) -> ApiResult<Value> {
    authorize(&user, Action::UpdateRecord.allowed_roles())?;

    state.records.update(&user, user.scope(None), id, input).await?;
    Ok(ApiResponse::success(json!({ "message": "Record updated successfully" })))
}

/// DELETE /records/:id
pub async fn delete(State(state): State<AppState>, user: AuthUser, ApiPath(id): ApiPath<i64>) -> ApiResult<Value> {
    authorize(&user, Action::DeleteRecord.allowed_roles())?;

    state.records.delete(&user, id).await?;
    Ok(ApiResponse::success(json!({ "message": "Record deleted successfully" })))
}
