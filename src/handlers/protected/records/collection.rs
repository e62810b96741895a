// handlers/protected/records/collection.rs - GET/POST /records

use axum::extract::State;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::models::RecordInput;
use crate::extract::{ApiJson, ApiQuery};
use crate::filter::{PageQuery, Pagination};
use crate::middleware::{authorize, ApiResponse, ApiResult, AuthUser};
use crate::types::Action;

#[derive(Debug, Default, Deserialize)]
pub struct RecordListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    /// Honored for Administrators only
    pub department_id: Option<i64>,
}

/// GET /records - paginated, searchable, department-scoped listing
pub async fn get(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<RecordListQuery>,
) -> ApiResult<Value> {
    authorize(&user, Action::ViewRecords.allowed_roles())?;

    let window = Pagination::resolve(
        PageQuery {
            page: query.page,
            limit: query.limit,
        },
        &state.config.pagination,
    );
    let (records, total) = state
        .records
        .list(user.scope(query.department_id), query.search.as_deref(), window)
        .await?;

    Ok(ApiResponse::success(json!({
        "records": records,
        "pagination": window.summary(total),
    })))
}

/// POST /records - create a record in the caller's (or, for Administrators,
/// the chosen) department
pub async fn post(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(input): ApiJson<RecordInput>,
) -> ApiResult<Value> {
    authorize(&user, Action::CreateRecord.allowed_roles())?;

    let id = state.records.create(&user, input).await?;
    Ok(ApiResponse::created(json!({
        "message": "Record created successfully",
        "id": id,
    })))
}
