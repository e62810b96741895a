// handlers/protected/requests/collection.rs - GET/POST /requests

use axum::extract::State;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::extract::{ApiJson, ApiQuery};
use crate::filter::{PageQuery, Pagination};
use crate::middleware::{authorize, ApiResponse, ApiResult, AuthUser};
use crate::services::request_service::CreateRequestInput;
use crate::types::Action;

#[derive(Debug, Default, Deserialize)]
pub struct RequestListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
}

/// GET /requests - Staff see their own requests, everyone else sees all
pub async fn get(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<RequestListQuery>,
) -> ApiResult<Value> {
    authorize(&user, Action::ViewRequests.allowed_roles())?;

    let window = Pagination::resolve(
        PageQuery {
            page: query.page,
            limit: query.limit,
        },
        &state.config.pagination,
    );
    let (requests, total) = state.requests.list(&user, query.status.as_deref(), window).await?;

    Ok(ApiResponse::success(json!({
        "requests": requests,
        "pagination": window.summary(total),
    })))
}

/// POST /requests - file a Pending access request for a record
pub async fn post(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(input): ApiJson<CreateRequestInput>,
) -> ApiResult<Value> {
    authorize(&user, Action::CreateRequest.allowed_roles())?;

    let id = state.requests.create(&user, input).await?;
    Ok(ApiResponse::created(json!({
        "message": "Request created successfully",
        "id": id,
    })))
}
