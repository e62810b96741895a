// handlers/protected/reports/activity.rs - GET /reports/activity-logs

use axum::extract::State;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::extract::ApiQuery;
use crate::filter::{PageQuery, Pagination};
use crate::middleware::{authorize, ApiResponse, ApiResult, AuthUser};
use crate::types::Action;

/// The full activity trail, newest first. Administrators only.
pub async fn get(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult<Value> {
    authorize(&user, Action::ViewActivityLogs.allowed_roles())?;

    let window = Pagination::resolve(query, &state.config.pagination);
    let (logs, total) = state.reports.activity().list(window).await?;

    Ok(ApiResponse::success(json!({
        "logs": logs,
        "pagination": window.summary(total),
    })))
}
