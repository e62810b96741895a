// handlers/protected/records/reminders.rs - GET /records/disposal-reminders

use axum::extract::State;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::extract::ApiQuery;
use crate::middleware::{authorize, ApiResponse, ApiResult, AuthUser};
use crate::types::Action;

#[derive(Debug, Default, Deserialize)]
pub struct ReminderQuery {
    pub days: Option<i64>,
}

pub async fn get(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<ReminderQuery>,
) -> ApiResult<Value> {
    authorize(&user, Action::ViewRecords.allowed_roles())?;

    let records = state.records.disposal_reminders(user.scope(None), query.days).await?;
    Ok(ApiResponse::success(json!({ "records": records })))
}
