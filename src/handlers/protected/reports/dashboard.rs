// handlers/protected/reports/dashboard.rs - GET /reports/dashboard

use axum::{extract::State, Json};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{authorize, AuthUser};
use crate::services::DashboardStats;
use crate::types::Action;

pub async fn get(State(state): State<AppState>, user: AuthUser) -> Result<Json<DashboardStats>, ApiError> {
    authorize(&user, Action::ViewDashboard.allowed_roles())?;

    let stats = state.reports.dashboard(user.scope(None)).await?;
    Ok(Json(stats))
}
