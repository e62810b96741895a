use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Entry handed to the activity store; the timestamp is assigned on insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActivityEntry {
    pub user_id: i64,
    pub office: String,
    pub operation: String,
    pub record_series_title_description: Option<String>,
    pub details: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ActivityLogView {
    pub id: i64,
    pub user_id: i64,
    pub office: String,
    pub operation: String,
    pub action_date_time: DateTime<Utc>,
    pub record_series_title_description: Option<String>,
    pub details: Option<String>,
    pub full_name: Option<String>,
}
