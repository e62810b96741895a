use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::types::RequestStatus;

/// Access request joined with record title and participant names
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DocumentRequestView {
    pub id: i64,
    pub record_id: i64,
    pub requester_user_id: i64,
    pub purpose: String,
    pub requester_id_image_path: String,
    #[sqlx(try_from = "String")]
    pub status: RequestStatus,
    pub approver_user_id: Option<i64>,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub record_series_title_description: Option<String>,
    pub requester_name: Option<String>,
    pub approver_name: Option<String>,
}
