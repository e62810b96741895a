use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RecordFile {
    pub id: i64,
    pub record_id: i64,
    pub file_name: String,
    pub file_path: String,
    pub file_type: String,
    pub file_size_bytes: i64,
    pub uploaded_by_user_id: i64,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RecordFileView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub file: RecordFile,
    pub uploaded_by_name: Option<String>,
}
