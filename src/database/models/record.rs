use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Record {
    pub id: i64,
    pub record_series_title_description: String,
    pub period_covered: Option<String>,
    pub volume: Option<String>,
    pub record_medium: Option<String>,
    pub restrictions: Option<String>,
    pub location: Option<String>,
    pub frequency_of_use: Option<String>,
    pub duplication: Option<String>,
    pub time_value: Option<String>,
    pub utility_value: Option<String>,
    pub retention_period_active: Option<String>,
    pub retention_period_storage: Option<String>,
    pub retention_period_total: Option<String>,
    pub disposition_provision: Option<String>,
    pub date_of_record: Option<NaiveDate>,
    pub calculated_disposal_date: Option<NaiveDate>,
    pub department_id: i64,
    pub created_by_user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Record joined with its department and creator names
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RecordView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub record: Record,
    pub department_name: Option<String>,
    pub created_by_name: Option<String>,
}

/// Descriptive fields accepted on create and update
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordInput {
    pub record_series_title_description: Option<String>,
    pub period_covered: Option<String>,
    pub volume: Option<String>,
    pub record_medium: Option<String>,
    pub restrictions: Option<String>,
    pub location: Option<String>,
    pub frequency_of_use: Option<String>,
    pub duplication: Option<String>,
    pub time_value: Option<String>,
    pub utility_value: Option<String>,
    pub retention_period_active: Option<String>,
    pub retention_period_storage: Option<String>,
    pub retention_period_total: Option<String>,
    pub disposition_provision: Option<String>,
    pub date_of_record: Option<NaiveDate>,
    pub calculated_disposal_date: Option<NaiveDate>,
    pub department_id: Option<i64>,
}

impl RecordInput {
    /// Trimmed title, if one was supplied and is not blank.
    pub fn title(&self) -> Option<&str> {
        self.record_series_title_description
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.title().is_none() {
            return Err("Record series title is required".to_string());
        }
        if let Some(tv) = self.time_value.as_deref() {
            if tv != "T" && tv != "P" {
                return Err("time_value must be 'T' or 'P'".to_string());
            }
        }
        Ok(())
    }
}
