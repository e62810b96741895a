use serde::Deserialize;
use sqlx::{PgPool, Postgres, QueryBuilder};
use thiserror::Error;

use crate::database::models::DocumentRequestView;
use crate::database::DatabaseError;
use crate::filter::Pagination;
use crate::middleware::AuthUser;
use crate::types::{RequestStatus, UserRole};

const REQUEST_VIEW_SELECT: &str = "SELECT dr.*, r.record_series_title_description,
        u1.full_name AS requester_name, u2.full_name AS approver_name
 FROM document_requests dr
 LEFT JOIN records r ON dr.record_id = r.id
 LEFT JOIN users u1 ON dr.requester_user_id = u1.id
 LEFT JOIN users u2 ON dr.approver_user_id = u2.id";

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("{0}")]
    Invalid(String),

    #[error("Status must be Approved or Rejected")]
    InvalidStatus(String),

    #[error("Request not found")]
    NotFound,

    #[error("Record not found")]
    RecordNotFound,

    #[error("Request has already been {0}")]
    AlreadyProcessed(RequestStatus),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for WorkflowError {
    fn from(err: sqlx::Error) -> Self {
        WorkflowError::Database(DatabaseError::Sqlx(err))
    }
}

/// Only the two terminal states are valid decisions.
pub fn parse_decision(raw: Option<&str>) -> Result<RequestStatus, WorkflowError> {
    let raw = raw.unwrap_or_default();
    match raw.parse::<RequestStatus>() {
        Ok(status) if status.is_terminal() => Ok(status),
        _ => Err(WorkflowError::InvalidStatus(raw.to_string())),
    }
}

/// Pending moves to the decision; a terminal state moves nowhere.
pub fn transition(current: RequestStatus, decision: RequestStatus) -> Result<RequestStatus, WorkflowError> {
    if current.is_terminal() {
        return Err(WorkflowError::AlreadyProcessed(current));
    }
    if !decision.is_terminal() {
        return Err(WorkflowError::InvalidStatus(decision.to_string()));
    }
    Ok(decision)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateRequestInput {
    pub record_id: Option<i64>,
    pub purpose: Option<String>,
    pub requester_id_image_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRequest {
    pub record_id: i64,
    pub purpose: String,
    pub requester_id_image_path: String,
}

impl CreateRequestInput {
    pub fn validate(self) -> Result<NewRequest, WorkflowError> {
        let record_id = self
            .record_id
            .ok_or_else(|| WorkflowError::Invalid("Record ID is required".to_string()))?;
        let purpose = non_blank(self.purpose)
            .ok_or_else(|| WorkflowError::Invalid("Purpose is required".to_string()))?;
        let requester_id_image_path = non_blank(self.requester_id_image_path)
            .ok_or_else(|| WorkflowError::Invalid("Requester ID image is required".to_string()))?;
        Ok(NewRequest {
            record_id,
            purpose,
            requester_id_image_path,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProcessRequestInput {
    pub status: Option<String>,
    pub remarks: Option<String>,
}

/// Access requests and their Pending -> Approved/Rejected lifecycle
#[derive(Clone)]
pub struct RequestWorkflow {
    pool: PgPool,
}

impl RequestWorkflow {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user: &AuthUser, input: CreateRequestInput) -> Result<i64, WorkflowError> {
        let request = input.validate()?;

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM records WHERE id = $1)")
            .bind(request.record_id)
            .fetch_one(&self.pool)
            .await?;
        if !exists {
            return Err(WorkflowError::RecordNotFound);
        }

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO document_requests (record_id, requester_user_id, purpose, requester_id_image_path, status)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id",
        )
        .bind(request.record_id)
        .bind(user.user_id)
        .bind(&request.purpose)
        .bind(&request.requester_id_image_path)
        .bind(RequestStatus::Pending.as_str())
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("Document request {} created by user {}", id, user.user_id);
        Ok(id)
    }

    /// Staff see only their own requests; everyone else sees all of them.
    pub async fn list(
        &self,
        user: &AuthUser,
        status: Option<&str>,
        window: Pagination,
    ) -> Result<(Vec<DocumentRequestView>, i64), WorkflowError> {
        let status = match status.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => Some(
                raw.parse::<RequestStatus>()
                    .map_err(|_| WorkflowError::Invalid(format!("Invalid status filter: {}", raw)))?,
            ),
            None => None,
        };
        let requester = match user.role {
            UserRole::Staff => Some(user.user_id),
            UserRole::Administrator | UserRole::Custodian => None,
        };

        let mut qb = QueryBuilder::<Postgres>::new(REQUEST_VIEW_SELECT);
        qb.push(" WHERE TRUE");
        push_filters(&mut qb, requester, status);
        qb.push(" ORDER BY dr.created_at DESC, dr.id DESC LIMIT ")
            .push_bind(window.limit)
            .push(" OFFSET ")
            .push_bind(window.offset());
        let requests = qb.build_query_as::<DocumentRequestView>().fetch_all(&self.pool).await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM document_requests dr WHERE TRUE");
        push_filters(&mut count, requester, status);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        Ok((requests, total))
    }

    /// Record the decision, the approver and the remarks in one conditional
    /// update that only matches a Pending request.
    pub async fn process(
        &self,
        user: &AuthUser,
        id: i64,
        input: ProcessRequestInput,
    ) -> Result<RequestStatus, WorkflowError> {
        let decision = parse_decision(input.status.as_deref())?;
        let remarks = input.remarks.map(|r| r.trim().to_string()).filter(|r| !r.is_empty());

        let updated = sqlx::query(
            "UPDATE document_requests
             SET status = $1, approver_user_id = $2, remarks = $3, updated_at = NOW()
             WHERE id = $4 AND status = 'Pending'",
        )
        .bind(decision.as_str())
        .bind(user.user_id)
        .bind(&remarks)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            let current: Option<String> = sqlx::query_scalar("SELECT status FROM document_requests WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
            let current = current.ok_or(WorkflowError::NotFound)?;
            let current = current
                .parse::<RequestStatus>()
                .map_err(|e| WorkflowError::Invalid(e.to_string()))?;
            transition(current, decision)?;
            return Err(WorkflowError::Invalid("Request could not be processed".to_string()));
        }

        tracing::info!("Request {} {} by user {}", id, decision, user.user_id);
        Ok(decision)
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, requester: Option<i64>, status: Option<RequestStatus>) {
    if let Some(requester) = requester {
        qb.push(" AND dr.requester_user_id = ").push_bind(requester);
    }
    if let Some(status) = status {
        qb.push(" AND dr.status = ").push_bind(status.as_str());
    }
}
