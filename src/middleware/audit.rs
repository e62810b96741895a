//! Activity recording for successful, authenticated requests.
//!
//! The recorder runs after the handler has produced its response and hands
//! the write to a detached task, so storage trouble never reaches the caller.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body, HttpBody},
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, Method},
    middleware::Next,
    response::Response,
};
use serde_json::Value;

use super::auth::AuthUser;
use crate::database::models::NewActivityEntry;
use crate::database::DatabaseError;

/// Body field carrying the subject title of record operations
pub const SUBJECT_FIELD: &str = "record_series_title_description";

/// Largest JSON body buffered to look for the subject title
const MAX_INSPECTED_BODY: usize = 2 * 1024 * 1024;

/// Durable sink for activity entries
#[async_trait]
pub trait ActivityStore: Send + Sync {
    /// Office label for the acting user.
    async fn office_label(&self, user_id: i64) -> Result<String, DatabaseError>;

    async fn append(&self, entry: NewActivityEntry) -> Result<(), DatabaseError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOperation {
    Login,
    Logout,
    CreateRecord,
    UpdateRecord,
    DeleteRecord,
    ViewRecord,
    UploadFile,
    CreateRequest,
    ProcessRequest,
}

impl AuditOperation {
    pub fn label(&self) -> &'static str {
        match self {
            AuditOperation::Login => "Login",
            AuditOperation::Logout => "Logout",
            AuditOperation::CreateRecord => "Create Record",
            AuditOperation::UpdateRecord => "Update Record",
            AuditOperation::DeleteRecord => "Delete Record",
            AuditOperation::ViewRecord => "View Record",
            AuditOperation::UploadFile => "Upload File",
            AuditOperation::CreateRequest => "Create Request",
            AuditOperation::ProcessRequest => "Process Request",
        }
    }
}

enum PathRule {
    Contains(&'static str),
    /// `/records/{id}` with a numeric id, so listing helpers are not counted as views
    SingleRecord,
}

impl PathRule {
    fn matches(&self, path: &str) -> bool {
        match self {
            PathRule::Contains(fragment) => path.contains(fragment),
            PathRule::SingleRecord => path
                .split_once("/records/")
                .map(|(_, rest)| {
                    let id = rest.trim_end_matches('/');
                    !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit())
                })
                .unwrap_or(false),
        }
    }
}

fn classification_rules() -> [(Method, PathRule, AuditOperation); 9] {
    [
        (Method::POST, PathRule::Contains("/auth/login"), AuditOperation::Login),
        (Method::POST, PathRule::Contains("/auth/logout"), AuditOperation::Logout),
        (Method::POST, PathRule::Contains("/records"), AuditOperation::CreateRecord),
        (Method::PUT, PathRule::Contains("/records"), AuditOperation::UpdateRecord),
        (Method::DELETE, PathRule::Contains("/records"), AuditOperation::DeleteRecord),
        (Method::GET, PathRule::SingleRecord, AuditOperation::ViewRecord),
        (Method::POST, PathRule::Contains("/files"), AuditOperation::UploadFile),
        (Method::POST, PathRule::Contains("/requests"), AuditOperation::CreateRequest),
        (Method::PUT, PathRule::Contains("/requests"), AuditOperation::ProcessRequest),
    ]
}

/// Map a request to its operation; first matching row wins.
pub fn classify_operation(method: &Method, path: &str) -> Option<AuditOperation> {
    classification_rules()
        .into_iter()
        .find(|(m, rule, _)| m == method && rule.matches(path))
        .map(|(_, _, op)| op)
}

/// Global middleware that appends an activity entry after a 2xx response
/// from an authenticated caller.
pub async fn record_activity(
    State(store): State<Arc<dyn ActivityStore>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(operation) = classify_operation(request.method(), request.uri().path()) else {
        return next.run(request).await;
    };

    let details = format!("IP: {}", client_address(&request));

    // Unknown or oversized bodies pass through unread
    let (request, subject) = if is_json(request.headers()) && fits_inspection(request.body()) {
        let (parts, body) = request.into_parts();
        match to_bytes(body, MAX_INSPECTED_BODY).await {
            Ok(bytes) => {
                let subject = subject_title(&bytes);
                (Request::from_parts(parts, Body::from(bytes)), subject)
            }
            Err(e) => {
                tracing::warn!("Could not buffer {} body for auditing: {}", operation.label(), e);
                (Request::from_parts(parts, Body::empty()), None)
            }
        }
    } else {
        (request, None)
    };

    let response = next.run(request).await;

    if !response.status().is_success() {
        return response;
    }
    let Some(user) = response.extensions().get::<AuthUser>().cloned() else {
        return response;
    };

    tokio::spawn(async move {
        let office = match store.office_label(user.user_id).await {
            Ok(office) => office,
            Err(e) => {
                tracing::warn!("Could not resolve office for user {}: {}", user.user_id, e);
                UNKNOWN_OFFICE.to_string()
            }
        };
        let entry = NewActivityEntry {
            user_id: user.user_id,
            office,
            operation: operation.label().to_string(),
            record_series_title_description: subject,
            details: Some(details),
        };
        if let Err(e) = store.append(entry).await {
            tracing::error!("Failed to record activity {}: {}", operation.label(), e);
        }
    });

    response
}

/// Label for an actor without a department
pub const NO_DEPARTMENT_OFFICE: &str = "Admin Office";
/// Label when the actor's account cannot be found
pub const UNKNOWN_OFFICE: &str = "Unknown";

fn fits_inspection(body: &Body) -> bool {
    matches!(body.size_hint().upper(), Some(len) if len <= MAX_INSPECTED_BODY as u64)
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("application/json"))
        .unwrap_or(false)
}

fn subject_title(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<Value>(body)
        .ok()?
        .get(SUBJECT_FIELD)?
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub(crate) fn client_address(request: &Request) -> String {
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}
