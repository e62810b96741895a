/// Shared types used across the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account roles. Serialized with the labels the front end and the
/// `users.role` column use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserRole {
    #[serde(rename = "Admin")]
    Administrator,
    #[serde(rename = "Departmental Record Custodian")]
    Custodian,
    #[serde(rename = "Staff")]
    Staff,
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl UserRole {
    pub const ALL: [UserRole; 3] = [UserRole::Administrator, UserRole::Custodian, UserRole::Staff];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Administrator => "Admin",
            UserRole::Custodian => "Departmental Record Custodian",
            UserRole::Staff => "Staff",
        }
    }

    /// Whether this role sees every department's records.
    pub fn sees_all_departments(&self) -> bool {
        match self {
            UserRole::Administrator => true,
            UserRole::Custodian | UserRole::Staff => false,
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Admin" => Ok(UserRole::Administrator),
            "Departmental Record Custodian" => Ok(UserRole::Custodian),
            "Staff" => Ok(UserRole::Staff),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

// Lets sqlx decode the TEXT column straight into the enum (`#[sqlx(try_from = "String")]`)
impl TryFrom<String> for UserRole {
    type Error = UnknownRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Access request lifecycle. `Pending` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown request status: {0}")]
pub struct UnknownStatus(pub String);

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "Pending",
            RequestStatus::Approved => "Approved",
            RequestStatus::Rejected => "Rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        match self {
            RequestStatus::Pending => false,
            RequestStatus::Approved | RequestStatus::Rejected => true,
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(RequestStatus::Pending),
            "Approved" => Ok(RequestStatus::Approved),
            "Rejected" => Ok(RequestStatus::Rejected),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl TryFrom<String> for RequestStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Endpoint-level operations that carry a fixed role requirement.
///
/// Adding a role or an action forces every arm below to be revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ViewRecords,
    CreateRecord,
    UpdateRecord,
    DeleteRecord,
    UploadFile,
    DeleteFile,
    ViewFiles,
    CreateRequest,
    ViewRequests,
    ProcessRequest,
    ViewDashboard,
    ViewActivityLogs,
}

const EVERYONE: &[UserRole] = &[UserRole::Administrator, UserRole::Custodian, UserRole::Staff];
const EDITORS: &[UserRole] = &[UserRole::Administrator, UserRole::Custodian];
const ADMINISTRATORS: &[UserRole] = &[UserRole::Administrator];

impl Action {
    pub fn allowed_roles(&self) -> &'static [UserRole] {
        match self {
            Action::ViewRecords
            | Action::ViewFiles
            | Action::CreateRequest
            | Action::ViewRequests
            | Action::ViewDashboard => EVERYONE,
            Action::CreateRecord | Action::UpdateRecord | Action::UploadFile | Action::DeleteFile => EDITORS,
            Action::DeleteRecord | Action::ProcessRequest | Action::ViewActivityLogs => ADMINISTRATORS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_labels_round_trip_through_serde() {
        let json = serde_json::to_string(&UserRole::Custodian).unwrap();
        assert_eq!(json, "\"Departmental Record Custodian\"");
        let parsed: UserRole = serde_json::from_str("\"Admin\"").unwrap();
        assert_eq!(parsed, UserRole::Administrator);
        assert!("Root".parse::<UserRole>().is_err());
    }

    #[test]
    fn only_pending_is_open() {
        assert!(!RequestStatus::Pending.is_terminal());
        assert!(RequestStatus::Approved.is_terminal());
        assert!(RequestStatus::Rejected.is_terminal());
    }

    #[test]
    fn deletion_and_processing_are_admin_only() {
        assert_eq!(Action::DeleteRecord.allowed_roles(), &[UserRole::Administrator]);
        assert_eq!(Action::ProcessRequest.allowed_roles(), &[UserRole::Administrator]);
        assert!(!Action::UpdateRecord.allowed_roles().contains(&UserRole::Staff));
        assert_eq!(Action::ViewRecords.allowed_roles().len(), UserRole::ALL.len());
    }
}
