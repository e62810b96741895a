use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::types::UserRole;

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub school_id: String,
    pub password_hash: String,
    pub full_name: String,
    pub email: String,
    #[sqlx(try_from = "String")]
    pub role: UserRole,
    pub department_id: Option<i64>,
    pub profile_picture_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Account details safe to hand back to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub school_id: String,
    pub full_name: String,
    pub email: String,
    pub role: UserRole,
    pub department_id: Option<i64>,
    pub profile_picture_url: Option<String>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            school_id: user.school_id.clone(),
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            role: user.role,
            department_id: user.department_id,
            profile_picture_url: user.profile_picture_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserProfile {
    pub id: i64,
    pub school_id: String,
    pub full_name: String,
    pub email: String,
    #[sqlx(try_from = "String")]
    pub role: UserRole,
    pub department_id: Option<i64>,
    pub department_name: Option<String>,
    pub profile_picture_url: Option<String>,
}
