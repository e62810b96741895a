use serde::Deserialize;
use sqlx::PgPool;

use crate::database::models::{User, UserProfile, UserSummary};
use crate::database::DatabaseError;
use crate::types::UserRole;

const MIN_PASSWORD_LEN: usize = 6;

/// Registration body. Fields are optional so that missing ones are reported
/// as validation errors instead of extractor rejections.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationInput {
    pub school_id: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub department_id: Option<i64>,
}

/// Registration input after validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub school_id: String,
    pub password: String,
    pub full_name: String,
    pub email: String,
    pub role: UserRole,
    pub department_id: Option<i64>,
}

impl RegistrationInput {
    pub fn validate(self) -> Result<NewUser, String> {
        let school_id = required(self.school_id, "School ID is required")?;
        let password = self.password.unwrap_or_default();
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(format!("Password must be at least {} characters", MIN_PASSWORD_LEN));
        }
        let full_name = required(self.full_name, "Full name is required")?;
        let email = required(self.email, "Email is required")?;
        if !is_well_formed_email(&email) {
            return Err("Valid email is required".to_string());
        }
        let role = self
            .role
            .as_deref()
            .ok_or_else(|| "Role is required".to_string())?
            .parse::<UserRole>()
            .map_err(|_| "Invalid role".to_string())?;

        Ok(NewUser {
            school_id,
            password,
            full_name,
            email: email.to_lowercase(),
            role,
            department_id: self.department_id,
        })
    }
}

fn required(value: Option<String>, message: &str) -> Result<String, String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| message.to_string())
}

pub fn is_well_formed_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .map(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
            .unwrap_or(false)
}

/// Account lookups and inserts on `users`
#[derive(Clone)]
pub struct UserStore {
    pool: PgPool,
}

impl UserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_school_id(&self, school_id: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE school_id = $1")
            .bind(school_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn profile(&self, user_id: i64) -> Result<UserProfile, DatabaseError> {
        sqlx::query_as::<_, UserProfile>(
            "SELECT u.id, u.school_id, u.full_name, u.email, u.role, u.department_id,
                    d.name AS department_name, u.profile_picture_url
             FROM users u
             LEFT JOIN departments d ON u.department_id = d.id
             WHERE u.id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("User not found".to_string()))
    }

    pub async fn department_exists(&self, department_id: i64) -> Result<bool, DatabaseError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM departments WHERE id = $1)")
            .bind(department_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// Insert a new account. The password must already be hashed.
    pub async fn create(&self, user: &NewUser, password_hash: &str) -> Result<UserSummary, DatabaseError> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE school_id = $1 OR email = $2)",
        )
        .bind(&user.school_id)
        .bind(&user.email)
        .fetch_one(&self.pool)
        .await?;
        if taken {
            return Err(DatabaseError::Conflict("User already exists".to_string()));
        }

        if let Some(department_id) = user.department_id {
            if !self.department_exists(department_id).await? {
                return Err(DatabaseError::NotFound("Department not found".to_string()));
            }
        }

        let created = sqlx::query_as::<_, User>(
            "INSERT INTO users (school_id, password_hash, full_name, email, role, department_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(&user.school_id)
        .bind(password_hash)
        .bind(&user.full_name)
        .bind(&user.email)
        .bind(user.role.as_str())
        .bind(user.department_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_write(e, "User already exists"))?;

        tracing::info!("User registered: {} ({})", created.school_id, created.role);
        Ok(UserSummary::from(&created))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> RegistrationInput {
        RegistrationInput {
            school_id: Some(" 2022-00007 ".to_string()),
            password: Some("abc123".to_string()),
            full_name: Some("Lea Santos".to_string()),
            email: Some("Lea.Santos@Example.edu".to_string()),
            role: Some("Staff".to_string()),
            department_id: Some(4),
        }
    }

    #[test]
    fn valid_registration_is_normalized() {
        let user = input().validate().unwrap();
        assert_eq!(user.school_id, "2022-00007");
        assert_eq!(user.email, "lea.santos@example.edu");
        assert_eq!(user.role, UserRole::Staff);
    }

    #[test]
    fn short_password_is_rejected() {
        let mut i = input();
        i.password = Some("abc12".to_string());
        assert!(i.validate().unwrap_err().contains("at least 6"));
    }

    #[test]
    fn unknown_role_is_rejected() {
        let mut i = input();
        i.role = Some("Superuser".to_string());
        assert_eq!(i.validate().unwrap_err(), "Invalid role");
    }

    #[test]
    fn missing_identifier_is_rejected() {
        let mut i = input();
        i.school_id = Some("   ".to_string());
        assert_eq!(i.validate().unwrap_err(), "School ID is required");
    }

    #[test]
    fn email_shape() {
        assert!(is_well_formed_email("a@b.co"));
        assert!(!is_well_formed_email("a@b"));
        assert!(!is_well_formed_email("@b.co"));
        assert!(!is_well_formed_email("a b@c.de"));
        assert!(!is_well_formed_email("a@@b.co"));
        assert!(!is_well_formed_email("a@.co"));
    }
}
