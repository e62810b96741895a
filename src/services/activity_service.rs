use async_trait::async_trait;
use sqlx::PgPool;

use crate::database::models::{ActivityLogView, NewActivityEntry};
use crate::database::DatabaseError;
use crate::filter::{DepartmentScope, Pagination};
use crate::middleware::audit::{ActivityStore, NO_DEPARTMENT_OFFICE, UNKNOWN_OFFICE};

const ACTIVITY_SELECT: &str = "SELECT al.id, al.user_id, al.office, al.operation, al.action_date_time,
        al.record_series_title_description, al.details, u.full_name
 FROM activity_logs al
 LEFT JOIN users u ON al.user_id = u.id";

/// Office label from the actor lookup: `None` means no such user,
/// `Some(None)` a user without a department.
pub fn office_label(lookup: Option<Option<String>>) -> String {
    match lookup {
        None => UNKNOWN_OFFICE.to_string(),
        Some(None) => NO_DEPARTMENT_OFFICE.to_string(),
        Some(Some(name)) => name,
    }
}

/// Activity log backed by the `activity_logs` table
#[derive(Clone)]
pub struct PgActivityStore {
    pool: PgPool,
}

impl PgActivityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Newest first, with the total count.
    pub async fn list(&self, window: Pagination) -> Result<(Vec<ActivityLogView>, i64), DatabaseError> {
        let logs = sqlx::query_as::<_, ActivityLogView>(&format!(
            "{} ORDER BY al.action_date_time DESC, al.id DESC LIMIT $1 OFFSET $2",
            ACTIVITY_SELECT
        ))
        .bind(window.limit)
        .bind(window.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM activity_logs")
            .fetch_one(&self.pool)
            .await?;

        Ok((logs, total))
    }

    /// Latest entries by actors in the scoped departments.
    pub async fn recent(&self, scope: DepartmentScope, limit: i64) -> Result<Vec<ActivityLogView>, DatabaseError> {
        let mut qb = sqlx::QueryBuilder::<sqlx::Postgres>::new(ACTIVITY_SELECT);
        qb.push(" WHERE TRUE");
        match scope {
            DepartmentScope::All => {}
            DepartmentScope::Only(department_id) => {
                qb.push(" AND al.user_id IN (SELECT id FROM users WHERE department_id = ")
                    .push_bind(department_id)
                    .push(")");
            }
            DepartmentScope::Unassigned => {
                qb.push(" AND FALSE");
            }
        }
        qb.push(" ORDER BY al.action_date_time DESC, al.id DESC LIMIT ").push_bind(limit);

        Ok(qb.build_query_as::<ActivityLogView>().fetch_all(&self.pool).await?)
    }
}

#[async_trait]
impl ActivityStore for PgActivityStore {
    async fn office_label(&self, user_id: i64) -> Result<String, DatabaseError> {
        let lookup: Option<Option<String>> = sqlx::query_scalar(
            "SELECT d.name FROM users u LEFT JOIN departments d ON u.department_id = d.id WHERE u.id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(office_label(lookup))
    }

    async fn append(&self, entry: NewActivityEntry) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO activity_logs (user_id, office, operation, record_series_title_description, details)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(entry.user_id)
        .bind(&entry.office)
        .bind(&entry.operation)
        .bind(&entry.record_series_title_description)
        .bind(&entry.details)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn office_label_fallbacks() {
        assert_eq!(office_label(None), "Unknown");
        assert_eq!(office_label(Some(None)), "Admin Office");
        assert_eq!(office_label(Some(Some("Registrar".to_string()))), "Registrar");
    }
}
