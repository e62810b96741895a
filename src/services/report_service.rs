use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use super::activity_service::PgActivityStore;
use crate::database::models::ActivityLogView;
use crate::database::DatabaseError;
use crate::filter::DepartmentScope;

const RECENT_ACTIVITY_LIMIT: i64 = 10;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DepartmentCount {
    pub name: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MediumCount {
    pub record_medium: Option<String>,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_records: i64,
    pub records_by_department: Vec<DepartmentCount>,
    pub records_by_medium: Vec<MediumCount>,
    pub pending_requests: i64,
    pub recent_activity: Vec<ActivityLogView>,
}

/// Read-only dashboard aggregates
#[derive(Clone)]
pub struct ReportService {
    pool: PgPool,
    activity: PgActivityStore,
}

impl ReportService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            activity: PgActivityStore::new(pool.clone()),
            pool,
        }
    }

    pub fn activity(&self) -> &PgActivityStore {
        &self.activity
    }

    pub async fn dashboard(&self, scope: DepartmentScope) -> Result<DashboardStats, DatabaseError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM records r WHERE TRUE");
        scope.push_condition(&mut qb, "r.department_id");
        let total_records: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;

        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT d.name, COUNT(r.id) AS count
             FROM departments d
             LEFT JOIN records r ON d.id = r.department_id
             WHERE TRUE",
        );
        scope.push_condition(&mut qb, "d.id");
        qb.push(" GROUP BY d.id, d.name ORDER BY d.name");
        let records_by_department = qb.build_query_as::<DepartmentCount>().fetch_all(&self.pool).await?;

        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT r.record_medium, COUNT(*) AS count FROM records r WHERE TRUE",
        );
        scope.push_condition(&mut qb, "r.department_id");
        qb.push(" GROUP BY r.record_medium ORDER BY count DESC");
        let records_by_medium = qb.build_query_as::<MediumCount>().fetch_all(&self.pool).await?;

        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM document_requests dr
             JOIN records r ON r.id = dr.record_id
             WHERE dr.status = 'Pending'",
        );
        scope.push_condition(&mut qb, "r.department_id");
        let pending_requests: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;

        let recent_activity = self.activity.recent(scope, RECENT_ACTIVITY_LIMIT).await?;

        Ok(DashboardStats {
            total_records,
            records_by_department,
            records_by_medium,
            pending_requests,
            recent_activity,
        })
    }
}
