use chrono::{Duration, NaiveDate, Utc};
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use thiserror::Error;

use crate::database::models::{Record, RecordInput, RecordView};
use crate::database::DatabaseError;
use crate::filter::{contains_pattern, DepartmentScope, Pagination};
use crate::middleware::AuthUser;
use crate::types::UserRole;

const RECORD_VIEW_SELECT: &str = "SELECT r.*, d.name AS department_name, u.full_name AS created_by_name
 FROM records r
 LEFT JOIN departments d ON r.department_id = d.id
 LEFT JOIN users u ON r.created_by_user_id = u.id";

const DEFAULT_REMINDER_DAYS: i64 = 30;
const MAX_REMINDER_DAYS: i64 = 36_500;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("{0}")]
    Invalid(String),

    /// Absent, or outside the caller's departments
    #[error("Record not found")]
    NotFound,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for RecordError {
    fn from(err: sqlx::Error) -> Self {
        RecordError::Database(DatabaseError::Sqlx(err))
    }
}

/// Department a new record lands in: an Administrator may pick any,
/// everyone else is bound to their own.
pub fn owning_department(user: &AuthUser, requested: Option<i64>) -> Result<i64, RecordError> {
    let chosen = match (user.role, requested) {
        (UserRole::Administrator, Some(requested)) => Some(requested),
        _ => user.department_id,
    };
    chosen.ok_or_else(|| RecordError::Invalid("Department ID is required".to_string()))
}

/// Last disposal date covered by a reminder window of `days` from `today`.
pub fn reminder_cutoff(today: NaiveDate, days: Option<i64>) -> NaiveDate {
    let days = days.unwrap_or(DEFAULT_REMINDER_DAYS).clamp(0, MAX_REMINDER_DAYS);
    today + Duration::days(days)
}

// Binds the sixteen descriptive columns in table order
fn bind_descriptive(
    query: Query<'_, Postgres, PgArguments>,
    title: String,
    input: RecordInput,
) -> Query<'_, Postgres, PgArguments> {
    query
        .bind(title)
        .bind(input.period_covered)
        .bind(input.volume)
        .bind(input.record_medium)
        .bind(input.restrictions)
        .bind(input.location)
        .bind(input.frequency_of_use)
        .bind(input.duplication)
        .bind(input.time_value)
        .bind(input.utility_value)
        .bind(input.retention_period_active)
        .bind(input.retention_period_storage)
        .bind(input.retention_period_total)
        .bind(input.disposition_provision)
        .bind(input.date_of_record)
        .bind(input.calculated_disposal_date)
}

fn validated_title(input: &RecordInput) -> Result<String, RecordError> {
    input.validate().map_err(RecordError::Invalid)?;
    input
        .title()
        .map(str::to_string)
        .ok_or_else(|| RecordError::Invalid("Record series title is required".to_string()))
}

/// Department-scoped CRUD over `records`
#[derive(Clone)]
pub struct RecordStore {
    pool: PgPool,
}

impl RecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user: &AuthUser, input: RecordInput) -> Result<i64, RecordError> {
        let title = validated_title(&input)?;
        let department_id = owning_department(user, input.department_id)?;

        let known: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM departments WHERE id = $1)")
            .bind(department_id)
            .fetch_one(&self.pool)
            .await?;
        if !known {
            return Err(RecordError::Invalid("Department not found".to_string()));
        }

        let insert = sqlx::query(
            "INSERT INTO records (
                record_series_title_description, period_covered, volume, record_medium,
                restrictions, location, frequency_of_use, duplication, time_value,
                utility_value, retention_period_active, retention_period_storage,
                retention_period_total, disposition_provision, date_of_record,
                calculated_disposal_date, department_id, created_by_user_id
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
             RETURNING id",
        );
        let row = bind_descriptive(insert, title, input)
            .bind(department_id)
            .bind(user.user_id)
            .fetch_one(&self.pool)
            .await?;
        let id: i64 = row.try_get("id")?;

        tracing::info!("Record {} created by user {}", id, user.user_id);
        Ok(id)
    }

    /// Newest first, with the total matching count.
    pub async fn list(
        &self,
        scope: DepartmentScope,
        search: Option<&str>,
        window: Pagination,
    ) -> Result<(Vec<RecordView>, i64), RecordError> {
        let search = search.map(str::trim).filter(|s| !s.is_empty());

        let mut qb = QueryBuilder::<Postgres>::new(RECORD_VIEW_SELECT);
        qb.push(" WHERE TRUE");
        push_filters(&mut qb, scope, search);
        qb.push(" ORDER BY r.created_at DESC, r.id DESC LIMIT ")
            .push_bind(window.limit)
            .push(" OFFSET ")
            .push_bind(window.offset());
        let records = qb.build_query_as::<RecordView>().fetch_all(&self.pool).await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM records r WHERE TRUE");
        push_filters(&mut count, scope, search);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        Ok((records, total))
    }

    pub async fn get(&self, scope: DepartmentScope, id: i64) -> Result<RecordView, RecordError> {
        let mut qb = QueryBuilder::<Postgres>::new(RECORD_VIEW_SELECT);
        qb.push(" WHERE r.id = ").push_bind(id);
        scope.push_condition(&mut qb, "r.department_id");
        qb.build_query_as::<RecordView>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RecordError::NotFound)
    }

    /// The bare record if it exists and is visible under `scope`.
    pub async fn find_scoped(&self, scope: DepartmentScope, id: i64) -> Result<Option<Record>, RecordError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM records r WHERE r.id = ");
        qb.push_bind(id);
        scope.push_condition(&mut qb, "r.department_id");
        Ok(qb.build_query_as::<Record>().fetch_optional(&self.pool).await?)
    }

    /// Replace every descriptive field. The visibility check and the write are
    /// separate statements; a concurrent delete in between makes the write a no-op.
    pub async fn update(
        &self,
        user: &AuthUser,
        scope: DepartmentScope,
        id: i64,
        input: RecordInput,
    ) -> Result<(), RecordError> {
        let title = validated_title(&input)?;
        if self.find_scoped(scope, id).await?.is_none() {
            return Err(RecordError::NotFound);
        }

        let update = sqlx::query(
            "UPDATE records SET
                record_series_title_description = $1, period_covered = $2, volume = $3,
                record_medium = $4, restrictions = $5, location = $6, frequency_of_use = $7,
                duplication = $8, time_value = $9, utility_value = $10,
                retention_period_active = $11, retention_period_storage = $12,
                retention_period_total = $13, disposition_provision = $14,
                date_of_record = $15, calculated_disposal_date = $16, updated_at = NOW()
             WHERE id = $17",
        );
        let result = bind_descriptive(update, title, input).bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            tracing::warn!("Record {} vanished before update by user {}", id, user.user_id);
        }

        tracing::info!("Record {} updated by user {}", id, user.user_id);
        Ok(())
    }

    /// Existence check followed by the delete, with the same race as `update`.
    pub async fn delete(&self, user: &AuthUser, id: i64) -> Result<(), RecordError> {
        if self.find_scoped(DepartmentScope::All, id).await?.is_none() {
            return Err(RecordError::NotFound);
        }

        sqlx::query("DELETE FROM records WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        tracing::info!("Record {} deleted by user {}", id, user.user_id);
        Ok(())
    }

    /// Records due for disposal within `days` (default 30), earliest first.
    pub async fn disposal_reminders(
        &self,
        scope: DepartmentScope,
        days: Option<i64>,
    ) -> Result<Vec<RecordView>, RecordError> {
        let cutoff = reminder_cutoff(Utc::now().date_naive(), days);

        let mut qb = QueryBuilder::<Postgres>::new(RECORD_VIEW_SELECT);
        qb.push(" WHERE r.calculated_disposal_date IS NOT NULL AND r.calculated_disposal_date <= ")
            .push_bind(cutoff);
        scope.push_condition(&mut qb, "r.department_id");
        qb.push(" ORDER BY r.calculated_disposal_date ASC, r.id ASC");

        Ok(qb.build_query_as::<RecordView>().fetch_all(&self.pool).await?)
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, scope: DepartmentScope, search: Option<&str>) {
    scope.push_condition(qb, "r.department_id");
    if let Some(term) = search {
        qb.push(" AND r.record_series_title_description ILIKE ")
            .push_bind(contains_pattern(term));
    }
}
