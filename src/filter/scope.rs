use sqlx::{Postgres, QueryBuilder};

use crate::types::UserRole;

/// Which departments a caller may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepartmentScope {
    /// Administrator without a department filter
    All,
    Only(i64),
    /// Non-administrator without a department: sees nothing
    Unassigned,
}

impl DepartmentScope {
    /// Administrators may narrow to `requested`; everyone else is pinned to
    /// their own department whatever they ask for.
    pub fn for_user(role: UserRole, own_department: Option<i64>, requested: Option<i64>) -> Self {
        if role.sees_all_departments() {
            return requested.map_or(DepartmentScope::All, DepartmentScope::Only);
        }
        own_department.map_or(DepartmentScope::Unassigned, DepartmentScope::Only)
    }

    pub fn permits(&self, department_id: i64) -> bool {
        match self {
            DepartmentScope::All => true,
            DepartmentScope::Only(id) => *id == department_id,
            DepartmentScope::Unassigned => false,
        }
    }

    /// Append ` AND <column> = $n` (or nothing, or a false predicate).
    pub fn push_condition(&self, qb: &mut QueryBuilder<'_, Postgres>, column: &str) {
        match self {
            DepartmentScope::All => {}
            DepartmentScope::Only(id) => {
                qb.push(" AND ").push(column).push(" = ").push_bind(*id);
            }
            DepartmentScope::Unassigned => {
                qb.push(" AND FALSE");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn administrators_see_everything_unless_they_filter() {
        assert_eq!(DepartmentScope::for_user(UserRole::Administrator, Some(2), None), DepartmentScope::All);
        assert_eq!(
            DepartmentScope::for_user(UserRole::Administrator, None, Some(5)),
            DepartmentScope::Only(5)
        );
    }

    #[test]
    fn others_are_pinned_to_their_department() {
        for role in [UserRole::Custodian, UserRole::Staff] {
            assert_eq!(DepartmentScope::for_user(role, Some(2), Some(9)), DepartmentScope::Only(2));
            assert_eq!(DepartmentScope::for_user(role, None, Some(9)), DepartmentScope::Unassigned);
        }
    }

    #[test]
    fn permits_matches_scope() {
        assert!(DepartmentScope::All.permits(3));
        assert!(DepartmentScope::Only(3).permits(3));
        assert!(!DepartmentScope::Only(3).permits(4));
        assert!(!DepartmentScope::Unassigned.permits(3));
    }

    #[test]
    fn conditions_render_into_sql() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM records r WHERE TRUE");
        DepartmentScope::Only(7).push_condition(&mut qb, "r.department_id");
        assert_eq!(qb.sql(), "SELECT 1 FROM records r WHERE TRUE AND r.department_id = $1");

        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM records r WHERE TRUE");
        DepartmentScope::Unassigned.push_condition(&mut qb, "r.department_id");
        assert!(qb.sql().ends_with("AND FALSE"));

        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM records r WHERE TRUE");
        DepartmentScope::All.push_condition(&mut qb, "r.department_id");
        assert_eq!(qb.sql(), "SELECT 1 FROM records r WHERE TRUE");
    }
}
