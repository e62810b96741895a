//! Query-shaping primitives shared by the listing endpoints.

pub mod pagination;
pub mod scope;

pub use pagination::{PageQuery, PageSummary, Pagination};
pub use scope::DepartmentScope;

/// Wrap a user search term for `ILIKE`, escaping the pattern metacharacters.
pub fn contains_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcards_in_search_terms_are_literal() {
        assert_eq!(contains_pattern("payroll"), "%payroll%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(contains_pattern(r"a\b"), r"%a\\b%");
    }
}
