use serde::{Deserialize, Serialize};

use crate::config::PaginationConfig;

/// `?page=&limit=` as sent by clients
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// A resolved page window. `page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageSummary {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub pages: i64,
}

impl Pagination {
    /// Clamp the requested window: page to at least 1, limit into `1..=max_limit`.
    pub fn resolve(query: PageQuery, config: &PaginationConfig) -> Self {
        let max = config.max_limit.max(1);
        let limit = query.limit.unwrap_or(config.default_limit).clamp(1, max);
        let page = query.page.unwrap_or(1).max(1);
        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn summary(&self, total: i64) -> PageSummary {
        PageSummary {
            total,
            page: self.page,
            limit: self.limit,
            pages: (total + self.limit - 1) / self.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PaginationConfig {
        PaginationConfig {
            default_limit: 50,
            max_limit: 100,
        }
    }

    #[test]
    fn defaults_and_clamping() {
        let p = Pagination::resolve(PageQuery::default(), &config());
        assert_eq!(p, Pagination { page: 1, limit: 50 });

        let p = Pagination::resolve(PageQuery { page: Some(0), limit: Some(5000) }, &config());
        assert_eq!(p, Pagination { page: 1, limit: 100 });

        let p = Pagination::resolve(PageQuery { page: Some(-3), limit: Some(0) }, &config());
        assert_eq!(p, Pagination { page: 1, limit: 1 });
    }

    #[test]
    fn last_page_holds_the_remainder() {
        for total in [1_i64, 9, 10, 11, 57, 100] {
            let first = Pagination { page: 1, limit: 10 };
            let pages = first.summary(total).pages;
            assert_eq!(pages, (total as f64 / 10.0).ceil() as i64);

            let last = Pagination { page: pages, limit: 10 };
            let remaining = total - last.offset();
            let expected = if total % 10 == 0 { 10 } else { total % 10 };
            assert_eq!(remaining.min(last.limit), expected);
        }
    }

    #[test]
    fn empty_listing_has_no_pages() {
        let summary = Pagination { page: 1, limit: 10 }.summary(0);
        assert_eq!(summary.pages, 0);
        assert_eq!(summary.total, 0);
    }
}
