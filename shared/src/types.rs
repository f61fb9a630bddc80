//! Common types used across the platform

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Pagination parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
        }
    }
}

impl Pagination {
    /// Build from optional query values, clamping to `1..=max_per_page`
    pub fn from_query(page: Option<u32>, per_page: Option<u32>, max_per_page: u32) -> Self {
        let default = Self::default();
        Self {
            page: page.unwrap_or(default.page).max(1),
            per_page: per_page
                .unwrap_or(default.per_page)
                .clamp(1, max_per_page.max(1)),
        }
    }

    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }

    pub fn offset(&self) -> i64 {
        (self.page.saturating_sub(1) as i64) * self.per_page as i64
    }
}

/// Paginated response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, pagination: Pagination, total_items: u64) -> Self {
        Self {
            data,
            pagination: PaginationMeta::new(pagination, total_items),
        }
    }
}

/// Pagination metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

impl PaginationMeta {
    pub fn new(pagination: Pagination, total_items: u64) -> Self {
        let per_page = pagination.per_page.max(1) as u64;
        Self {
            page: pagination.page,
            per_page: pagination.per_page,
            total_items,
            total_pages: total_items.div_ceil(per_page) as u32,
        }
    }
}

/// Inclusive calendar date range; either end may be open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self, &'static str> {
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err("Start date must not be after end date");
            }
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_offsets() {
        let p = Pagination::from_query(Some(3), Some(20), 100);
        assert_eq!(p.offset(), 40);
        assert_eq!(p.limit(), 20);
    }

    #[test]
    fn pagination_is_clamped() {
        let p = Pagination::from_query(Some(0), Some(1000), 100);
        assert_eq!(p.page, 1);
        assert_eq!(p.per_page, 100);
    }

    #[test]
    fn total_pages_rounds_up() {
        let meta = PaginationMeta::new(Pagination::default(), 41);
        assert_eq!(meta.total_pages, 3);
        assert_eq!(PaginationMeta::new(Pagination::default(), 0).total_pages, 0);
    }

    #[test]
    fn date_range_is_inclusive() {
        let d = |day| NaiveDate::from_ymd_opt(2024, 5, day).unwrap();
        let range = DateRange::new(Some(d(1)), Some(d(7))).unwrap();
        assert!(range.contains(d(1)));
        assert!(range.contains(d(7)));
        assert!(!range.contains(d(8)));
        assert!(DateRange::new(Some(d(7)), Some(d(1))).is_err());
    }
}
