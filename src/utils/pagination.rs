// src/utils/pagination.rs

use serde::Deserialize;

use crate::error::AppError;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// `?page=&limit=` query parameters (page is 1-indexed).
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Validated page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64) -> Result<Self, AppError> {
        if page < 1 {
            return Err(AppError::BadRequest("invalid query param page".to_string()));
        }
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(AppError::BadRequest("invalid query param limit".to_string()));
        }
        Ok(Self { page, limit })
    }

    /// Number of rows to skip: `page * limit - limit`.
    pub fn skip(&self) -> i64 {
        self.page * self.limit - self.limit
    }

    /// `ceil(total / limit)`.
    pub fn no_of_pages(&self, total: i64) -> i64 {
        if total <= 0 {
            return 0;
        }
        (total + self.limit - 1) / self.limit
    }
}

impl TryFrom<PageParams> for Pagination {
    type Error = AppError;

    fn try_from(params: PageParams) -> Result<Self, Self::Error> {
        Pagination::new(
            params.page.unwrap_or(DEFAULT_PAGE),
            params.limit.unwrap_or(DEFAULT_LIMIT),
        )
    }
}
