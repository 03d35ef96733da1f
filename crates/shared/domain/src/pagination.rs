//! List query and page types for user listings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{DEFAULT_PAGE_NUMBER, DEFAULT_PAGE_SIZE};

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Column a user listing can be ordered by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum UserOrderField {
    #[default]
    CreatedAt,
    LastSeenAt,
    DeviceId,
}

/// Ordering of a user listing; `id` breaks ties in the same direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserOrder {
    pub field: UserOrderField,
    pub direction: SortDirection,
}

/// Row filter shared by the page fetch and the total count
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub device_id: Option<String>,
    pub display_name_contains: Option<String>,
    /// Inclusive lower bound on `last_seen_at`
    pub seen_since: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `last_seen_at`
    pub seen_before: Option<DateTime<Utc>>,
}

/// Offset/cursor list query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListUsersQuery {
    pub skip: Option<u64>,
    pub take: Option<u64>,
    /// Start the page at this user (inclusive), before `skip` applies
    pub cursor: Option<Uuid>,
    pub filter: UserFilter,
    pub order_by: UserOrder,
}

impl ListUsersQuery {
    /// Rows to skip
    pub fn offset(&self) -> u64 {
        self.skip.unwrap_or(0)
    }

    /// Rows to fetch
    pub fn page_size(&self) -> u64 {
        self.take.unwrap_or(DEFAULT_PAGE_SIZE)
    }

    /// 1-based page number derived from `skip` and the page size
    pub fn page(&self) -> u64 {
        match self.skip {
            Some(skip) => skip
                .checked_div(self.page_size())
                .map_or(DEFAULT_PAGE_NUMBER, |p| p + 1),
            None => DEFAULT_PAGE_NUMBER,
        }
    }
}

/// Page of results with metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(
    feature = "openapi",
    derive(utoipa::ToSchema),
    aliases(UserPage = Page<crate::user::UserSummary>)
)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PageMeta {
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    /// Assemble a page from fetched rows, an independently counted total and the query
    pub fn new(data: Vec<T>, total: u64, query: &ListUsersQuery) -> Self {
        let page_size = query.page_size();
        let total_pages = if page_size > 0 {
            total.div_ceil(page_size)
        } else {
            0
        };

        Self {
            data,
            meta: PageMeta {
                total,
                page: query.page(),
                page_size,
                total_pages,
            },
        }
    }
}
