//! List filters and pagination for the team, project and job panels.
//!
//! Filters serialize straight into the backend query string (camelCase keys,
//! absent options omitted, id lists comma-joined).

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

use crate::types::{Hhmm, RecordId};

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// Default rows per page.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Maximum rows per page.
pub const MAX_PAGE_SIZE: u32 = 200;

/// Page numbers are 1-based.
pub const FIRST_PAGE: u32 = 1;

/// Clamp a page size into `1..=MAX_PAGE_SIZE`.
pub fn clamp_page_size(size: u32) -> u32 {
    size.clamp(1, MAX_PAGE_SIZE)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page_number: u32,
    pub page_size: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page_number: FIRST_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    pub fn new(page_number: u32, page_size: u32) -> Self {
        Self {
            page_number: page_number.max(FIRST_PAGE),
            page_size: clamp_page_size(page_size),
        }
    }

    /// Number of pages needed for `total_items` (at least one).
    pub fn total_pages(&self, total_items: u64) -> u32 {
        let size = u64::from(self.page_size.max(1));
        let pages = total_items.div_ceil(size).max(1);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    /// Zero-based index of the first row on this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page_number.saturating_sub(1)) * u64::from(self.page_size)
    }

    pub fn with_page(self, page_number: u32) -> Self {
        Self::new(page_number, self.page_size)
    }
}

/// Filters that carry a page position.
pub trait Paged {
    fn pagination(&self) -> Pagination;
    fn set_pagination(&mut self, pagination: Pagination);
}

// ---------------------------------------------------------------------------
// Search text
// ---------------------------------------------------------------------------

/// Trim search box input; blank input means no text filter.
pub fn normalize_search(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn join_ids<S: Serializer>(ids: &[RecordId], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ids.join(","))
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Query of `GET /team`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamFilter {
    #[serde(
        rename = "region",
        serialize_with = "join_ids",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub region_ids: Vec<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub page_number: u32,
    pub page_size: u32,
}

impl TeamFilter {
    /// First page of teams active in the given window.
    pub fn window(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        let page = Pagination::default();
        Self {
            region_ids: Vec::new(),
            name: None,
            start_date,
            end_date,
            page_number: page.page_number,
            page_size: page.page_size,
        }
    }

    pub fn with_regions(mut self, region_ids: Vec<RecordId>) -> Self {
        self.region_ids = region_ids;
        self
    }

    pub fn with_name(mut self, text: &str) -> Self {
        self.name = normalize_search(text);
        self
    }
}

impl Paged for TeamFilter {
    fn pagination(&self) -> Pagination {
        Pagination::new(self.page_number, self.page_size)
    }

    fn set_pagination(&mut self, pagination: Pagination) {
        self.page_number = pagination.page_number;
        self.page_size = pagination.page_size;
    }
}

/// Query of `GET /project`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        rename = "region",
        serialize_with = "join_ids",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub region_ids: Vec<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub page_number: u32,
    pub page_size: u32,
}

impl Default for ProjectFilter {
    fn default() -> Self {
        let page = Pagination::default();
        Self {
            name: None,
            region_ids: Vec::new(),
            status: None,
            page_number: page.page_number,
            page_size: page.page_size,
        }
    }
}

impl Paged for ProjectFilter {
    fn pagination(&self) -> Pagination {
        Pagination::new(self.page_number, self.page_size)
    }

    fn set_pagination(&mut self, pagination: Pagination) {
        self.page_number = pagination.page_number;
        self.page_size = pagination.page_size;
    }
}

/// Query of `GET /job`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    pub page_number: u32,
    pub page_size: u32,
}

impl Default for JobFilter {
    fn default() -> Self {
        let page = Pagination::default();
        Self {
            name: None,
            project_id: None,
            status: None,
            start_date: None,
            end_date: None,
            page_number: page.page_number,
            page_size: page.page_size,
        }
    }
}

impl Paged for JobFilter {
    fn pagination(&self) -> Pagination {
        Pagination::new(self.page_number, self.page_size)
    }

    fn set_pagination(&mut self, pagination: Pagination) {
        self.page_number = pagination.page_number;
        self.page_size = pagination.page_size;
    }
}

/// Query of `GET /resource`: resources available in a window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceQuery {
    #[serde(serialize_with = "join_ids", skip_serializing_if = "Vec::is_empty")]
    pub region_ids: Vec<RecordId>,
    pub start_date: NaiveDate,
    pub start_time: Hhmm,
    pub end_date: NaiveDate,
    pub end_time: Hhmm,
}

/// Query of `GET /teamResource/suggestion`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionQuery {
    pub team_id: RecordId,
    pub requirement_id: RecordId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Query of `GET /genericQuery`, the shared lookup/autocomplete endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupQuery {
    #[serde(rename = "sObjectType")]
    pub object_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(serialize_with = "join_ids", skip_serializing_if = "Vec::is_empty")]
    pub account_ids: Vec<RecordId>,
    #[serde(serialize_with = "join_ids", skip_serializing_if = "Vec::is_empty")]
    pub region_ids: Vec<RecordId>,
}

impl LookupQuery {
    pub fn new(object_type: impl Into<String>, text: &str) -> Self {
        Self {
            object_type: object_type.into(),
            name: normalize_search(text),
            account_ids: Vec::new(),
            region_ids: Vec::new(),
        }
    }
}
