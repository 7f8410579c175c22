//! Pagination descriptors and page records

use crate::{EditorError, Result};
use serde::Serialize;

/// Largest page a caller may request
pub const MAX_PAGE_SIZE: u32 = 100;

/// Sort direction for paginated listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl std::str::FromStr for SortDirection {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "ASC" => Ok(SortDirection::Asc),
            "DESC" => Ok(SortDirection::Desc),
            _ => Err(EditorError::ValidationError(format!(
                "Invalid sort direction '{s}', expected ASC or DESC"
            ))),
        }
    }
}

/// Content fields a listing may be ordered by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    Id,
    Title,
    Status,
    #[default]
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    /// Column name in the `contents` table
    pub fn column(&self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Title => "title",
            SortField::Status => "status",
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
        }
    }
}

impl std::str::FromStr for SortField {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "id" => Ok(SortField::Id),
            "title" => Ok(SortField::Title),
            "status" => Ok(SortField::Status),
            "createdAt" => Ok(SortField::CreatedAt),
            "updatedAt" => Ok(SortField::UpdatedAt),
            _ => Err(EditorError::ValidationError(format!(
                "Invalid sort field '{s}', expected one of id, title, status, createdAt, updatedAt"
            ))),
        }
    }
}

/// Page descriptor: zero-based page index, page size, and ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    size: u32,
    sort: SortField,
    direction: SortDirection,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: 10,
            sort: SortField::default(),
            direction: SortDirection::default(),
        }
    }
}

impl PageRequest {
    /// Build a descriptor, rejecting sizes outside `1..=MAX_PAGE_SIZE`
    pub fn new(page: u32, size: u32, sort: SortField, direction: SortDirection) -> Result<Self> {
        if size == 0 || size > MAX_PAGE_SIZE {
            return Err(EditorError::ValidationError(format!(
                "Page size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        Ok(Self {
            page,
            size,
            sort,
            direction,
        })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn sort(&self) -> SortField {
        self.sort
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page) * i64::from(self.size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }
}

/// One page of a listing plus totals over the whole result set
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_elements: u64,
    pub total_pages: u32,
    pub page: u32,
    pub size: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_elements: u64, request: &PageRequest) -> Self {
        let size = u64::from(request.size());
        let total_pages = total_elements.div_ceil(size);
        Self {
            items,
            total_elements,
            total_pages: u32::try_from(total_pages).unwrap_or(u32::MAX),
            page: request.page(),
            size: request.size(),
        }
    }

    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_elements: self.total_elements,
            total_pages: self.total_pages,
            page: self.page,
            size: self.size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_defaults_match_listing_defaults() {
        let request = PageRequest::default();
        assert_eq!(request.page(), 0);
        assert_eq!(request.size(), 10);
        assert_eq!(request.sort(), SortField::CreatedAt);
        assert_eq!(request.direction(), SortDirection::Desc);
    }

    #[test]
    fn test_size_bounds() {
        assert!(PageRequest::new(0, 0, SortField::Id, SortDirection::Asc).is_err());
        assert!(PageRequest::new(0, 101, SortField::Id, SortDirection::Asc).is_err());
        assert!(PageRequest::new(0, 1, SortField::Id, SortDirection::Asc).is_ok());
        assert!(PageRequest::new(0, 100, SortField::Id, SortDirection::Asc).is_ok());
    }

    #[test]
    fn test_direction_parse_is_case_insensitive() {
        assert_eq!("asc".parse::<SortDirection>().unwrap(), SortDirection::Asc);
        assert_eq!("DESC".parse::<SortDirection>().unwrap(), SortDirection::Desc);
        assert!("sideways".parse::<SortDirection>().is_err());
    }

    #[test]
    fn test_sort_field_whitelist() {
        assert_eq!("createdAt".parse::<SortField>().unwrap().column(), "created_at");
        assert_eq!("title".parse::<SortField>().unwrap().column(), "title");
        assert!("password".parse::<SortField>().is_err());
        assert!("title; DROP TABLE users".parse::<SortField>().is_err());
    }

    #[test]
    fn test_partial_last_page() {
        let request = PageRequest::new(1, 10, SortField::CreatedAt, SortDirection::Desc).unwrap();
        let page = Page::new(vec![1, 2, 3, 4, 5], 15, &request);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.page, 1);
        assert_eq!(request.offset(), 10);
    }

    #[test]
    fn test_empty_result_has_no_pages() {
        let page: Page<i32> = Page::new(vec![], 0, &PageRequest::default());
        assert_eq!(page.total_pages, 0);
        assert_eq!(page.total_elements, 0);
    }

    #[test]
    fn test_page_serializes_camel_case() {
        let page = Page::new(vec!["a"], 1, &PageRequest::default());
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["totalElements"], 1);
        assert_eq!(json["totalPages"], 1);
        assert_eq!(json["items"][0], "a");
    }

    proptest! {
        #[test]
        fn prop_pages_cover_result_set(total in 0u64..500, size in 1u32..=MAX_PAGE_SIZE) {
            let first = PageRequest::new(0, size, SortField::Id, SortDirection::Asc).unwrap();
            let pages = Page::<()>::new(vec![], total, &first).total_pages;

            let mut covered = 0u64;
            for index in 0..pages {
                let request = PageRequest::new(index, size, SortField::Id, SortDirection::Asc).unwrap();
                let remaining = total.saturating_sub(request.offset() as u64);
                covered += remaining.min(u64::from(size));
            }

            prop_assert_eq!(covered, total);
            if pages > 0 {
                let last_offset = u64::from(pages - 1) * u64::from(size);
                prop_assert!(last_offset < total);
            }
        }
    }
}
