//! Pagination and filter helpers shared by every list endpoint.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Raw `page` / `limit` query parameters as they arrive on the wire.
///
/// Kept as text so a blank or non-numeric value falls back to the default
/// instead of failing the whole query string.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default)]
    pub limit: Option<String>,
}

impl PageParams {
    pub fn new(page: Option<&str>, limit: Option<&str>) -> Self {
        Self {
            page: page.map(str::to_string),
            limit: limit.map(str::to_string),
        }
    }
}

/// A validated page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn from_params(params: &PageParams, default_limit: i64) -> Self {
        Self::new(
            number_param(params.page.as_deref()).unwrap_or(1),
            number_param(params.limit.as_deref()).unwrap_or(default_limit),
        )
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// Pagination metadata returned alongside every list payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

impl PageMeta {
    pub fn new(request: PageRequest, total: i64) -> Self {
        let total = total.max(0);
        Self {
            page: request.page,
            limit: request.limit,
            total,
            pages: page_count(total, request.limit),
        }
    }
}

pub fn page_count(total: i64, limit: i64) -> i64 {
    if limit <= 0 || total <= 0 {
        return 0;
    }
    (total + limit - 1) / limit
}

#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: PageMeta,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, request: PageRequest, total: i64) -> Self {
        Self {
            data,
            pagination: PageMeta::new(request, total),
        }
    }

    /// Slice an already filtered and ordered collection down to one page.
    pub fn from_full(items: Vec<T>, request: PageRequest) -> Self {
        let total = items.len() as i64;
        let data = items
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.limit as usize)
            .collect();
        Self::new(data, request, total)
    }
}

/// Normalizes an optional filter value: blank strings and `all` mean no filter.
pub fn filter_value(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
        .map(str::to_string)
}

fn number_param(value: Option<&str>) -> Option<i64> {
    filter_value(value)?.parse().ok()
}

/// Builds an `ILIKE` pattern for a case-insensitive substring match.
pub fn like_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for ch in search.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

/// `filter_value` followed by `like_pattern`, for optional search parameters.
pub fn search_pattern(value: Option<&str>) -> Option<String> {
    filter_value(value).map(|v| like_pattern(&v))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(page_count(23, 8), 3);
        assert_eq!(page_count(24, 8), 3);
        assert_eq!(page_count(25, 8), 4);
        assert_eq!(page_count(0, 8), 0);
    }

    #[test]
    fn page_meta_reports_pages() {
        let meta = PageMeta::new(PageRequest::new(2, 8), 23);
        assert_eq!(
            meta,
            PageMeta {
                page: 2,
                limit: 8,
                total: 23,
                pages: 3
            }
        );
    }

    #[test]
    fn page_request_clamps_inputs() {
        let request =
            PageRequest::from_params(&PageParams::new(Some("0"), Some("1000")), DEFAULT_PAGE_SIZE);
        assert_eq!(request.page, 1);
        assert_eq!(request.limit, MAX_PAGE_SIZE);
        assert_eq!(request.offset(), 0);

        let request = PageRequest::from_params(&PageParams::default(), 8);
        assert_eq!(request.limit, 8);
        assert_eq!(PageRequest::new(3, 8).offset(), 16);
    }

    #[test]
    fn blank_or_garbled_page_params_use_defaults() {
        let request = PageRequest::from_params(&PageParams::new(Some(""), Some("ten")), 8);
        assert_eq!(request, PageRequest::new(1, 8));

        let request = PageRequest::from_params(&PageParams::new(Some(" 3 "), Some("all")), 8);
        assert_eq!(request, PageRequest::new(3, 8));
    }

    #[test]
    fn from_full_slices_requested_page() {
        let items: Vec<i32> = (1..=23).collect();
        let page = Paginated::from_full(items, PageRequest::new(3, 8));
        assert_eq!(page.data, vec![17, 18, 19, 20, 21, 22, 23]);
        assert_eq!(page.pagination.total, 23);
        assert_eq!(page.pagination.pages, 3);

        let past_end = Paginated::from_full(vec![1, 2], PageRequest::new(5, 8));
        assert!(past_end.data.is_empty());
        assert_eq!(past_end.pagination.total, 2);
    }

    #[test]
    fn filter_value_ignores_blank_and_all() {
        assert_eq!(filter_value(Some("  ")), None);
        assert_eq!(filter_value(Some("All")), None);
        assert_eq!(filter_value(None), None);
        assert_eq!(
            filter_value(Some(" Compass Tools ")),
            Some("Compass Tools".to_string())
        );
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(search_pattern(Some("river")), Some("%river%".to_string()));
    }
}
