//! Paging and sorting for list operations.
//!
//! List inputs differ per entity, so the resolver inspects capabilities
//! (`PagedInput`, `SortedInput`) instead of concrete types and always yields a
//! deterministic ordering.

use configs::PagingConfig;
use serde::{Deserialize, Serialize};

use crate::domain::Entity;
use crate::errors::ServiceError;

pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Largest row offset or page size a storage backend is asked for. SQL
/// backends bind `LIMIT`/`OFFSET` as signed 64-bit integers.
pub const MAX_ROW_SPAN: u64 = i64::MAX as u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOrder {
    pub property: String,
    pub direction: Direction,
}

/// Ordered list of sort orders; earlier entries take precedence.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    orders: Vec<SortOrder>,
}

impl Sort {
    pub fn unsorted() -> Self { Self::default() }

    pub fn by(direction: Direction, property: impl Into<String>) -> Self {
        Self::unsorted().and(direction, property)
    }

    pub fn and(mut self, direction: Direction, property: impl Into<String>) -> Self {
        self.orders.push(SortOrder { property: property.into(), direction });
        self
    }

    pub fn orders(&self) -> &[SortOrder] { &self.orders }

    pub fn is_empty(&self) -> bool { self.orders.is_empty() }

    pub fn contains(&self, property: &str) -> bool {
        self.orders.iter().any(|o| o.property == property)
    }

    /// Parse `"name desc, created_at"`: comma-separated properties, each with
    /// an optional `asc`/`desc` (default `asc`). Blank text is unsorted.
    pub fn parse(text: &str) -> Result<Self, ServiceError> {
        let mut sort = Self::unsorted();
        if text.trim().is_empty() {
            return Ok(sort);
        }
        for segment in text.split(',') {
            let mut parts = segment.split_whitespace();
            let property = parts
                .next()
                .ok_or_else(|| ServiceError::validation(format!("empty sort segment in '{}'", text)))?;
            if !property.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.') {
                return Err(ServiceError::validation(format!("invalid sort property '{}'", property)));
            }
            let direction = match parts.next() {
                None => Direction::Asc,
                Some(d) => Direction::parse(d)
                    .ok_or_else(|| ServiceError::validation(format!("invalid sort direction '{}'", d)))?,
            };
            if parts.next().is_some() {
                return Err(ServiceError::validation(format!("malformed sort segment '{}'", segment.trim())));
            }
            sort = sort.and(direction, property);
        }
        Ok(sort)
    }

    /// Optional sort text as carried by list inputs. Missing or blank text
    /// means no particular order.
    pub fn from_text(text: Option<&str>) -> Result<Option<Self>, ServiceError> {
        match text {
            Some(text) => Self::parse(text).map(|s| if s.is_empty() { None } else { Some(s) }),
            None => Ok(None),
        }
    }
}

/// One page of a list query: zero-based page index, page size and ordering.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page_index: u64,
    pub page_size: u64,
    pub sort: Sort,
}

impl PageRequest {
    pub fn offset(&self) -> u64 { self.page_index.saturating_mul(self.page_size) }
}

/// A page of results plus the total number of matches across all pages.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page_index: u64,
    pub page_size: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, request: &PageRequest) -> Self {
        Self { items, total, page_index: request.page_index, page_size: request.page_size }
    }

    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 { 0 } else { self.total.div_ceil(self.page_size) }
    }

    pub fn has_next(&self) -> bool { self.page_index.saturating_add(1) < self.total_pages() }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page_index: self.page_index,
            page_size: self.page_size,
        }
    }
}

/// Capability: the list input carries explicit paging fields.
pub trait PagedInput {
    fn page_index(&self) -> u64;
    fn page_size(&self) -> u64;
}

/// Capability: the list input can describe an ordering.
pub trait SortedInput {
    /// `Ok(None)` means the caller asked for no particular order.
    fn build_sort(&self) -> Result<Option<Sort>, ServiceError>;
}

/// Query parameters for a list call. Inputs opt into paging and sorting by
/// returning themselves from the matching accessor.
pub trait ListInput {
    fn as_paged(&self) -> Option<&dyn PagedInput> { None }
    fn as_sorted(&self) -> Option<&dyn SortedInput> { None }
}

impl ListInput for () {}

/// Paging-only list input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagedResultRequest {
    pub page_index: u64,
    pub page_size: u64,
}

impl Default for PagedResultRequest {
    fn default() -> Self { Self { page_index: 0, page_size: DEFAULT_PAGE_SIZE } }
}

impl PagedInput for PagedResultRequest {
    fn page_index(&self) -> u64 { self.page_index }
    fn page_size(&self) -> u64 { self.page_size }
}

impl ListInput for PagedResultRequest {
    fn as_paged(&self) -> Option<&dyn PagedInput> { Some(self) }
}

/// Paged list input with an optional textual sort, e.g. `"name desc"`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagedAndSortedResultRequest {
    pub page_index: u64,
    pub page_size: u64,
    pub sorting: Option<String>,
}

impl Default for PagedAndSortedResultRequest {
    fn default() -> Self { Self { page_index: 0, page_size: DEFAULT_PAGE_SIZE, sorting: None } }
}

impl PagedInput for PagedAndSortedResultRequest {
    fn page_index(&self) -> u64 { self.page_index }
    fn page_size(&self) -> u64 { self.page_size }
}

impl SortedInput for PagedAndSortedResultRequest {
    fn build_sort(&self) -> Result<Option<Sort>, ServiceError> { Sort::from_text(self.sorting.as_deref()) }
}

impl ListInput for PagedAndSortedResultRequest {
    fn as_paged(&self) -> Option<&dyn PagedInput> { Some(self) }
    fn as_sorted(&self) -> Option<&dyn SortedInput> { Some(self) }
}

/// Turns any list input into a `PageRequest`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageResolver {
    default_page_size: u64,
    max_page_size: Option<u64>,
}

impl Default for PageResolver {
    fn default() -> Self { Self { default_page_size: DEFAULT_PAGE_SIZE, max_page_size: None } }
}

impl From<&PagingConfig> for PageResolver {
    fn from(cfg: &PagingConfig) -> Self { Self::new(cfg.default_page_size, cfg.max_page_size) }
}

impl PageResolver {
    pub fn new(default_page_size: u64, max_page_size: Option<u64>) -> Self {
        Self { default_page_size: default_page_size.max(1), max_page_size }
    }

    /// Resolution order:
    /// 1. page 0 with the default size;
    /// 2. paging fields of a `PagedInput` replace the defaults;
    /// 3. the ordering of a `SortedInput`, if it builds one;
    /// 4. otherwise descending by `E::KEY_FIELD`.
    ///
    /// An explicit ordering that does not mention the key gets the key
    /// (descending) appended so that ties never reorder between pages.
    pub fn resolve<E, L>(&self, input: &L) -> Result<PageRequest, ServiceError>
    where
        E: Entity,
        L: ListInput + ?Sized,
    {
        let (page_index, mut page_size) = match input.as_paged() {
            Some(paged) => (paged.page_index(), paged.page_size()),
            None => (0, self.default_page_size),
        };
        if page_size == 0 {
            return Err(ServiceError::validation("page size must be at least 1"));
        }
        if let Some(max) = self.max_page_size {
            page_size = page_size.min(max);
        }
        if page_size > MAX_ROW_SPAN {
            return Err(ServiceError::validation(format!("page size must be at most {}", MAX_ROW_SPAN)));
        }
        match page_index.checked_mul(page_size) {
            Some(offset) if offset <= MAX_ROW_SPAN => {}
            _ => {
                return Err(ServiceError::validation(format!(
                    "page {} of size {} starts beyond the last addressable row",
                    page_index, page_size
                )))
            }
        }

        let sort = match input.as_sorted() {
            Some(sorted) => sorted.build_sort()?,
            None => None,
        };
        let sort = match sort {
            Some(s) if s.is_empty() => Sort::by(Direction::Desc, E::KEY_FIELD),
            Some(s) if !s.contains(E::KEY_FIELD) => s.and(Direction::Desc, E::KEY_FIELD),
            Some(s) => s,
            None => Sort::by(Direction::Desc, E::KEY_FIELD),
        };

        Ok(PageRequest { page_index, page_size, sort })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Doc {
        id: u32,
    }

    impl Entity for Doc {
        type Key = u32;
        const NAME: &'static str = "doc";
        fn key(&self) -> &u32 { &self.id }
    }

    struct SortOnly(&'static str);

    impl SortedInput for SortOnly {
        fn build_sort(&self) -> Result<Option<Sort>, ServiceError> { Sort::parse(self.0).map(Some) }
    }

    impl ListInput for SortOnly {
        fn as_sorted(&self) -> Option<&dyn SortedInput> { Some(self) }
    }

    #[test]
    fn input_without_capabilities_gets_defaults() {
        let req = PageResolver::default().resolve::<Doc, _>(&()).unwrap();
        assert_eq!(req.page_index, 0);
        assert_eq!(req.page_size, 10);
        assert_eq!(req.offset(), 0);
        assert_eq!(req.sort, Sort::by(Direction::Desc, "id"));
    }

    #[test]
    fn paged_input_overrides_defaults_and_keeps_default_sort() {
        let input = PagedResultRequest { page_index: 3, page_size: 7 };
        let req = PageResolver::default().resolve::<Doc, _>(&input).unwrap();
        assert_eq!((req.page_index, req.page_size, req.offset()), (3, 7, 21));
        assert_eq!(req.sort, Sort::by(Direction::Desc, "id"));
    }

    #[test]
    fn sorted_input_without_paging_uses_default_size() {
        let req = PageResolver::default().resolve::<Doc, _>(&SortOnly("id asc")).unwrap();
        assert_eq!(req.page_size, 10);
        assert_eq!(req.sort, Sort::by(Direction::Asc, "id"));
    }

    #[test]
    fn explicit_sort_gets_key_tie_breaker() {
        let input = PagedAndSortedResultRequest { sorting: Some("name desc".into()), ..Default::default() };
        let req = PageResolver::default().resolve::<Doc, _>(&input).unwrap();
        assert_eq!(req.sort, Sort::by(Direction::Desc, "name").and(Direction::Desc, "id"));
    }

    #[test]
    fn blank_sorting_falls_back_to_key_desc() {
        let input = PagedAndSortedResultRequest { sorting: Some("  ".into()), ..Default::default() };
        let req = PageResolver::default().resolve::<Doc, _>(&input).unwrap();
        assert_eq!(req.sort, Sort::by(Direction::Desc, "id"));
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let input = PagedResultRequest { page_index: 0, page_size: 0 };
        let err = PageResolver::default().resolve::<Doc, _>(&input).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn configured_maximum_clamps_page_size() {
        let cfg = PagingConfig { default_page_size: 20, max_page_size: Some(50) };
        let resolver = PageResolver::from(&cfg);
        assert_eq!(resolver.resolve::<Doc, _>(&()).unwrap().page_size, 20);
        let input = PagedResultRequest { page_index: 0, page_size: 1000 };
        assert_eq!(resolver.resolve::<Doc, _>(&input).unwrap().page_size, 50);
    }

    #[test]
    fn unaddressable_pages_are_rejected() {
        let resolver = PageResolver::default();
        for (page_index, page_size) in [(0, u64::MAX), (0, MAX_ROW_SPAN + 1), (u64::MAX / 2, 10), (u64::MAX, 1)] {
            let input = PagedResultRequest { page_index, page_size };
            let err = resolver.resolve::<Doc, _>(&input).unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)), "{page_index} x {page_size}");
        }

        let last = PagedResultRequest { page_index: MAX_ROW_SPAN, page_size: 1 };
        assert_eq!(resolver.resolve::<Doc, _>(&last).unwrap().offset(), MAX_ROW_SPAN);
    }

    #[test]
    fn oversized_request_is_fine_when_the_maximum_clamps_it() {
        let resolver = PageResolver::new(10, Some(100));
        let input = PagedResultRequest { page_index: 2, page_size: u64::MAX };
        let req = resolver.resolve::<Doc, _>(&input).unwrap();
        assert_eq!((req.page_size, req.offset()), (100, 200));
    }

    #[test]
    fn from_text_treats_blank_as_unsorted() {
        assert_eq!(Sort::from_text(None).unwrap(), None);
        assert_eq!(Sort::from_text(Some(" ")).unwrap(), None);
        assert_eq!(Sort::from_text(Some("name")).unwrap(), Some(Sort::by(Direction::Asc, "name")));
        assert!(Sort::from_text(Some("name up")).is_err());
    }

    #[test]
    fn parse_accepts_mixed_case_directions() {
        let sort = Sort::parse("name DESC, created_at,  tag Asc").unwrap();
        assert_eq!(
            sort,
            Sort::by(Direction::Desc, "name").and(Direction::Asc, "created_at").and(Direction::Asc, "tag")
        );
    }

    #[test]
    fn parse_rejects_malformed_text() {
        assert!(Sort::parse("name sideways").is_err());
        assert!(Sort::parse("name desc extra").is_err());
        assert!(Sort::parse("name,,id").is_err());
        assert!(Sort::parse("na;me").is_err());
    }

    #[test]
    fn page_counts_round_up() {
        let req = PageRequest { page_index: 1, page_size: 10, sort: Sort::unsorted() };
        let page = Page::new(vec![1, 2, 3], 25, &req);
        assert_eq!(page.total_pages(), 3);
        assert!(page.has_next());
        let mapped = page.map(|n| n * 2);
        assert_eq!(mapped.items, vec![2, 4, 6]);
        assert_eq!(mapped.total, 25);
    }

    #[test]
    fn last_possible_page_index_has_no_next() {
        let req = PageRequest { page_index: u64::MAX, page_size: 10, sort: Sort::unsorted() };
        let page = Page::<u8>::new(vec![], 3, &req);
        assert!(!page.has_next());
        assert_eq!(page.total_pages(), 1);
    }
}
