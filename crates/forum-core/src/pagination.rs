//! Page requests and page results for list queries.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, FieldViolation};

/// Largest page a client may ask for.
pub const MAX_PAGE_SIZE: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl FromStr for SortDirection {
    type Err = FieldViolation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(FieldViolation::new(
                "sort",
                format!("unknown sort direction '{other}', expected asc or desc"),
            )),
        }
    }
}

/// Topic attributes a list can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TopicSortField {
    #[default]
    Id,
    Title,
    Message,
    CreatedAt,
    Status,
}

impl TopicSortField {
    pub const ALL: [TopicSortField; 5] = [
        TopicSortField::Id,
        TopicSortField::Title,
        TopicSortField::Message,
        TopicSortField::CreatedAt,
        TopicSortField::Status,
    ];

    /// Name accepted in the `ordenacao` and `sort` query parameters.
    pub fn as_str(&self) -> &'static str {
        match self {
            TopicSortField::Id => "id",
            TopicSortField::Title => "titulo",
            TopicSortField::Message => "mensagem",
            TopicSortField::CreatedAt => "dataCriacao",
            TopicSortField::Status => "status",
        }
    }
}

impl fmt::Display for TopicSortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TopicSortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        TopicSortField::ALL
            .into_iter()
            .find(|field| field.as_str() == name)
            .ok_or_else(|| {
                let known: Vec<&str> = TopicSortField::ALL.iter().map(|f| f.as_str()).collect();
                format!(
                    "unknown sort field '{name}', expected one of {}",
                    known.join(", ")
                )
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Sort {
    pub field: TopicSortField,
    pub direction: SortDirection,
}

impl Sort {
    pub fn desc(field: TopicSortField) -> Self {
        Self {
            field,
            direction: SortDirection::Desc,
        }
    }

    pub fn asc(field: TopicSortField) -> Self {
        Self {
            field,
            direction: SortDirection::Asc,
        }
    }
}

/// A bounds-checked request for one page of results. Pages are zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    page: u64,
    size: u64,
    sort: Sort,
}

impl PageRequest {
    /// Build a page request, rejecting negative pages, sizes outside
    /// `1..=MAX_PAGE_SIZE` and pages whose offset does not fit an `i64`.
    pub fn new(page: i64, size: i64, sort: Sort) -> Result<Self, DomainError> {
        let mut violations = Vec::new();

        if page < 0 {
            violations.push(FieldViolation::new("pagina", "must be zero or greater"));
        }
        if size < 1 || size as u64 > MAX_PAGE_SIZE {
            violations.push(FieldViolation::new(
                "quantidade",
                format!("must be between 1 and {MAX_PAGE_SIZE}"),
            ));
        }

        if !violations.is_empty() {
            return Err(DomainError::Validation(violations));
        }

        // The database takes the offset as a signed 64-bit integer.
        let offset = (page as u64).checked_mul(size as u64);
        if offset.is_none_or(|offset| offset > i64::MAX as u64) {
            return Err(DomainError::Validation(vec![FieldViolation::new(
                "pagina",
                "is beyond the last addressable page",
            )]));
        }

        Ok(Self {
            page: page as u64,
            size: size as u64,
            sort,
        })
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn sort(&self) -> Sort {
        self.sort
    }

    /// Number of rows to skip before this page starts.
    pub fn offset(&self) -> u64 {
        self.page.saturating_mul(self.size)
    }
}

/// One page of results plus the metadata needed to navigate the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub number: u64,
    pub size: u64,
    pub total_elements: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: u64) -> Self {
        Self {
            content,
            number: request.page(),
            size: request.size(),
            total_elements,
        }
    }

    pub fn total_pages(&self) -> u64 {
        if self.size == 0 {
            return 0;
        }
        self.total_elements.div_ceil(self.size)
    }

    pub fn is_first(&self) -> bool {
        self.number == 0
    }

    pub fn is_last(&self) -> bool {
        self.number + 1 >= self.total_pages()
    }

    /// Convert the items, keeping the page metadata.
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            content: self.content.into_iter().map(f).collect(),
            number: self.number,
            size: self.size,
            total_elements: self.total_elements,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_bounds() {
        assert!(PageRequest::new(0, 1, Sort::default()).is_ok());
        assert!(PageRequest::new(3, MAX_PAGE_SIZE as i64, Sort::default()).is_ok());

        match PageRequest::new(-1, 0, Sort::default()) {
            Err(DomainError::Validation(violations)) => {
                let fields: Vec<&str> = violations.iter().map(|v| v.field.as_str()).collect();
                assert_eq!(fields, vec!["pagina", "quantidade"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }

        assert!(PageRequest::new(0, MAX_PAGE_SIZE as i64 + 1, Sort::default()).is_err());
    }

    #[test]
    fn test_page_past_addressable_offset_is_rejected() {
        match PageRequest::new(i64::MAX, 100, Sort::default()) {
            Err(DomainError::Validation(violations)) => {
                assert_eq!(violations.len(), 1);
                assert_eq!(violations[0].field, "pagina");
            }
            other => panic!("expected validation error, got {other:?}"),
        }

        let last = i64::MAX / MAX_PAGE_SIZE as i64;
        let request = PageRequest::new(last, MAX_PAGE_SIZE as i64, Sort::default()).unwrap();
        assert!(request.offset() <= i64::MAX as u64);
        assert!(PageRequest::new(last + 1, MAX_PAGE_SIZE as i64, Sort::default()).is_err());
    }

    #[test]
    fn test_offset() {
        let request = PageRequest::new(2, 5, Sort::default()).unwrap();
        assert_eq!(request.offset(), 10);
    }

    #[test]
    fn test_sort_field_names() {
        assert_eq!("dataCriacao".parse(), Ok(TopicSortField::CreatedAt));
        assert_eq!("id".parse(), Ok(TopicSortField::Id));
        assert!("curso".parse::<TopicSortField>().is_err());
        assert_eq!("DESC".parse(), Ok(SortDirection::Desc));
        assert!("up".parse::<SortDirection>().is_err());
    }

    #[test]
    fn test_page_metadata() {
        let request = PageRequest::new(1, 2, Sort::default()).unwrap();
        let page = Page::new(vec![3, 4], &request, 5).map(|n| n * 10);

        assert_eq!(page.content, vec![30, 40]);
        assert_eq!(page.total_pages(), 3);
        assert!(!page.is_first());
        assert!(!page.is_last());
    }
}
