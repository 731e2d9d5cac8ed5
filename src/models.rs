use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::builder::PaginateOptionsBuilder;

/// Filter operators recognized as `__suffix` on query parameter keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    /// Equality (type-aware: case-insensitive for strings, day range for dates)
    Equal,
    /// Containment (substring for strings, element match for collections)
    In,
    /// Prefix match
    StartsWith,
    /// Suffix match
    EndsWith,
    /// Greater than (>)
    GreaterThan,
    /// Greater than or equal (>=)
    GreaterOrEqual,
    /// Less than (<)
    LessThan,
    /// Less than or equal (<=)
    LessOrEqual,
}

impl FilterOperator {
    /// Recognized key suffixes, longest first so `__gte` never parses as `__gt`.
    pub(crate) const SUFFIXES: [&'static str; 8] = [
        "__gte", "__lte", "__gt", "__lt", "__eq", "__in", "__start", "__end",
    ];

    /// Parse an operator from a key suffix (e.g. `"__gte"`, `"__start"`).
    #[must_use]
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "__eq" => Some(Self::Equal),
            "__in" => Some(Self::In),
            "__start" => Some(Self::StartsWith),
            "__end" => Some(Self::EndsWith),
            "__gt" => Some(Self::GreaterThan),
            "__gte" => Some(Self::GreaterOrEqual),
            "__lt" => Some(Self::LessThan),
            "__lte" => Some(Self::LessOrEqual),
            _ => None,
        }
    }

    /// Get the suffix for this operator.
    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Equal => "__eq",
            Self::In => "__in",
            Self::StartsWith => "__start",
            Self::EndsWith => "__end",
            Self::GreaterThan => "__gt",
            Self::GreaterOrEqual => "__gte",
            Self::LessThan => "__lt",
            Self::LessOrEqual => "__lte",
        }
    }

    /// Whether this is one of the four comparison (range) operators.
    ///
    /// Range values on a field are AND-combined with each other, while
    /// non-range values are OR-combined.
    #[must_use]
    pub const fn is_range(self) -> bool {
        matches!(
            self,
            Self::GreaterThan | Self::GreaterOrEqual | Self::LessThan | Self::LessOrEqual
        )
    }
}

/// A single raw filter value with its (optional) operator.
///
/// `operator: None` means "use the field type's default operator"; the
/// default is resolved during predicate compilation and never written back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterValue {
    pub value: String,
    pub operator: Option<FilterOperator>,
}

impl FilterValue {
    #[must_use]
    pub fn new(value: impl Into<String>, operator: Option<FilterOperator>) -> Self {
        Self {
            value: value.into(),
            operator,
        }
    }

    /// Whether this value carries a range operator.
    #[must_use]
    pub fn is_range(&self) -> bool {
        self.operator.is_some_and(FilterOperator::is_range)
    }
}

/// Sort direction for `order_by`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Lenient parse: `desc` in any casing sorts descending, anything else
    /// falls back to the default ascending direction.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("desc") {
            Self::Desc
        } else {
            Self::Asc
        }
    }
}

impl From<SortDirection> for sea_orm::Order {
    fn from(direction: SortDirection) -> Self {
        match direction {
            SortDirection::Asc => Self::Asc,
            SortDirection::Desc => Self::Desc,
        }
    }
}

/// Parsed query options produced by [`PaginateOptionsBuilder::build`].
///
/// Field names in `filters` and entries of `columns` are always lowercased;
/// the insertion order of a field's values is preserved because it determines
/// the order of AND/OR grouping in the compiled predicate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaginateOptions {
    /// Column to order by, passed to the backend verbatim.
    pub order_by: Option<String>,
    pub order_direction: SortDirection,
    /// Filter values per field, in first-seen key order.
    pub filters: Vec<(String, Vec<FilterValue>)>,
    /// Columns the free-text search applies to.
    pub columns: std::collections::BTreeSet<String>,
    /// Page size; `0` disables pagination entirely.
    pub rows_per_page: u64,
    /// Zero-based page index.
    pub page: u64,
    /// Free-text search term, matched against `columns`.
    pub search: Option<String>,
}

impl PaginateOptions {
    /// Values accumulated for a filter field, if any.
    #[must_use]
    pub fn filter_values(&self, field: &str) -> Option<&[FilterValue]> {
        self.filters
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, values)| values.as_slice())
    }
}

/// The reserved query parameters, for handlers that want them documented in
/// OpenAPI instead of (or alongside) the free-form filter keys.
///
/// Filter parameters (`field`, `field__gte`, ...) are open-ended and cannot be
/// enumerated here; bind [`PaginateOptionsBuilder`] from the request to pick
/// those up.
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct PaginateParams {
    /// Free-text search term applied to `columns`.
    #[param(example = "AA")]
    pub search: Option<String>,
    /// Column to order the results by.
    #[param(example = "label")]
    pub order_by: Option<String>,
    /// Sort order, `ASC` (default) or `DESC`.
    #[param(example = "ASC")]
    pub order_direction: Option<String>,
    /// Zero-based page index.
    #[param(example = 0)]
    pub page: Option<u64>,
    /// Page size; omit or `0` to return all rows.
    #[param(example = 10)]
    pub rows_per_page: Option<u64>,
    /// Comma-separated column names the search applies to.
    #[param(example = "label,category")]
    pub columns: Option<String>,
}

impl PaginateParams {
    /// Feed the reserved parameters into a fresh builder.
    #[must_use]
    pub fn into_builder(self) -> PaginateOptionsBuilder {
        let mut builder = PaginateOptionsBuilder::new();
        if let Some(search) = self.search {
            builder = builder.add("search", search);
        }
        if let Some(order_by) = self.order_by {
            builder = builder.add("orderBy", order_by);
        }
        if let Some(order_direction) = self.order_direction {
            builder = builder.add("orderDirection", order_direction);
        }
        if let Some(page) = self.page {
            builder = builder.add("page", page.to_string());
        }
        if let Some(rows_per_page) = self.rows_per_page {
            builder = builder.add("rowsPerPage", rows_per_page.to_string());
        }
        if let Some(columns) = self.columns {
            builder = builder.add("columns", columns);
        }
        builder
    }
}

/// One page of results plus the metadata needed to request the next one.
///
/// Serializes with camelCase keys so the JSON body reads
/// `{"data": [...], "count": 6, "currentPage": 0, "rowsPerPage": 2,
/// "totalPages": 3, "previousPage": null, "nextPage": 1}`.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub data: Vec<T>,
    /// Total matching rows before pagination.
    pub count: u64,
    pub current_page: u64,
    pub rows_per_page: u64,
    /// `ceil(count / rows_per_page)`, or `count` itself when pagination is
    /// disabled.
    pub total_pages: u64,
    pub previous_page: Option<u64>,
    pub next_page: Option<u64>,
}

impl<T> Paginated<T> {
    /// Assemble the envelope, deriving `total_pages` and the neighbouring
    /// page indexes.
    #[must_use]
    pub fn new(data: Vec<T>, count: u64, current_page: u64, rows_per_page: u64) -> Self {
        let total_pages = if rows_per_page > 0 {
            count.div_ceil(rows_per_page)
        } else {
            count
        };
        let next_page = current_page.checked_add(1).filter(|next| *next < total_pages);
        Self {
            data,
            count,
            current_page,
            rows_per_page,
            total_pages,
            previous_page: current_page.checked_sub(1),
            next_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_suffix_round_trip() {
        for suffix in FilterOperator::SUFFIXES {
            let op = FilterOperator::from_suffix(suffix).unwrap();
            assert_eq!(op.suffix(), suffix);
        }
        assert_eq!(FilterOperator::from_suffix("__bogus"), None);
        assert_eq!(FilterOperator::from_suffix(""), None);
    }

    #[test]
    fn range_classification() {
        assert!(FilterOperator::GreaterThan.is_range());
        assert!(FilterOperator::GreaterOrEqual.is_range());
        assert!(FilterOperator::LessThan.is_range());
        assert!(FilterOperator::LessOrEqual.is_range());
        assert!(!FilterOperator::Equal.is_range());
        assert!(!FilterOperator::In.is_range());
        assert!(!FilterOperator::StartsWith.is_range());
        assert!(!FilterOperator::EndsWith.is_range());
        assert!(!FilterValue::new("x", None).is_range());
    }

    #[test]
    fn sort_direction_parse_is_lenient() {
        assert_eq!(SortDirection::parse("DESC"), SortDirection::Desc);
        assert_eq!(SortDirection::parse("desc"), SortDirection::Desc);
        assert_eq!(SortDirection::parse(" desc "), SortDirection::Desc);
        assert_eq!(SortDirection::parse("ASC"), SortDirection::Asc);
        assert_eq!(SortDirection::parse("sideways"), SortDirection::Asc);
        assert_eq!(SortDirection::parse(""), SortDirection::Asc);
    }

    #[test]
    fn params_feed_the_builder() {
        let params = PaginateParams {
            search: Some("AA".to_string()),
            order_by: Some("label".to_string()),
            order_direction: Some("desc".to_string()),
            page: Some(2),
            rows_per_page: Some(10),
            columns: Some("label,amount".to_string()),
        };
        let options = params.into_builder().build().unwrap();
        assert_eq!(options.search.as_deref(), Some("AA"));
        assert_eq!(options.order_by.as_deref(), Some("label"));
        assert_eq!(options.order_direction, SortDirection::Desc);
        assert_eq!(options.page, 2);
        assert_eq!(options.rows_per_page, 10);
        assert_eq!(options.columns.len(), 2);

        let empty = PaginateParams::default().into_builder().build().unwrap();
        assert_eq!(empty, PaginateOptions::default());
    }

    #[test]
    fn envelope_math_with_pagination() {
        let page = Paginated::new(vec![1, 2], 6, 1, 2);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.previous_page, Some(0));
        assert_eq!(page.next_page, Some(2));
    }

    #[test]
    fn envelope_math_at_boundaries() {
        let first = Paginated::new(vec![1, 2], 6, 0, 2);
        assert_eq!(first.previous_page, None);
        assert_eq!(first.next_page, Some(1));

        let last = Paginated::new(vec![5, 6], 6, 2, 2);
        assert_eq!(last.previous_page, Some(1));
        assert_eq!(last.next_page, None);
    }

    #[test]
    fn envelope_math_uneven_last_page() {
        let page = Paginated::new(vec![1], 5, 2, 2);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.next_page, None);
    }

    #[test]
    fn envelope_math_without_pagination() {
        let page = Paginated::new(vec![1, 2, 3], 3, 0, 0);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.previous_page, None);
        assert_eq!(page.next_page, Some(1));
    }

    #[test]
    fn envelope_math_beyond_last_page() {
        let page = Paginated::<i32>::new(Vec::new(), 6, 1000, 2);
        assert_eq!(page.count, 6);
        assert_eq!(page.total_pages, 3);
        assert!(page.data.is_empty());
        assert_eq!(page.next_page, None);
        assert_eq!(page.previous_page, Some(999));
    }
}
