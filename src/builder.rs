//! Accumulation and normalization of raw query parameters.
//!
//! The builder is a small insertion-ordered multimap: keys are lowercased and
//! stripped of bracket suffixes (`columns[]`, `columns[0]` both land under
//! `columns`) as they are added, and repeated keys append values instead of
//! overwriting. [`PaginateOptionsBuilder::build`] then routes reserved keys
//! (`search`, `orderBy`, `orderDirection`, `page`, `rowsPerPage`, `columns`)
//! to their dedicated fields and turns everything else into filter fields,
//! splitting operator suffixes like `amount__gte` off the field name.
//!
//! In an Axum handler the builder binds straight from the query string:
//!
//! ```text
//! async fn list(builder: PaginateOptionsBuilder, ...) -> ... {
//!     let options = builder.build()?;
//! ```

use std::collections::BTreeSet;
use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::errors::PaginateError;
use crate::models::{FilterOperator, FilterValue, PaginateOptions, SortDirection};

/// Multi-valued parameter accumulator; see the module docs.
#[derive(Debug, Clone, Default)]
pub struct PaginateOptionsBuilder {
    params: Vec<(String, Vec<String>)>,
    include: BTreeSet<String>,
    exclude: BTreeSet<String>,
}

impl PaginateOptionsBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an `application/x-www-form-urlencoded` query string, preserving
    /// duplicate keys and their order.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let mut builder = Self::new();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            builder = builder.add(&key, value.into_owned());
        }
        builder
    }

    /// Append one value under a key. The key is normalized (lowercased,
    /// bracket suffix stripped); the value is stored untouched.
    #[must_use]
    pub fn add(mut self, key: &str, value: impl Into<String>) -> Self {
        let key = normalize_key(key);
        let value = value.into();
        if let Some((_, values)) = self.params.iter_mut().find(|(name, _)| *name == key) {
            values.push(value);
        } else {
            self.params.push((key, vec![value]));
        }
        self
    }

    /// [`add`](Self::add) every pair of an iterator.
    #[must_use]
    pub fn add_all<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        for (key, value) in pairs {
            self = self.add(key.as_ref(), value);
        }
        self
    }

    /// Drop every value accumulated under a key (same normalization as
    /// [`add`](Self::add)).
    #[must_use]
    pub fn remove(mut self, key: &str) -> Self {
        let key = normalize_key(key);
        self.params.retain(|(name, _)| *name != key);
        self
    }

    /// Restrict filtering and search to exactly these fields. A non-empty
    /// include set wins over any `columns` parameter and the exclude set.
    #[must_use]
    pub fn include_columns<S: AsRef<str>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.include
            .extend(names.into_iter().map(|name| name.as_ref().to_lowercase()));
        self
    }

    /// Never filter or search on these fields, whatever the request says.
    #[must_use]
    pub fn exclude_columns<S: AsRef<str>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.exclude
            .extend(names.into_iter().map(|name| name.as_ref().to_lowercase()));
        self
    }

    /// Produce the parsed options.
    ///
    /// # Errors
    ///
    /// Returns [`PaginateError::InvalidParameter`] when `page` or
    /// `rowsPerPage` does not parse as an unsigned integer. Filter values are
    /// never validated here; unparseable ones degrade at compile time instead.
    pub fn build(&self) -> Result<PaginateOptions, PaginateError> {
        let mut options = PaginateOptions::default();
        let mut direction: Option<SortDirection> = None;
        let mut page: Option<u64> = None;
        let mut rows_per_page: Option<u64> = None;

        for (key, values) in &self.params {
            let (field, operator) = split_operator(key);
            let Some(first) = values.first() else {
                continue;
            };
            match field {
                "search" => {
                    if options.search.is_none() {
                        options.search = Some(first.clone());
                    }
                }
                "orderby" => {
                    if options.order_by.is_none() {
                        options.order_by = Some(first.clone());
                    }
                }
                "orderdirection" => {
                    if direction.is_none() {
                        direction = Some(SortDirection::parse(first));
                    }
                }
                "page" => {
                    if page.is_none() {
                        page = Some(parse_index("page", first)?);
                    }
                }
                "rowsperpage" => {
                    if rows_per_page.is_none() {
                        rows_per_page = Some(parse_index("rowsPerPage", first)?);
                    }
                }
                "columns" => {
                    // Ignored entirely when an include set is in force; that
                    // set is applied after the loop.
                    if self.include.is_empty() {
                        for value in values {
                            for column in value.split(',') {
                                let column = column.to_lowercase();
                                if !column.is_empty() && !self.exclude.contains(&column) {
                                    options.columns.insert(column);
                                }
                            }
                        }
                    }
                }
                _ => {
                    if self.exclude.contains(field) {
                        continue;
                    }
                    if !self.include.is_empty() && !self.include.contains(field) {
                        continue;
                    }
                    let filter_values = values
                        .iter()
                        .map(|value| FilterValue::new(value.clone(), operator));
                    // field__eq and a bare field land in the same entry, so
                    // their values group per the compiler's AND/OR rules.
                    if let Some((_, existing)) =
                        options.filters.iter_mut().find(|(name, _)| name == field)
                    {
                        existing.extend(filter_values);
                    } else {
                        options
                            .filters
                            .push((field.to_string(), filter_values.collect()));
                    }
                }
            }
        }

        if !self.include.is_empty() {
            options.columns = self.include.clone();
        }
        options.order_direction = direction.unwrap_or_default();
        options.page = page.unwrap_or_default();
        options.rows_per_page = rows_per_page.unwrap_or_default();
        Ok(options)
    }
}

/// Lowercase and strip a trailing `[...]`, so `columns[]`, `columns[0]` and
/// `Columns` all normalize to `columns`.
fn normalize_key(key: &str) -> String {
    let base = match key.find('[') {
        Some(open) if key.ends_with(']') => &key[..open],
        _ => key,
    };
    base.to_lowercase()
}

/// Split a trailing operator suffix off a normalized key. Only the eight
/// known suffixes are special; `name__like` stays a literal field name.
fn split_operator(key: &str) -> (&str, Option<FilterOperator>) {
    for suffix in FilterOperator::SUFFIXES {
        if let Some(base) = key.strip_suffix(suffix) {
            if !base.is_empty() {
                return (base, FilterOperator::from_suffix(suffix));
            }
        }
    }
    (key, None)
}

fn parse_index(name: &'static str, raw: &str) -> Result<u64, PaginateError> {
    raw.trim()
        .parse()
        .map_err(|_| PaginateError::invalid_parameter(name, raw))
}

/// Builds from the request query string; binding never fails, errors surface
/// from [`PaginateOptionsBuilder::build`] inside the handler.
impl<S> FromRequestParts<S> for PaginateOptionsBuilder
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_query(parts.uri.query().unwrap_or_default()))
    }
}
