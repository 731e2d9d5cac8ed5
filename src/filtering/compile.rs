//! Filter value compilation.
//!
//! Turns the accumulated [`FilterValue`]s of one field into a single
//! [`FilterExpr`] according to the field's semantic type:
//!
//! - values carrying a range operator (`__gt`, `__gte`, `__lt`, `__lte`) are
//!   AND-combined, so `amount__gte=2&amount__lt=5` expresses `2 <= x < 5`;
//! - all other values are OR-combined alternatives;
//! - when both groups are present, the groups themselves are OR-combined.
//!   A field with a range filter and an equality filter matches rows
//!   satisfying either one. That asymmetry is intentional and relied upon by
//!   callers; keep it.
//!
//! Unparseable numeric/date values compile to [`FilterExpr::False`] rather
//! than erroring: filter values come straight from query strings, and a typo
//! should produce an empty page, not a 500.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use uuid::Uuid;

use super::expr::{CompareOp, FilterExpr, ScalarValue, StringMatchOp};
use crate::models::{FilterOperator, FilterValue};
use crate::schema::{DefaultOperators, FieldType, ResolvedField};

/// Compile every value accumulated for one field into a single predicate,
/// applying the AND/OR grouping rules above.
#[must_use]
pub fn compile_field(
    defaults: &DefaultOperators,
    target: &ResolvedField,
    values: &[FilterValue],
) -> FilterExpr {
    let (range_values, plain_values): (Vec<&FilterValue>, Vec<&FilterValue>) =
        values.iter().partition(|value| value.is_range());

    let mut groups = Vec::new();
    if !range_values.is_empty() {
        groups.push(FilterExpr::all(
            range_values
                .iter()
                .map(|value| compile_value(defaults, target, value))
                .collect(),
        ));
    }
    if !plain_values.is_empty() {
        groups.push(FilterExpr::any(
            plain_values
                .iter()
                .map(|value| compile_value(defaults, target, value))
                .collect(),
        ));
    }
    // An empty value list never leaves the builder; stay neutral for direct
    // callers instead of matching nothing.
    if groups.is_empty() {
        return FilterExpr::And(Vec::new());
    }
    FilterExpr::any(groups)
}

/// Compile one value, resolving an unset operator to the field type's
/// default. Collection targets wrap the element predicate existentially.
fn compile_value(
    defaults: &DefaultOperators,
    target: &ResolvedField,
    value: &FilterValue,
) -> FilterExpr {
    match target {
        ResolvedField::Scalar { field, field_type } => {
            let operator = value
                .operator
                .unwrap_or_else(|| defaults.resolve(*field_type));
            scalar_predicate(field, *field_type, operator, &value.value)
        }
        ResolvedField::Collection {
            target,
            element_column,
            element_type,
        } => {
            let operator = value
                .operator
                .unwrap_or_else(|| defaults.resolve(FieldType::List));
            let inner = scalar_predicate(element_column, *element_type, operator, &value.value);
            FilterExpr::Exists {
                target: target.clone(),
                inner: Box::new(inner),
            }
        }
    }
}

fn scalar_predicate(
    field: &str,
    field_type: FieldType,
    operator: FilterOperator,
    raw: &str,
) -> FilterExpr {
    match field_type {
        // A collection element declared as List has no deeper nesting to
        // recurse into; treat the element as text.
        FieldType::String | FieldType::List => string_predicate(field, operator, raw),
        FieldType::Number => number_predicate(field, operator, raw),
        FieldType::DateTime => datetime_predicate(field, operator, raw),
        FieldType::Other => other_predicate(field, operator, raw),
    }
}

fn string_predicate(field: &str, operator: FilterOperator, raw: &str) -> FilterExpr {
    let matches = |op: StringMatchOp| FilterExpr::StringMatch {
        field: field.to_string(),
        op,
        value: raw.to_string(),
    };
    match operator {
        FilterOperator::Equal => matches(StringMatchOp::Equals),
        FilterOperator::In => matches(StringMatchOp::Contains),
        FilterOperator::StartsWith => matches(StringMatchOp::StartsWith),
        FilterOperator::EndsWith => matches(StringMatchOp::EndsWith),
        // Lexical ordering is always well-defined; no soft failure here.
        FilterOperator::GreaterThan => lexical(field, CompareOp::Gt, raw),
        FilterOperator::GreaterOrEqual => lexical(field, CompareOp::Gte, raw),
        FilterOperator::LessThan => lexical(field, CompareOp::Lt, raw),
        FilterOperator::LessOrEqual => lexical(field, CompareOp::Lte, raw),
    }
}

fn lexical(field: &str, op: CompareOp, raw: &str) -> FilterExpr {
    FilterExpr::Compare {
        field: field.to_string(),
        op,
        value: ScalarValue::Text(raw.to_string()),
    }
}

fn number_predicate(field: &str, operator: FilterOperator, raw: &str) -> FilterExpr {
    let Some(number) = parse_number(raw) else {
        tracing::debug!(field = %field, value = %raw, "unparseable numeric filter value, matching nothing");
        return FilterExpr::False;
    };
    let compare = |op: CompareOp| FilterExpr::Compare {
        field: field.to_string(),
        op,
        value: ScalarValue::Number(number),
    };
    match operator {
        FilterOperator::Equal | FilterOperator::In => compare(CompareOp::Eq),
        FilterOperator::GreaterThan => compare(CompareOp::Gt),
        FilterOperator::GreaterOrEqual => compare(CompareOp::Gte),
        FilterOperator::LessThan => compare(CompareOp::Lt),
        FilterOperator::LessOrEqual => compare(CompareOp::Lte),
        FilterOperator::StartsWith | FilterOperator::EndsWith => {
            tracing::debug!(field = %field, "prefix/suffix match has no numeric meaning, matching nothing");
            FilterExpr::False
        }
    }
}

fn datetime_predicate(field: &str, operator: FilterOperator, raw: &str) -> FilterExpr {
    let Some(instant) = parse_datetime(raw) else {
        tracing::debug!(field = %field, value = %raw, "unparseable datetime filter value, matching nothing");
        return FilterExpr::False;
    };
    let compare = |op: CompareOp| FilterExpr::Compare {
        field: field.to_string(),
        op,
        value: ScalarValue::DateTime(instant),
    };
    match operator {
        // Equality on a timestamp means "within that calendar day", so
        // `event_at__eq=2000-1-15` matches any time on January 15th.
        FilterOperator::Equal | FilterOperator::In => {
            let Some((low, high)) = day_range(instant) else {
                return FilterExpr::False;
            };
            FilterExpr::Between {
                field: field.to_string(),
                low: ScalarValue::DateTime(low),
                high: ScalarValue::DateTime(high),
            }
        }
        FilterOperator::GreaterThan => compare(CompareOp::Gt),
        FilterOperator::GreaterOrEqual => compare(CompareOp::Gte),
        FilterOperator::LessThan => compare(CompareOp::Lt),
        FilterOperator::LessOrEqual => compare(CompareOp::Lte),
        FilterOperator::StartsWith | FilterOperator::EndsWith => {
            tracing::debug!(field = %field, "prefix/suffix match has no datetime meaning, matching nothing");
            FilterExpr::False
        }
    }
}

fn other_predicate(field: &str, operator: FilterOperator, raw: &str) -> FilterExpr {
    let compare = |op: CompareOp, value: ScalarValue| FilterExpr::Compare {
        field: field.to_string(),
        op,
        value,
    };
    match operator {
        FilterOperator::Equal | FilterOperator::In => {
            // Uuid-shaped values bind typed so uuid columns match on every
            // backend; everything else is compared raw, case-sensitively.
            if let Ok(uuid) = Uuid::parse_str(raw.trim()) {
                compare(CompareOp::Eq, ScalarValue::Uuid(uuid))
            } else {
                compare(CompareOp::Eq, ScalarValue::Text(raw.to_string()))
            }
        }
        FilterOperator::GreaterThan => compare(CompareOp::Gt, ScalarValue::Text(raw.to_string())),
        FilterOperator::GreaterOrEqual => {
            compare(CompareOp::Gte, ScalarValue::Text(raw.to_string()))
        }
        FilterOperator::LessThan => compare(CompareOp::Lt, ScalarValue::Text(raw.to_string())),
        FilterOperator::LessOrEqual => compare(CompareOp::Lte, ScalarValue::Text(raw.to_string())),
        FilterOperator::StartsWith | FilterOperator::EndsWith => {
            tracing::debug!(field = %field, "prefix/suffix match is not defined for this field type");
            FilterExpr::False
        }
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
}

/// Accepted datetime shapes, tried in order: RFC 3339 (normalized to its UTC
/// instant), `Y-m-d H:M:S[.f]` with a space or `T` separator, `Y-m-d H:M`,
/// and a bare `Y-m-d`. Single-digit month/day/hour fields are accepted.
fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if let Ok(instant) = chrono::DateTime::parse_from_rfc3339(trimmed) {
        return Some(instant.naive_utc());
    }
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    for format in FORMATS {
        if let Ok(instant) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(instant);
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .map(|date| NaiveDateTime::new(date, NaiveTime::MIN))
}

/// `[00:00:00.000, 23:59:59.999]` of the instant's calendar day.
fn day_range(instant: NaiveDateTime) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let start = NaiveDateTime::new(instant.date(), NaiveTime::MIN);
    let end = start
        .checked_add_signed(Duration::days(1))?
        .checked_sub_signed(Duration::milliseconds(1))?;
    Some((start, end))
}
