//! In-memory predicate representation.
//!
//! Filter compilation never builds SQL strings. Each field's values compile
//! into a [`FilterExpr`] tree (typed leaf comparisons plus AND/OR grouping),
//! which [`conditions`](super::conditions) then lowers onto Sea-ORM's
//! `Condition`/`SimpleExpr` builders. Keeping the tree explicit is what makes
//! the grouping rules (range values AND, alternatives OR, groups OR) unit
//! testable without a database.

use chrono::NaiveDateTime;
use uuid::Uuid;

/// A parsed, typed comparison operand.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    /// Raw text, bound as-is.
    Text(String),
    Number(f64),
    DateTime(NaiveDateTime),
    Uuid(Uuid),
}

/// Comparison operators usable on any orderable leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

/// Case-insensitive string predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringMatchOp {
    Equals,
    Contains,
    StartsWith,
    EndsWith,
}

/// The collection a nested (existential) predicate runs against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionTarget {
    pub table: String,
    pub foreign_key: String,
    pub parent_key: String,
}

/// A compiled boolean predicate over one entity.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    /// Matches no rows. Produced when a filter value fails to parse for its
    /// field type; the query degrades to an empty result instead of erroring.
    False,
    /// Typed comparison against a column.
    Compare {
        field: String,
        op: CompareOp,
        value: ScalarValue,
    },
    /// Case-insensitive string match against a column.
    StringMatch {
        field: String,
        op: StringMatchOp,
        value: String,
    },
    /// Inclusive range test, used for calendar-day equality on timestamps.
    Between {
        field: String,
        low: ScalarValue,
        high: ScalarValue,
    },
    /// True if any element of the target collection satisfies `inner`.
    Exists {
        target: CollectionTarget,
        inner: Box<FilterExpr>,
    },
    /// All parts must hold. Empty means "matches everything".
    And(Vec<FilterExpr>),
    /// At least one part must hold.
    Or(Vec<FilterExpr>),
}

impl FilterExpr {
    /// AND a group together, unwrapping the trivial one-element group.
    #[must_use]
    pub fn all(mut parts: Vec<FilterExpr>) -> FilterExpr {
        if parts.len() == 1 {
            parts.remove(0)
        } else {
            FilterExpr::And(parts)
        }
    }

    /// OR a group together, unwrapping the trivial one-element group.
    #[must_use]
    pub fn any(mut parts: Vec<FilterExpr>) -> FilterExpr {
        if parts.len() == 1 {
            parts.remove(0)
        } else {
            FilterExpr::Or(parts)
        }
    }
}
