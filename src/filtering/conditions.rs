//! Lowering of [`FilterExpr`] trees into `sea_query` conditions.
//!
//! Column names are always wrapped in [`Expr::col`] so they are quoted by the
//! query builder, and values always bind through [`Value`], never through
//! string interpolation. String matching goes through `UPPER()` on both sides
//! so it is case-insensitive on every backend, with LIKE wildcards in user
//! input escaped and declared via `ESCAPE '\'`.

use sea_orm::{
    Condition, Value,
    sea_query::{Alias, Expr, Func, IntoCondition, LikeExpr, Query, SimpleExpr},
};

use super::expr::{CollectionTarget, CompareOp, FilterExpr, ScalarValue, StringMatchOp};

/// Recursively lower a predicate tree into a [`Condition`].
///
/// Empty `And`/`Or` groups lower to empty conditions, which the query builder
/// drops, so a neutral tree leaves the statement unfiltered.
#[must_use]
pub fn to_condition(expr: &FilterExpr) -> Condition {
    match expr {
        FilterExpr::And(parts) => parts
            .iter()
            .fold(Condition::all(), |cond, part| cond.add(to_condition(part))),
        FilterExpr::Or(parts) => parts
            .iter()
            .fold(Condition::any(), |cond, part| cond.add(to_condition(part))),
        FilterExpr::False => Condition::all().add(Expr::value(false)),
        FilterExpr::Compare { field, op, value } => {
            Condition::all().add(comparison(field, *op, value))
        }
        FilterExpr::StringMatch { field, op, value } => {
            Condition::all().add(string_match(field, *op, value))
        }
        FilterExpr::Between { field, low, high } => Condition::all().add(
            Expr::col(Alias::new(field.as_str())).between(scalar(low), scalar(high)),
        ),
        FilterExpr::Exists { target, inner } => Condition::all().add(member_of(target, inner)),
    }
}

impl IntoCondition for &FilterExpr {
    fn into_condition(self) -> Condition {
        to_condition(self)
    }
}

impl IntoCondition for FilterExpr {
    fn into_condition(self) -> Condition {
        to_condition(&self)
    }
}

fn comparison(field: &str, op: CompareOp, value: &ScalarValue) -> SimpleExpr {
    let column = Expr::col(Alias::new(field));
    let value = scalar(value);
    match op {
        CompareOp::Eq => column.eq(value),
        CompareOp::Gt => column.gt(value),
        CompareOp::Gte => column.gte(value),
        CompareOp::Lt => column.lt(value),
        CompareOp::Lte => column.lte(value),
    }
}

fn string_match(field: &str, op: StringMatchOp, value: &str) -> SimpleExpr {
    let upper_column = SimpleExpr::FunctionCall(Func::upper(Expr::col(Alias::new(field))));
    let needle = value.to_uppercase();
    match op {
        StringMatchOp::Equals => upper_column.eq(needle),
        StringMatchOp::Contains => like(upper_column, format!("%{}%", escape_like_wildcards(&needle))),
        StringMatchOp::StartsWith => like(upper_column, format!("{}%", escape_like_wildcards(&needle))),
        StringMatchOp::EndsWith => like(upper_column, format!("%{}", escape_like_wildcards(&needle))),
    }
}

fn like(column: SimpleExpr, pattern: String) -> SimpleExpr {
    column.like(LikeExpr::new(pattern).escape('\\'))
}

/// `parent_key IN (SELECT foreign_key FROM table WHERE inner)`.
///
/// An IN subquery rather than a JOIN keeps the outer row set duplicate-free
/// when several collection rows match the same parent.
fn member_of(target: &CollectionTarget, inner: &FilterExpr) -> SimpleExpr {
    let members = Query::select()
        .column(Alias::new(target.foreign_key.as_str()))
        .from(Alias::new(target.table.as_str()))
        .cond_where(to_condition(inner))
        .to_owned();
    Expr::col(Alias::new(target.parent_key.as_str())).in_subquery(members)
}

fn scalar(value: &ScalarValue) -> Value {
    match value {
        ScalarValue::Text(text) => text.clone().into(),
        ScalarValue::Number(number) => (*number).into(),
        ScalarValue::DateTime(instant) => (*instant).into(),
        ScalarValue::Uuid(id) => (*id).into(),
    }
}

/// Escape LIKE wildcards to prevent wildcard injection
/// Escapes: % (match any) and _ (match single char)
fn escape_like_wildcards(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
