//! Type-aware filter predicates.
//!
//! Every non-reserved query parameter names a field, optionally carrying an
//! operator suffix:
//!
//! ```text
//! GET /records?label__start=AB          strings match case-insensitively
//! GET /records?amount__gte=2&amount__lt=5   ranges AND together
//! GET /records?category=alpha&category=beta repeats OR together
//! GET /records?event_at=2000-1-15       timestamps match the whole day
//! GET /records?tags.tag=N1              collections match any element
//! ```
//!
//! Compilation happens in two stages. [`compile::compile_field`] turns the
//! raw values of one field into a backend-neutral [`expr::FilterExpr`] tree,
//! which unit tests can inspect structurally. [`conditions::to_condition`]
//! then lowers the tree into a [`sea_orm::Condition`] with quoted column
//! names and bound values.

pub mod compile;
pub mod conditions;
pub mod expr;

pub use compile::compile_field;
pub use conditions::to_condition;
pub use expr::{CollectionTarget, CompareOp, FilterExpr, ScalarValue, StringMatchOp};
