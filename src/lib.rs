//! Convention-based filtering, search, sorting and pagination for Axum +
//! Sea-ORM list endpoints.
//!
//! Bind [`PaginateOptionsBuilder`] as an extractor, build the options, and
//! hand any `Select` to [`ToPaginated`]:
//!
//! ```rust,ignore
//! async fn list_records(
//!     State(db): State<DatabaseConnection>,
//!     builder: PaginateOptionsBuilder,
//! ) -> Result<Json<Paginated<records::Model>>, PaginateError> {
//!     let options = builder.build()?;
//!     let page = records::Entity::find().to_paginated(&db, &options).await?;
//!     Ok(Json(page))
//! }
//! ```
//!
//! Reserved keys (`search`, `orderBy`, `orderDirection`, `page`,
//! `rowsPerPage`, `columns`) drive search, ordering and the page window;
//! every other key filters the column of the same name, optionally carrying
//! an operator suffix (`__eq`, `__in`, `__start`, `__end`, `__gt`, `__gte`,
//! `__lt`, `__lte`). Predicates compile per the column's declared type; the
//! [`filtering`] module documents the per-type semantics.

pub mod builder;
pub mod errors;
pub mod filtering;
pub mod models;
pub mod paginate;
pub mod schema;

pub use builder::PaginateOptionsBuilder;
pub use errors::PaginateError;
pub use models::{
    FilterOperator, FilterValue, PaginateOptions, PaginateParams, Paginated, SortDirection,
};
pub use paginate::ToPaginated;
pub use schema::{CollectionDef, DefaultOperators, EntitySchema, FieldType};
