//! The query pipeline: filters, search, ordering, count and page windowing
//! over a lazily composed [`Select`].
//!
//! Stages run in a fixed order: per-field filter predicates AND together,
//! then the search predicate (one OR across the searched columns), then
//! ordering, then the caller's transform hook. The count round-trip happens
//! against that fully shaped query before offset/limit are applied, so
//! `count` always reflects the unpaginated total. Materialization is the
//! second and last round-trip; count and data are separate reads and may
//! diverge under concurrent writes.

use async_trait::async_trait;
use sea_orm::{
    Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Select,
    sea_query::{Alias, IntoColumnRef, SimpleExpr},
};

use crate::errors::PaginateError;
use crate::filtering::{compile_field, to_condition};
use crate::models::{FilterValue, PaginateOptions, Paginated};
use crate::schema::EntitySchema;

/// Pagination entry points for `Select<E>`.
#[async_trait]
pub trait ToPaginated<E>: Sized + Send
where
    E: EntityTrait + Sync,
{
    /// Run the pipeline with a schema derived from the entity's column
    /// declarations and no extra query shaping.
    async fn to_paginated(
        self,
        db: &DatabaseConnection,
        options: &PaginateOptions,
    ) -> Result<Paginated<E::Model>, PaginateError>;

    /// Run the pipeline with an explicit schema (needed for collection
    /// fields or tuned default operators) and a transform hook applied after
    /// filtering and ordering, before the count. The hook can add joins or
    /// hard scoping filters; both the count and the page reflect it.
    async fn to_paginated_with<F>(
        self,
        db: &DatabaseConnection,
        schema: &EntitySchema,
        options: &PaginateOptions,
        transform: F,
    ) -> Result<Paginated<E::Model>, PaginateError>
    where
        F: FnOnce(Select<E>) -> Select<E> + Send;
}

#[async_trait]
impl<E> ToPaginated<E> for Select<E>
where
    E: EntityTrait + Sync,
    E::Model: Sync,
{
    async fn to_paginated(
        self,
        db: &DatabaseConnection,
        options: &PaginateOptions,
    ) -> Result<Paginated<E::Model>, PaginateError> {
        let schema = EntitySchema::of::<E>();
        self.to_paginated_with(db, &schema, options, |query| query)
            .await
    }

    async fn to_paginated_with<F>(
        self,
        db: &DatabaseConnection,
        schema: &EntitySchema,
        options: &PaginateOptions,
        transform: F,
    ) -> Result<Paginated<E::Model>, PaginateError>
    where
        F: FnOnce(Select<E>) -> Select<E> + Send,
    {
        let mut query = self;

        for (field, values) in &options.filters {
            let Some(target) = schema.resolve(field) else {
                tracing::debug!(field = %field, "skipping filter on unknown field");
                continue;
            };
            let expr = compile_field(schema.defaults(), &target, values);
            query = query.filter(&expr);
        }

        if let Some(condition) = search_condition(schema, options) {
            query = query.filter(condition);
        }

        if let Some(order_by) = options.order_by.as_deref().filter(|name| !name.is_empty()) {
            // The name is passed through as a column reference; a column the
            // backend does not know surfaces as a database error.
            query = query.order_by(
                SimpleExpr::Column(Alias::new(order_by).into_column_ref()),
                options.order_direction.into(),
            );
        }

        let mut query = transform(query);

        let count = PaginatorTrait::count(query.clone(), db)
            .await
            .map_err(PaginateError::database)?;

        if options.rows_per_page > 0 {
            query = query
                .offset(options.page.saturating_mul(options.rows_per_page))
                .limit(options.rows_per_page);
        }

        let data = query.all(db).await.map_err(PaginateError::database)?;
        Ok(Paginated::new(
            data,
            count,
            options.page,
            options.rows_per_page,
        ))
    }
}

/// One OR across every searched column that resolves to a known field, with
/// the search term compiled per that field's type and default operator.
/// `None` when search is empty, no columns are set, or nothing resolves.
fn search_condition(schema: &EntitySchema, options: &PaginateOptions) -> Option<Condition> {
    let search = options.search.as_deref()?;
    if search.is_empty() || options.columns.is_empty() {
        return None;
    }
    let value = FilterValue::new(search, None);
    let mut any = Condition::any();
    let mut matched = false;
    for column in &options.columns {
        let Some(target) = schema.resolve(column) else {
            tracing::debug!(column = %column, "skipping search on unknown column");
            continue;
        };
        let expr = compile_field(schema.defaults(), &target, std::slice::from_ref(&value));
        any = any.add(to_condition(&expr));
        matched = true;
    }
    matched.then_some(any)
}
