//! Field classification for entities.
//!
//! Filtering is type-aware: the same query parameter compiles to different
//! predicates depending on whether the target column holds text, numbers, or
//! timestamps. [`EntitySchema`] carries that classification. It is derived
//! once from the entity's static column declarations (no runtime value
//! inspection) and can be amended by hand, most importantly to register
//! nested collections, which are relations rather than columns and therefore
//! invisible to column iteration.

use sea_orm::{ColumnTrait, ColumnType, EntityTrait, IdenStatic, Iterable};
use std::collections::HashMap;

use crate::filtering::expr::CollectionTarget;
use crate::models::FilterOperator;

/// Semantic type of a filterable field, driving operator defaults and
/// predicate compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// Text columns; matched case-insensitively.
    String,
    /// Integer, unsigned, floating point, decimal and money columns.
    Number,
    /// Date, time and timestamp columns.
    DateTime,
    /// A nested collection (one-to-many relation), matched existentially.
    List,
    /// Everything else: enums, uuids, booleans, json, binary. Equality only,
    /// compared raw.
    Other,
}

/// Map a declared column type to its semantic bucket.
///
/// Nullability is not part of `ColumnType` in Sea-ORM (it lives on the column
/// definition), so optional columns classify exactly like their inner type.
fn classify(column_type: &ColumnType) -> FieldType {
    match column_type {
        ColumnType::Char(_) | ColumnType::String(_) | ColumnType::Text => FieldType::String,
        ColumnType::TinyInteger
        | ColumnType::SmallInteger
        | ColumnType::Integer
        | ColumnType::BigInteger
        | ColumnType::TinyUnsigned
        | ColumnType::SmallUnsigned
        | ColumnType::Unsigned
        | ColumnType::BigUnsigned
        | ColumnType::Float
        | ColumnType::Double
        | ColumnType::Decimal(_)
        | ColumnType::Money(_) => FieldType::Number,
        ColumnType::Date
        | ColumnType::Time
        | ColumnType::DateTime
        | ColumnType::Timestamp
        | ColumnType::TimestampWithTimeZone
        | ColumnType::Year => FieldType::DateTime,
        ColumnType::Array(_) => FieldType::List,
        _ => FieldType::Other,
    }
}

/// A nested one-to-many collection reachable from the entity, registered
/// under the public field name filters use.
///
/// The existential predicate for `tags=N1` lowers to
/// `parent_key IN (SELECT foreign_key FROM table WHERE <element predicate>)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionDef {
    /// Table holding the collection elements.
    pub table: String,
    /// Column on that table referencing the parent.
    pub foreign_key: String,
    /// Parent column the foreign key points at.
    pub parent_key: String,
    /// Element column filtered when no dotted path overrides it.
    pub element_column: String,
    /// Semantic type of the element column.
    pub element_type: FieldType,
}

impl CollectionDef {
    /// Define a collection in `table`, pointing back at the parent via
    /// `foreign_key`, filtering `element_column` by default.
    ///
    /// The parent key defaults to `id` and the element type to
    /// [`FieldType::String`].
    #[must_use]
    pub fn new(
        table: impl Into<String>,
        foreign_key: impl Into<String>,
        element_column: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            foreign_key: foreign_key.into(),
            parent_key: "id".to_string(),
            element_column: element_column.into(),
            element_type: FieldType::String,
        }
    }

    #[must_use]
    pub fn parent_key(mut self, parent_key: impl Into<String>) -> Self {
        self.parent_key = parent_key.into();
        self
    }

    #[must_use]
    pub fn element_type(mut self, element_type: FieldType) -> Self {
        self.element_type = element_type;
        self
    }

    fn target(&self) -> CollectionTarget {
        CollectionTarget {
            table: self.table.clone(),
            foreign_key: self.foreign_key.clone(),
            parent_key: self.parent_key.clone(),
        }
    }
}

/// Per-type default operators, applied to filter values without an explicit
/// `__suffix`.
///
/// The built-in table sends `String` and `List` to [`FilterOperator::In`]
/// (substring / element containment); every unlisted type falls back to
/// [`FilterOperator::Equal`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultOperators(HashMap<FieldType, FilterOperator>);

impl Default for DefaultOperators {
    fn default() -> Self {
        let mut table = HashMap::new();
        table.insert(FieldType::String, FilterOperator::In);
        table.insert(FieldType::List, FilterOperator::In);
        Self(table)
    }
}

impl DefaultOperators {
    /// Override the default operator for one field type.
    #[must_use]
    pub fn with(mut self, field_type: FieldType, operator: FilterOperator) -> Self {
        self.0.insert(field_type, operator);
        self
    }

    /// Default operator for a field type, falling back to `Equal`.
    #[must_use]
    pub fn resolve(&self, field_type: FieldType) -> FilterOperator {
        self.0
            .get(&field_type)
            .copied()
            .unwrap_or(FilterOperator::Equal)
    }
}

/// What a filter key resolved to: a scalar column, or an element inside a
/// registered collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedField {
    Scalar {
        field: String,
        field_type: FieldType,
    },
    Collection {
        target: CollectionTarget,
        element_column: String,
        element_type: FieldType,
    },
}

/// Lowercased field-name -> [`FieldType`] table for one entity, plus
/// registered collections and the default-operator table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntitySchema {
    fields: HashMap<String, FieldType>,
    collections: HashMap<String, CollectionDef>,
    defaults: DefaultOperators,
}

impl EntitySchema {
    /// Derive the field table from an entity's column declarations.
    ///
    /// ```rust,ignore
    /// let schema = EntitySchema::of::<records::Entity>()
    ///     .collection("tags", CollectionDef::new("record_tags", "record_id", "tag"));
    /// ```
    #[must_use]
    pub fn of<E: EntityTrait>() -> Self {
        let fields = E::Column::iter()
            .map(|column| {
                let field_type = classify(column.def().get_column_type());
                (column.as_str().to_lowercase(), field_type)
            })
            .collect();
        Self {
            fields,
            collections: HashMap::new(),
            defaults: DefaultOperators::default(),
        }
    }

    /// Add or override a scalar field classification.
    #[must_use]
    pub fn field(mut self, name: &str, field_type: FieldType) -> Self {
        self.fields.insert(name.to_lowercase(), field_type);
        self
    }

    /// Register a nested collection under its public field name.
    #[must_use]
    pub fn collection(mut self, name: &str, def: CollectionDef) -> Self {
        let name = name.to_lowercase();
        self.fields.insert(name.clone(), FieldType::List);
        self.collections.insert(name, def);
        self
    }

    /// Override the default operator for one field type.
    #[must_use]
    pub fn default_operator(mut self, field_type: FieldType, operator: FilterOperator) -> Self {
        self.defaults = self.defaults.with(field_type, operator);
        self
    }

    /// The semantic type of a field, if known.
    #[must_use]
    pub fn field_type(&self, name: &str) -> Option<FieldType> {
        self.fields.get(name).copied()
    }

    pub(crate) fn defaults(&self) -> &DefaultOperators {
        &self.defaults
    }

    /// Resolve a (lowercased) filter key to its target.
    ///
    /// Dotted keys (`base.child`) resolve against the collection registered
    /// as `base`, with `child` overriding the element column. A `List` column
    /// without a registered collection stays unresolved; there is no portable
    /// scalar-collection predicate to fall back to.
    #[must_use]
    pub fn resolve(&self, field: &str) -> Option<ResolvedField> {
        if let Some((base, element)) = field.split_once('.') {
            let def = self.collections.get(base)?;
            return Some(ResolvedField::Collection {
                target: def.target(),
                element_column: element.to_string(),
                element_type: def.element_type,
            });
        }
        if let Some(def) = self.collections.get(field) {
            return Some(ResolvedField::Collection {
                target: def.target(),
                element_column: def.element_column.clone(),
                element_type: def.element_type,
            });
        }
        match self.fields.get(field) {
            Some(FieldType::List) => {
                tracing::debug!(
                    field = %field,
                    "list field has no registered collection, ignoring filter"
                );
                None
            }
            Some(field_type) => Some(ResolvedField::Scalar {
                field: field.to_string(),
                field_type: *field_type,
            }),
            None => None,
        }
    }
}
