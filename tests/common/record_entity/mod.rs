use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Stored as a string, declared as an enum column so it classifies as an
/// opaque field (raw, case-sensitive equality) rather than free text.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "category")]
pub enum Category {
    #[sea_orm(string_value = "alpha")]
    Alpha,
    #[sea_orm(string_value = "beta")]
    Beta,
    #[sea_orm(string_value = "gamma")]
    Gamma,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub event_at: Option<DateTime>,
    pub amount: Option<f64>,
    #[sea_orm(column_type = "Text", nullable)]
    pub label: Option<String>,
    pub category: Option<Category>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
