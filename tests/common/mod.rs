use axum::{Json, Router, extract::State};
use chrono::NaiveDateTime;
use sea_orm::ActiveValue::Set;
use sea_orm::{Database, DatabaseConnection, DbErr, EntityTrait};
use sea_orm_migration::prelude::*;

use pagecrate::{
    CollectionDef, EntitySchema, PaginateError, PaginateOptionsBuilder, Paginated, ToPaginated,
};

pub mod record_entity;
pub mod record_tag_entity;

use record_entity::Category;

/// Fresh in-memory database with the fixture corpus:
///
/// | id | event_at            | amount | label | category | tags   |
/// |----|---------------------|--------|-------|----------|--------|
/// | 1  | 2000-01-15 01:02:03 | 1.0    | AAAA  | alpha    |        |
/// | 2  | 2000-01-15 00:00:00 | 1.1    | AABB  | beta     |        |
/// | 3  | 2000-02-15 00:00:00 | 1.5    | BBBB  | beta     |        |
/// | 4  | 2000-03-15 00:00:00 | 100.0  | ABCD  | gamma    | N1, N2 |
/// | 5  | 2001-04-15 00:00:00 | 200.0  | CCCC  | gamma    | N2, A  |
/// | 6  | NULL                | NULL   | NULL  | NULL     |        |
pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;
    seed_records(&db).await?;
    Ok(db)
}

/// The records schema with the `tags` collection registered.
pub fn record_schema() -> EntitySchema {
    EntitySchema::of::<record_entity::Entity>()
        .collection("tags", CollectionDef::new("record_tags", "record_id", "tag"))
}

/// Run a raw query string through the full pipeline against `records`.
pub async fn paginate(db: &DatabaseConnection, query: &str) -> Paginated<record_entity::Model> {
    let options = PaginateOptionsBuilder::from_query(query)
        .build()
        .expect("query string should build");
    record_entity::Entity::find()
        .to_paginated_with(db, &record_schema(), &options, |query| query)
        .await
        .expect("pagination should succeed")
}

pub fn ids(page: &Paginated<record_entity::Model>) -> Vec<i32> {
    page.data.iter().map(|record| record.id).collect()
}

pub fn records_app(db: DatabaseConnection) -> Router {
    Router::new()
        .route("/records", axum::routing::get(list_records))
        .with_state(db)
}

async fn list_records(
    State(db): State<DatabaseConnection>,
    builder: PaginateOptionsBuilder,
) -> Result<Json<Paginated<record_entity::Model>>, PaginateError> {
    let options = builder.build()?;
    let page = record_entity::Entity::find()
        .to_paginated_with(&db, &record_schema(), &options, |query| query)
        .await?;
    Ok(Json(page))
}

async fn seed_records(db: &DatabaseConnection) -> Result<(), DbErr> {
    record_entity::Entity::insert_many([
        record(1, Some("2000-01-15 01:02:03"), Some(1.0), Some("AAAA"), Some(Category::Alpha)),
        record(2, Some("2000-01-15 00:00:00"), Some(1.1), Some("AABB"), Some(Category::Beta)),
        record(3, Some("2000-02-15 00:00:00"), Some(1.5), Some("BBBB"), Some(Category::Beta)),
        record(4, Some("2000-03-15 00:00:00"), Some(100.0), Some("ABCD"), Some(Category::Gamma)),
        record(5, Some("2001-04-15 00:00:00"), Some(200.0), Some("CCCC"), Some(Category::Gamma)),
        record(6, None, None, None, None),
    ])
    .exec(db)
    .await?;

    record_tag_entity::Entity::insert_many([
        tag(1, 4, "N1"),
        tag(2, 4, "N2"),
        tag(3, 5, "N2"),
        tag(4, 5, "A"),
    ])
    .exec(db)
    .await?;
    Ok(())
}

fn record(
    id: i32,
    event_at: Option<&str>,
    amount: Option<f64>,
    label: Option<&str>,
    category: Option<Category>,
) -> record_entity::ActiveModel {
    record_entity::ActiveModel {
        id: Set(id),
        event_at: Set(event_at.map(parse_instant)),
        amount: Set(amount),
        label: Set(label.map(str::to_string)),
        category: Set(category),
    }
}

fn tag(id: i32, record_id: i32, tag: &str) -> record_tag_entity::ActiveModel {
    record_tag_entity::ActiveModel {
        id: Set(id),
        record_id: Set(record_id),
        tag: Set(tag.to_string()),
    }
}

fn parse_instant(raw: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").expect("fixture timestamp")
}

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(CreateRecordTables)]
    }
}

pub struct CreateRecordTables;

impl MigrationName for CreateRecordTables {
    fn name(&self) -> &'static str {
        "m20240101_000001_create_record_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for CreateRecordTables {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let records = Table::create()
            .table(RecordsTable)
            .if_not_exists()
            .col(
                ColumnDef::new(RecordColumn::Id)
                    .integer()
                    .not_null()
                    .auto_increment()
                    .primary_key(),
            )
            .col(ColumnDef::new(RecordColumn::EventAt).date_time().null())
            .col(ColumnDef::new(RecordColumn::Amount).double().null())
            .col(ColumnDef::new(RecordColumn::Label).text().null())
            .col(ColumnDef::new(RecordColumn::Category).string().null())
            .to_owned();
        manager.create_table(records).await?;

        let record_tags = Table::create()
            .table(RecordTagsTable)
            .if_not_exists()
            .col(
                ColumnDef::new(TagColumn::Id)
                    .integer()
                    .not_null()
                    .auto_increment()
                    .primary_key(),
            )
            .col(ColumnDef::new(TagColumn::RecordId).integer().not_null())
            .col(ColumnDef::new(TagColumn::Tag).text().not_null())
            .to_owned();
        manager.create_table(record_tags).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RecordTagsTable).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RecordsTable).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(Debug)]
pub enum RecordColumn {
    Id,
    EventAt,
    Amount,
    Label,
    Category,
}

impl Iden for RecordColumn {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        write!(
            s,
            "{}",
            match self {
                Self::Id => "id",
                Self::EventAt => "event_at",
                Self::Amount => "amount",
                Self::Label => "label",
                Self::Category => "category",
            }
        )
        .unwrap();
    }
}

#[derive(Debug)]
pub struct RecordsTable;

impl Iden for RecordsTable {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        write!(s, "records").unwrap();
    }
}

#[derive(Debug)]
pub enum TagColumn {
    Id,
    RecordId,
    Tag,
}

impl Iden for TagColumn {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        write!(
            s,
            "{}",
            match self {
                Self::Id => "id",
                Self::RecordId => "record_id",
                Self::Tag => "tag",
            }
        )
        .unwrap();
    }
}

#[derive(Debug)]
pub struct RecordTagsTable;

impl Iden for RecordTagsTable {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        write!(s, "record_tags").unwrap();
    }
}
