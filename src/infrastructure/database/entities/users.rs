// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    #[sea_orm(unique)]
    pub api_key: String,
    pub role: String,
    pub webhook_url: Option<String>,
    pub usage_limit: i64,
    pub usage_count: i64,
    pub created_at: ChronoDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::scrapers::Entity")]
    Scrapers,
    #[sea_orm(has_many = "super::scrape_records::Entity")]
    ScrapeRecords,
}

impl Related<super::scrapers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Scrapers.def()
    }
}

impl Related<super::scrape_records::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ScrapeRecords.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
