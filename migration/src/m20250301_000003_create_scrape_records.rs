use sea_orm_migration::prelude::*;

use crate::m20250301_000001_create_users::Users;
use crate::m20250301_000002_create_scrapers::Scrapers;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ScrapeRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ScrapeRecords::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ScrapeRecords::ScraperId).uuid().not_null())
                    .col(ColumnDef::new(ScrapeRecords::UserId).uuid().not_null())
                    .col(ColumnDef::new(ScrapeRecords::Url).text().not_null())
                    .col(ColumnDef::new(ScrapeRecords::Payload).json().not_null())
                    .col(ColumnDef::new(ScrapeRecords::Status).string().not_null())
                    .col(ColumnDef::new(ScrapeRecords::Error).text().null())
                    .col(
                        ColumnDef::new(ScrapeRecords::ExecutionTimeMs)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ScrapeRecords::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_scrape_records_scraper_id")
                            .from(ScrapeRecords::Table, ScrapeRecords::ScraperId)
                            .to(Scrapers::Table, Scrapers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_scrape_records_user_id")
                            .from(ScrapeRecords::Table, ScrapeRecords::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_scrape_records_scraper_created")
                    .table(ScrapeRecords::Table)
                    .col(ScrapeRecords::ScraperId)
                    .col(ScrapeRecords::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_scrape_records_user_created")
                    .table(ScrapeRecords::Table)
                    .col(ScrapeRecords::UserId)
                    .col(ScrapeRecords::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ScrapeRecords::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ScrapeRecords {
    Table,
    Id,
    ScraperId,
    UserId,
    Url,
    Payload,
    Status,
    Error,
    ExecutionTimeMs,
    CreatedAt,
}
