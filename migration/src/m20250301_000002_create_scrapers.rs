use sea_orm_migration::prelude::*;

use crate::m20250301_000001_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Scrapers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Scrapers::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Scrapers::UserId).uuid().not_null())
                    .col(ColumnDef::new(Scrapers::Name).string().not_null())
                    .col(ColumnDef::new(Scrapers::TargetUrl).text().not_null())
                    .col(ColumnDef::new(Scrapers::Selectors).json().not_null())
                    .col(ColumnDef::new(Scrapers::Options).json().not_null())
                    .col(ColumnDef::new(Scrapers::Webhook).json().not_null())
                    .col(ColumnDef::new(Scrapers::Schedule).json().not_null())
                    .col(
                        ColumnDef::new(Scrapers::ScheduleActive)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Scrapers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Scrapers::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_scrapers_user_id")
                            .from(Scrapers::Table, Scrapers::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_scrapers_user_created")
                    .table(Scrapers::Table)
                    .col(Scrapers::UserId)
                    .col(Scrapers::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // The schedule worker only ever scans active schedules
        manager
            .create_index(
                Index::create()
                    .name("idx_scrapers_schedule_active")
                    .table(Scrapers::Table)
                    .col(Scrapers::ScheduleActive)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Scrapers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Scrapers {
    Table,
    Id,
    UserId,
    Name,
    TargetUrl,
    Selectors,
    Options,
    Webhook,
    Schedule,
    ScheduleActive,
    CreatedAt,
    UpdatedAt,
}
