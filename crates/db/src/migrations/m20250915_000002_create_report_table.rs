//! Create report table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Report::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Report::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Report::Title).string_len(200).not_null())
                    .col(ColumnDef::new(Report::Description).text().not_null())
                    .col(ColumnDef::new(Report::Address).string_len(500).not_null())
                    .col(ColumnDef::new(Report::Image).string_len(1024))
                    .col(ColumnDef::new(Report::CategoryId).integer().not_null())
                    .col(ColumnDef::new(Report::UserId).string_len(64))
                    .col(ColumnDef::new(Report::Status).integer().not_null().default(1))
                    .col(ColumnDef::new(Report::AdminNotes).text())
                    .col(
                        ColumnDef::new(Report::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Report::UpdatedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Report::ResolvedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Report::ContactEmail).string_len(256))
                    .col(ColumnDef::new(Report::ContactPhone).string_len(32))
                    .col(ColumnDef::new(Report::Version).integer().not_null().default(0))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_category")
                            .from(Report::Table, Report::CategoryId)
                            .to(Category::Table, Category::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: status (dashboard breakdowns, status filter)
        manager
            .create_index(
                Index::create()
                    .name("idx_report_status")
                    .table(Report::Table)
                    .col(Report::Status)
                    .to_owned(),
            )
            .await?;

        // Index: created_at (date-window filters, default sort)
        manager
            .create_index(
                Index::create()
                    .name("idx_report_created_at")
                    .table(Report::Table)
                    .col(Report::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Index: user_id (per-user listing, anonymous filter)
        manager
            .create_index(
                Index::create()
                    .name("idx_report_user_id")
                    .table(Report::Table)
                    .col(Report::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Report::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Report {
    Table,
    Id,
    Title,
    Description,
    Address,
    Image,
    CategoryId,
    UserId,
    Status,
    AdminNotes,
    CreatedAt,
    UpdatedAt,
    ResolvedAt,
    ContactEmail,
    ContactPhone,
    Version,
}

#[derive(DeriveIden)]
enum Category {
    Table,
    Id,
}
