use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Holds at most one row; whoever inserts it first became the administrator
        manager
            .create_table(
                Table::create()
                    .table(BootstrapMarker::Table)
                    .if_not_exists()
                    .col(integer(BootstrapMarker::Id).primary_key())
                    .col(timestamp_with_time_zone(BootstrapMarker::ClaimedAt))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BootstrapMarker::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum BootstrapMarker {
    Table,
    Id,
    ClaimedAt,
}
