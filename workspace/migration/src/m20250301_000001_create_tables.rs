use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create courses table
        manager
            .create_table(
                Table::create()
                    .table(Courses::Table)
                    .if_not_exists()
                    .col(pk_auto(Courses::Id))
                    .col(string_len(Courses::Name, 100))
                    .col(string_len_null(Courses::Description, 255))
                    .col(string_len(Courses::Code, 20).unique_key())
                    .to_owned(),
            )
            .await?;

        // Create students table
        manager
            .create_table(
                Table::create()
                    .table(Students::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Students::Id)
                            .string_len(20)
                            .not_null()
                            .primary_key(),
                    )
                    .col(string_len(Students::Name, 100))
                    .col(string_len(Students::LastName, 100))
                    .col(string_len(Students::Address, 255))
                    .col(string_len(Students::Phone, 30))
                    .col(integer_null(Students::CourseId))
                    // Courses are only deleted after their students were unlinked,
                    // so a dangling reference is a bug and must fail loudly.
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_students_course")
                            .from(Students::Table, Students::CourseId)
                            .to(Courses::Table, Courses::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_students_course_id")
                    .table(Students::Table)
                    .col(Students::CourseId)
                    .to_owned(),
            )
            .await?;

        // Create accounts table
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(pk_auto(Accounts::Id))
                    .col(string_len(Accounts::Username, 50).unique_key())
                    .col(string_len(Accounts::Email, 100).unique_key())
                    .col(string(Accounts::PasswordHash))
                    .col(string_len(Accounts::DisplayName, 100))
                    .col(string_len(Accounts::Role, 20))
                    .col(boolean(Accounts::Active).default(true))
                    .col(timestamp_with_time_zone(Accounts::CreatedAt))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order to avoid foreign key constraints
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Students::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Courses::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Courses {
    Table,
    Id,
    Name,
    Description,
    Code,
}

#[derive(DeriveIden)]
enum Students {
    Table,
    Id,
    Name,
    LastName,
    Address,
    Phone,
    CourseId,
}

#[derive(DeriveIden)]
enum Accounts {
    Table,
    Id,
    Username,
    Email,
    PasswordHash,
    DisplayName,
    Role,
    Active,
    CreatedAt,
}
