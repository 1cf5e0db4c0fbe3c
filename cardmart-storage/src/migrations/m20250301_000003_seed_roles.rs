use sea_orm_migration::prelude::*;

/// The closed role set, seeded once
pub const SEEDED_ROLE_NAMES: [&str; 3] = ["Admin", "Employee", "Customer"];

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut insert = Query::insert();
        insert.into_table(Roles::Table).columns([Roles::Name]);
        for name in SEEDED_ROLE_NAMES {
            insert.values_panic([name.into()]);
        }
        insert.on_conflict(OnConflict::column(Roles::Name).do_nothing().to_owned());

        manager.exec_stmt(insert).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let delete = Query::delete()
            .from_table(Roles::Table)
            .and_where(Expr::col(Roles::Name).is_in(SEEDED_ROLE_NAMES))
            .to_owned();

        manager.exec_stmt(delete).await
    }
}

#[derive(DeriveIden)]
enum Roles {
    Table,
    Name,
}
