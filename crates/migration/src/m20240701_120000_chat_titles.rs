use sea_orm_migration::prelude::*;

use crate::m20240612_090000_init::Chats;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum ChatTitle {
    Title,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Chats::Table)
                    .add_column(
                        ColumnDef::new(ChatTitle::Title)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Chats::Table)
                    .drop_column(ChatTitle::Title)
                    .to_owned(),
            )
            .await
    }
}
