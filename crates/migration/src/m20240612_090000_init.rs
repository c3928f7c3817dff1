//! Initial schema migration.
//!
//! - `users`: platform users seen by the bot
//! - `chats`: registered groups and their owner
//! - `chats_users`: explicit role grants (managers, members with history)
//! - `users_dialog`: per-user conversation state and payload

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
pub enum Users {
    Table,
    TelegramId,
    FullName,
}

#[derive(Iden)]
pub enum Chats {
    Table,
    TelegramId,
    OwnerId,
}

#[derive(Iden)]
enum ChatsUsers {
    Table,
    ChatId,
    UserId,
    Role,
    CreatedAt,
}

#[derive(Iden)]
enum UsersDialog {
    Table,
    UserId,
    State,
    Data,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::TelegramId)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::FullName).string().not_null())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Chats
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Chats::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Chats::TelegramId)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Chats::OwnerId).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-chats-owner_id")
                            .from(Chats::Table, Chats::OwnerId)
                            .to(Users::Table, Users::TelegramId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-chats-owner_id")
                    .table(Chats::Table)
                    .col(Chats::OwnerId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Role grants
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(ChatsUsers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ChatsUsers::ChatId).big_integer().not_null())
                    .col(ColumnDef::new(ChatsUsers::UserId).big_integer().not_null())
                    .col(
                        ColumnDef::new(ChatsUsers::Role)
                            .string()
                            .not_null()
                            .default("member"),
                    )
                    .col(ColumnDef::new(ChatsUsers::CreatedAt).timestamp().not_null())
                    .primary_key(
                        Index::create()
                            .col(ChatsUsers::ChatId)
                            .col(ChatsUsers::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-chats_users-chat_id")
                            .from(ChatsUsers::Table, ChatsUsers::ChatId)
                            .to(Chats::Table, Chats::TelegramId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-chats_users-user_id")
                            .from(ChatsUsers::Table, ChatsUsers::UserId)
                            .to(Users::Table, Users::TelegramId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-chats_users-user_id")
                    .table(ChatsUsers::Table)
                    .col(ChatsUsers::UserId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Dialog records
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(UsersDialog::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UsersDialog::UserId)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UsersDialog::State).string())
                    .col(ColumnDef::new(UsersDialog::Data).json().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-users_dialog-user_id")
                            .from(UsersDialog::Table, UsersDialog::UserId)
                            .to(Users::Table, Users::TelegramId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UsersDialog::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ChatsUsers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Chats::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
