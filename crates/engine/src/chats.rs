//! Group chats registered by the bot.
//!
//! The owner is tracked on the chat row itself and never as a membership.

use sea_orm::entity::prelude::*;

/// A registered group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chat {
    pub id: i64,
    pub owner_id: i64,
    pub title: String,
}

impl Chat {
    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.owner_id == user_id
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "chats")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub telegram_id: i64,
    pub owner_id: i64,
    pub title: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::OwnerId",
        to = "super::users::Column::TelegramId",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Owner,
    #[sea_orm(has_many = "super::chat_users::Entity")]
    Memberships,
}

impl Related<super::chat_users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Memberships.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Chat {
    fn from(model: Model) -> Self {
        Self {
            id: model.telegram_id,
            owner_id: model.owner_id,
            title: model.title,
        }
    }
}
