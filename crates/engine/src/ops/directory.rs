use std::collections::HashSet;

use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};

use crate::{
    Chat, EngineError, ResultEngine, Role, User, chat_users, chats, user_dialogs::DialogData,
    user_dialogs, users,
};

use super::{Engine, with_tx};

impl Engine {
    pub async fn get_user(&self, user_id: i64) -> ResultEngine<Option<User>> {
        let model = users::Entity::find_by_id(user_id)
            .one(&self.database)
            .await?;
        Ok(model.map(User::from))
    }

    /// Returns the user, creating it (and its idle dialog record) on first sight.
    pub async fn get_or_create_user(&self, user_id: i64, full_name: &str) -> ResultEngine<User> {
        with_tx!(self, |db_tx| {
            match users::Entity::find_by_id(user_id).one(&db_tx).await? {
                Some(model) => Ok(User::from(model)),
                None => {
                    let model = users::ActiveModel {
                        telegram_id: ActiveValue::Set(user_id),
                        full_name: ActiveValue::Set(full_name.to_string()),
                    }
                    .insert(&db_tx)
                    .await?;

                    user_dialogs::ActiveModel {
                        user_id: ActiveValue::Set(user_id),
                        state: ActiveValue::Set(None),
                        data: ActiveValue::Set(DialogData::default().into_json()),
                    }
                    .insert(&db_tx)
                    .await?;

                    Ok(User::from(model))
                }
            }
        })
    }

    pub async fn get_chat(&self, chat_id: i64) -> ResultEngine<Option<Chat>> {
        let model = chats::Entity::find_by_id(chat_id)
            .one(&self.database)
            .await?;
        Ok(model.map(Chat::from))
    }

    /// Registers a chat with its owner. Fails if the chat is already known.
    pub async fn create_chat(&self, chat_id: i64, title: &str, owner_id: i64) -> ResultEngine<Chat> {
        with_tx!(self, |db_tx| {
            if chats::Entity::find_by_id(chat_id).one(&db_tx).await?.is_some() {
                return Err(EngineError::ExistingKey(chat_id.to_string()));
            }
            require_user(&db_tx, owner_id).await?;

            let model = chats::ActiveModel {
                telegram_id: ActiveValue::Set(chat_id),
                owner_id: ActiveValue::Set(owner_id),
                title: ActiveValue::Set(title.to_string()),
            }
            .insert(&db_tx)
            .await?;
            Ok(Chat::from(model))
        })
    }

    pub async fn set_chat_title(&self, chat_id: i64, title: &str) -> ResultEngine<Chat> {
        with_tx!(self, |db_tx| {
            let model = require_chat(&db_tx, chat_id).await?;
            if model.title == title {
                return Ok(Chat::from(model));
            }
            let mut active: chats::ActiveModel = model.into();
            active.title = ActiveValue::Set(title.to_string());
            let model = active.update(&db_tx).await?;
            Ok(Chat::from(model))
        })
    }

    /// Chats the user owns, followed by chats the user manages.
    pub async fn chats_for_user(&self, user_id: i64) -> ResultEngine<Vec<Chat>> {
        let owned = chats::Entity::find()
            .filter(chats::Column::OwnerId.eq(user_id))
            .order_by_asc(chats::Column::TelegramId)
            .all(&self.database)
            .await?;

        let granted = chat_users::Entity::find()
            .filter(chat_users::Column::UserId.eq(user_id))
            .filter(chat_users::Column::Role.eq(Role::Manager.as_str()))
            .order_by_asc(chat_users::Column::CreatedAt)
            .order_by_asc(chat_users::Column::ChatId)
            .find_also_related(chats::Entity)
            .all(&self.database)
            .await?;

        let mut seen = HashSet::new();
        let mut out = Vec::with_capacity(owned.len() + granted.len());
        let granted = granted.into_iter().filter_map(|(_, chat)| chat);
        for model in owned.into_iter().chain(granted) {
            if seen.insert(model.telegram_id) {
                out.push(Chat::from(model));
            }
        }
        Ok(out)
    }

    /// Inserts or overwrites the membership row of `user_id` in `chat_id`.
    pub async fn add_member(&self, chat_id: i64, user_id: i64, role: Role) -> ResultEngine<Chat> {
        with_tx!(self, |db_tx| {
            let chat = require_chat(&db_tx, chat_id).await?;
            if chat.owner_id == user_id {
                return Err(EngineError::InvalidRole(
                    "chat owner cannot hold a membership".to_string(),
                ));
            }
            require_user(&db_tx, user_id).await?;
            upsert_membership(&db_tx, chat_id, user_id, role).await?;
            Ok(Chat::from(chat))
        })
    }
}

pub(super) async fn require_chat(db: &DatabaseTransaction, chat_id: i64) -> ResultEngine<chats::Model> {
    chats::Entity::find_by_id(chat_id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound("chat not exists".to_string()))
}

pub(super) async fn require_user(db: &DatabaseTransaction, user_id: i64) -> ResultEngine<users::Model> {
    users::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))
}

pub(super) async fn upsert_membership(
    db: &DatabaseTransaction,
    chat_id: i64,
    user_id: i64,
    role: Role,
) -> ResultEngine<()> {
    // Upsert: insert if missing, otherwise update role and keep the grant time.
    match chat_users::Entity::find_by_id((chat_id, user_id)).one(db).await? {
        Some(model) => {
            if model.role()? != role {
                let mut active: chat_users::ActiveModel = model.into();
                active.role = ActiveValue::Set(role.as_str().to_string());
                active.update(db).await?;
            }
        }
        None => {
            chat_users::ActiveModel {
                chat_id: ActiveValue::Set(chat_id),
                user_id: ActiveValue::Set(user_id),
                role: ActiveValue::Set(role.as_str().to_string()),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(db)
            .await?;
        }
    }
    Ok(())
}
