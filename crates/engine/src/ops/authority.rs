//! Who may act on behalf of a chat.
//!
//! The owner is the `owner_id` of the chat row; managers are `chats_users`
//! rows with role `manager`. The owner never carries a membership row, so
//! manager queries and removals cannot touch the owner's authority.

use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{Chat, EngineError, ResultEngine, Role, User, chat_users, users};

use super::{
    Engine,
    directory::{require_chat, require_user, upsert_membership},
    with_tx,
};

impl Engine {
    pub fn is_owner(&self, chat: &Chat, user_id: i64) -> bool {
        chat.is_owned_by(user_id)
    }

    /// True iff the user owns the chat or holds a manager row in it.
    pub async fn can_manage(&self, chat: &Chat, user_id: i64) -> ResultEngine<bool> {
        if chat.is_owned_by(user_id) {
            return Ok(true);
        }
        self.is_manager(chat.id, user_id).await
    }

    /// True iff the user holds a manager row in the chat. The owner is not a
    /// manager.
    pub async fn is_manager(&self, chat_id: i64, user_id: i64) -> ResultEngine<bool> {
        let row = chat_users::Entity::find()
            .filter(chat_users::Column::ChatId.eq(chat_id))
            .filter(chat_users::Column::UserId.eq(user_id))
            .filter(chat_users::Column::Role.eq(Role::Manager.as_str()))
            .one(&self.database)
            .await?;
        Ok(row.is_some())
    }

    /// Managers of the chat, ordered by grant time.
    pub async fn list_managers(&self, chat_id: i64) -> ResultEngine<Vec<User>> {
        let rows = chat_users::Entity::find()
            .filter(chat_users::Column::ChatId.eq(chat_id))
            .filter(chat_users::Column::Role.eq(Role::Manager.as_str()))
            .order_by_asc(chat_users::Column::CreatedAt)
            .order_by_asc(chat_users::Column::UserId)
            .find_also_related(users::Entity)
            .all(&self.database)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(_, user)| user.map(User::from))
            .collect())
    }

    /// Hands the chat over to `new_owner_id`; the old owner becomes a manager.
    ///
    /// Callers must check that the requester is the current owner.
    pub async fn transfer_ownership(&self, chat_id: i64, new_owner_id: i64) -> ResultEngine<Chat> {
        with_tx!(self, |db_tx| {
            let chat = require_chat(&db_tx, chat_id).await?;
            if chat.owner_id == new_owner_id {
                return Ok(Chat::from(chat));
            }
            require_user(&db_tx, new_owner_id).await?;
            let old_owner_id = chat.owner_id;

            chat_users::Entity::delete_many()
                .filter(chat_users::Column::ChatId.eq(chat_id))
                .filter(chat_users::Column::UserId.is_in([new_owner_id, old_owner_id]))
                .exec(&db_tx)
                .await?;

            chat_users::ActiveModel {
                chat_id: ActiveValue::Set(chat_id),
                user_id: ActiveValue::Set(old_owner_id),
                role: ActiveValue::Set(Role::Manager.as_str().to_string()),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;

            let mut active: crate::chats::ActiveModel = chat.into();
            active.owner_id = ActiveValue::Set(new_owner_id);
            let chat = active.update(&db_tx).await?;

            Ok(Chat::from(chat))
        })
    }

    /// Grants the manager role. Re-adding an existing manager changes nothing.
    pub async fn add_manager(&self, chat_id: i64, user_id: i64) -> ResultEngine<Chat> {
        with_tx!(self, |db_tx| {
            let chat = require_chat(&db_tx, chat_id).await?;
            if chat.owner_id == user_id {
                return Err(EngineError::InvalidRole(
                    "chat owner cannot be a manager".to_string(),
                ));
            }
            require_user(&db_tx, user_id).await?;
            upsert_membership(&db_tx, chat_id, user_id, Role::Manager).await?;
            Ok(Chat::from(chat))
        })
    }

    /// Drops the membership row of `user_id`, if any.
    pub async fn remove_manager(&self, chat_id: i64, user_id: i64) -> ResultEngine<Chat> {
        with_tx!(self, |db_tx| {
            let chat = require_chat(&db_tx, chat_id).await?;
            chat_users::Entity::delete_by_id((chat_id, user_id))
                .exec(&db_tx)
                .await?;
            Ok(Chat::from(chat))
        })
    }
}
