use sea_orm::{ActiveValue, DatabaseTransaction, TransactionTrait, prelude::*};

use crate::{
    ResultEngine, user_dialogs,
    user_dialogs::{Dialog, DialogData, DialogState},
};

use super::{Engine, directory::require_user, with_tx};

impl Engine {
    /// Current dialog record of the user. A missing record reads as idle.
    pub async fn dialog(&self, user_id: i64) -> ResultEngine<Dialog> {
        let model = user_dialogs::Entity::find_by_id(user_id)
            .one(&self.database)
            .await?;
        match model {
            Some(model) => Dialog::try_from(model),
            None => Ok(Dialog::default()),
        }
    }

    pub async fn dialog_state(&self, user_id: i64) -> ResultEngine<DialogState> {
        Ok(self.dialog(user_id).await?.state)
    }

    pub async fn dialog_data(&self, user_id: i64) -> ResultEngine<DialogData> {
        Ok(self.dialog(user_id).await?.data)
    }

    pub async fn set_dialog_state(&self, user_id: i64, state: DialogState) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let mut dialog = load_dialog(&db_tx, user_id).await?;
            dialog.state = state;
            store_dialog(&db_tx, user_id, dialog).await
        })
    }

    pub async fn set_dialog_data(&self, user_id: i64, data: DialogData) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let mut dialog = load_dialog(&db_tx, user_id).await?;
            dialog.data = data;
            store_dialog(&db_tx, user_id, dialog).await
        })
    }

    /// Replaces state and payload together.
    pub async fn set_dialog(&self, user_id: i64, dialog: Dialog) -> ResultEngine<()> {
        with_tx!(self, |db_tx| { store_dialog(&db_tx, user_id, dialog).await })
    }

    /// Back to idle with an empty payload.
    pub async fn reset_dialog(&self, user_id: i64) -> ResultEngine<()> {
        self.set_dialog(user_id, Dialog::default()).await
    }
}

async fn load_dialog(db: &DatabaseTransaction, user_id: i64) -> ResultEngine<Dialog> {
    match user_dialogs::Entity::find_by_id(user_id).one(db).await? {
        Some(model) => Dialog::try_from(model),
        None => Ok(Dialog::default()),
    }
}

async fn store_dialog(db: &DatabaseTransaction, user_id: i64, dialog: Dialog) -> ResultEngine<()> {
    require_user(db, user_id).await?;

    let active = user_dialogs::ActiveModel {
        user_id: ActiveValue::Set(user_id),
        state: ActiveValue::Set(dialog.state.as_storage().map(ToString::to_string)),
        data: ActiveValue::Set(dialog.data.into_json()),
    };

    match user_dialogs::Entity::find_by_id(user_id).one(db).await? {
        Some(_) => {
            active.update(db).await?;
        }
        None => {
            active.insert(db).await?;
        }
    }
    Ok(())
}
