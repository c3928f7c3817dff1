//! Per-user dialog record: the conversation cursor plus its payload.
//!
//! The record is keyed by user only, so a user runs at most one flow at a
//! time. Starting a new flow overwrites the previous payload.

use sea_orm::entity::prelude::*;
use serde_json::{Map, Value};

use crate::{EngineError, ResultEngine};

const CHAT_ID_KEY: &str = "chat_id";

/// Where the user currently is in a multi-step flow.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DialogState {
    #[default]
    Idle,
    AwaitingNewOwner,
    AwaitingNewManager,
}

impl DialogState {
    /// Storage representation. `Idle` is persisted as `NULL`.
    pub fn as_storage(self) -> Option<&'static str> {
        match self {
            Self::Idle => None,
            Self::AwaitingNewOwner => Some("awaiting_new_owner"),
            Self::AwaitingNewManager => Some("awaiting_new_manager"),
        }
    }

    pub fn from_storage(value: Option<&str>) -> ResultEngine<Self> {
        match value {
            None => Ok(Self::Idle),
            Some("awaiting_new_owner") => Ok(Self::AwaitingNewOwner),
            Some("awaiting_new_manager") => Ok(Self::AwaitingNewManager),
            Some(other) => Err(EngineError::InvalidState(other.to_string())),
        }
    }

    pub fn is_idle(self) -> bool {
        self == Self::Idle
    }
}

/// Opaque key-value payload attached to a dialog.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DialogData(Map<String, Value>);

impl DialogData {
    pub fn with_chat_id(chat_id: i64) -> Self {
        let mut map = Map::new();
        map.insert(CHAT_ID_KEY.to_string(), Value::from(chat_id));
        Self(map)
    }

    pub fn chat_id(&self) -> Option<i64> {
        self.0.get(CHAT_ID_KEY).and_then(Value::as_i64)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: &str, value: Value) {
        self.0.insert(key.to_string(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn into_json(self) -> Json {
        Value::Object(self.0)
    }

    pub(crate) fn from_json(value: Json) -> ResultEngine<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::default()),
            other => Err(EngineError::InvalidState(format!(
                "dialog data must be an object, got {other}"
            ))),
        }
    }
}

/// Snapshot of a user's dialog record.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dialog {
    pub state: DialogState,
    pub data: DialogData,
}

impl Dialog {
    pub fn new(state: DialogState, data: DialogData) -> Self {
        Self { state, data }
    }

    /// Chat the pending flow targets. Only trusted while a flow is running.
    pub fn pending_chat_id(&self) -> Option<i64> {
        if self.state.is_idle() {
            return None;
        }
        self.data.chat_id()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users_dialog")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,
    pub state: Option<String>,
    pub data: Json,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::TelegramId",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Dialog {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            state: DialogState::from_storage(model.state.as_deref())?,
            data: DialogData::from_json(model.data)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn states_survive_storage() {
        for state in [
            DialogState::Idle,
            DialogState::AwaitingNewOwner,
            DialogState::AwaitingNewManager,
        ] {
            assert_eq!(DialogState::from_storage(state.as_storage()).unwrap(), state);
        }
    }

    #[test]
    fn unknown_state_is_rejected() {
        let err = DialogState::from_storage(Some("change_owner")).unwrap_err();
        assert_eq!(err, EngineError::InvalidState("change_owner".to_string()));
    }

    #[test]
    fn pending_chat_is_hidden_while_idle() {
        let dialog = Dialog::new(DialogState::Idle, DialogData::with_chat_id(-100));
        assert_eq!(dialog.pending_chat_id(), None);

        let dialog = Dialog::new(DialogState::AwaitingNewOwner, DialogData::with_chat_id(-100));
        assert_eq!(dialog.pending_chat_id(), Some(-100));
    }

    #[test]
    fn data_must_be_an_object() {
        assert!(DialogData::from_json(Value::from(3)).is_err());
        assert!(DialogData::from_json(Value::Null).unwrap().is_empty());
    }
}
