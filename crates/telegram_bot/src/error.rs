use engine::EngineError;
use thiserror::Error;

use crate::callback::CallbackParseError;

#[derive(Debug, Error)]
pub enum BotError {
    #[error("user {user_id} is not allowed to manage chat {chat_id}")]
    NotAuthorized { chat_id: i64, user_id: i64 },
    #[error("{0} not found")]
    NotFound(String),
    #[error("the referenced user hides their identity")]
    UnresolvableIdentity,
    #[error("telegram id {0} does not fit a store key")]
    IdOutOfRange(u64),
    #[error(transparent)]
    Callback(#[from] CallbackParseError),
    #[error(transparent)]
    Gateway(#[from] teloxide::RequestError),
    #[error(transparent)]
    Store(#[from] EngineError),
}

pub(crate) type HandlerResult = Result<(), BotError>;
