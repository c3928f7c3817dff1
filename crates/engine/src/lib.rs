//! Directory store and permission authority for group chats.
//!
//! The engine owns users, chats, role grants and the per-user dialog record.
//! Every mutation runs in its own database transaction.

pub use chat_users::Role;
pub use chats::Chat;
pub use error::EngineError;
pub use ops::{Engine, EngineBuilder};
pub use user_dialogs::{Dialog, DialogData, DialogState};
pub use users::User;

mod chat_users;
mod chats;
mod error;
mod ops;
mod user_dialogs;
mod users;

type ResultEngine<T> = Result<T, EngineError>;
