//! Multi-step flows that wait for the user to point at somebody.
//!
//! Both flows expect a shared contact or a forwarded message. Anything else
//! re-prompts and keeps the flow alive. A reference to a user that hides
//! their identity aborts the flow, since it can never become usable.

use engine::{Dialog, DialogData, DialogState};
use teloxide::types::{Message, MessageOrigin, UserId};

use crate::user_key;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Flow {
    TransferOwnership,
    AddManager,
}

impl Flow {
    pub(crate) fn from_state(state: DialogState) -> Option<Self> {
        match state {
            DialogState::Idle => None,
            DialogState::AwaitingNewOwner => Some(Self::TransferOwnership),
            DialogState::AwaitingNewManager => Some(Self::AddManager),
        }
    }

    pub(crate) fn state(self) -> DialogState {
        match self {
            Self::TransferOwnership => DialogState::AwaitingNewOwner,
            Self::AddManager => DialogState::AwaitingNewManager,
        }
    }

    /// Dialog to persist when the flow starts for `chat_id`.
    pub(crate) fn begin(self, chat_id: i64) -> Dialog {
        Dialog::new(self.state(), DialogData::with_chat_id(chat_id))
    }

    pub(crate) fn prompt(self) -> &'static str {
        match self {
            Self::TransferOwnership => {
                "Send the contact of the new owner or forward any message they wrote."
            }
            Self::AddManager => {
                "Send the contact of the new manager or forward any message they wrote."
            }
        }
    }

    pub(crate) fn hidden_identity(self) -> &'static str {
        match self {
            Self::TransferOwnership => {
                "This user hides their account in forwarded messages. Ownership was not transferred."
            }
            Self::AddManager => {
                "This user hides their account in forwarded messages. No manager was added."
            }
        }
    }
}

/// What an incoming message points at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Target {
    User { id: i64, full_name: String },
    Hidden,
    Invalid,
}

impl Target {
    pub(crate) fn from_message(msg: &Message) -> Self {
        if let Some(contact) = msg.contact() {
            return Self::from_contact(
                contact.user_id,
                &contact.first_name,
                contact.last_name.as_deref(),
            );
        }

        match msg.forward_origin() {
            Some(MessageOrigin::User { sender_user, .. }) => Self::from_user(
                sender_user.id,
                &sender_user.first_name,
                sender_user.last_name.as_deref(),
            ),
            Some(MessageOrigin::HiddenUser { .. }) => Self::Hidden,
            // Forwards from chats and channels do not name a person.
            Some(_) | None => Self::Invalid,
        }
    }

    /// Contacts not bound to a Telegram account carry no user id.
    pub(crate) fn from_contact(user_id: Option<UserId>, first: &str, last: Option<&str>) -> Self {
        match user_id {
            Some(id) => Self::from_user(id, first, last),
            None => Self::Hidden,
        }
    }

    fn from_user(id: UserId, first: &str, last: Option<&str>) -> Self {
        match user_key(id.0) {
            Ok(id) => Self::User {
                id,
                full_name: full_name(first, last),
            },
            Err(_) => Self::Invalid,
        }
    }
}

pub(crate) fn full_name(first: &str, last: Option<&str>) -> String {
    format!("{} {}", first, last.unwrap_or_default())
        .trim()
        .to_string()
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Step {
    /// No flow is running; the message is not for us.
    Ignore,
    /// Keep waiting.
    Reprompt(Flow),
    /// Give up and go back to idle.
    Abort(Flow),
    /// The flow lost the chat it was started for.
    Lost(Flow),
    Apply {
        flow: Flow,
        chat_id: i64,
        target_id: i64,
        target_name: String,
    },
}

pub(crate) fn step(dialog: &Dialog, target: Target) -> Step {
    let Some(flow) = Flow::from_state(dialog.state) else {
        return Step::Ignore;
    };
    let Some(chat_id) = dialog.pending_chat_id() else {
        return Step::Lost(flow);
    };

    match target {
        Target::Invalid => Step::Reprompt(flow),
        Target::Hidden => Step::Abort(flow),
        Target::User { id, full_name } => Step::Apply {
            flow,
            chat_id,
            target_id: id,
            target_name: full_name,
        },
    }
}
