use engine::{Chat, User};
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup};

use crate::{
    callback::Action,
    pagination::{self, Layout},
};

pub(crate) const MY_GROUPS: &str = "My groups";

pub(crate) fn menu_text() -> &'static str {
    "Main menu. Pick a group to manage it."
}

pub(crate) fn menu_keyboard() -> KeyboardMarkup {
    let mut kb = KeyboardMarkup::new(vec![vec![KeyboardButton::new(MY_GROUPS)]]);
    kb.resize_keyboard = true;
    kb
}

fn button(text: impl Into<String>, action: Action) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text, action.pack())
}

fn chat_label(chat: &Chat) -> String {
    if chat.title.is_empty() {
        format!("Group {}", chat.id)
    } else {
        chat.title.clone()
    }
}

/// `None` when the user has no group at all.
pub(crate) fn render_groups(chats: &[Chat], page: u32) -> Option<(String, InlineKeyboardMarkup)> {
    if chats.is_empty() {
        return None;
    }

    let page = pagination::paginate(chats, page);
    let kb = pagination::keyboard(
        &page,
        |chat| button(chat_label(chat), Action::Group { chat_id: chat.id }),
        |page| Action::Groups { page },
        Layout {
            add: None,
            back: None,
        },
    );
    Some(("My groups".to_string(), kb))
}

pub(crate) fn render_group(chat: &Chat, user_id: i64) -> (String, InlineKeyboardMarkup) {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = Vec::new();
    rows.push(vec![button(
        "Functions",
        Action::Functions {
            chat_id: chat.id,
            page: 1,
        },
    )]);
    if chat.is_owned_by(user_id) {
        rows.push(vec![button(
            "Managers",
            Action::Managers {
                chat_id: chat.id,
                page: 1,
            },
        )]);
        rows.push(vec![button(
            "Transfer ownership",
            Action::ChangeOwner { chat_id: chat.id },
        )]);
    }
    rows.push(vec![button("⬅️ Back", Action::Groups { page: 1 })]);

    (
        format!("Group menu: {}", chat_label(chat)),
        InlineKeyboardMarkup::new(rows),
    )
}

pub(crate) fn render_managers(
    chat: &Chat,
    managers: &[User],
    page: u32,
) -> (String, InlineKeyboardMarkup) {
    let page = pagination::paginate(managers, page);
    let kb = pagination::keyboard(
        &page,
        |manager| {
            button(
                manager.full_name.clone(),
                Action::Manager {
                    chat_id: chat.id,
                    manager_id: manager.id,
                },
            )
        },
        |page| Action::Managers {
            chat_id: chat.id,
            page,
        },
        Layout {
            add: Some(button("➕ Add", Action::AddManager { chat_id: chat.id })),
            back: Some(button("⬅️ Back", Action::Group { chat_id: chat.id })),
        },
    );

    let text = if managers.is_empty() {
        format!("{} has no managers yet.", chat_label(chat))
    } else {
        format!("Managers of {}", chat_label(chat))
    };
    (text, kb)
}

pub(crate) fn render_manager(chat: &Chat, manager: &User) -> (String, InlineKeyboardMarkup) {
    let kb = InlineKeyboardMarkup::new(vec![
        vec![button(
            "Remove",
            Action::RemoveManager {
                chat_id: chat.id,
                manager_id: manager.id,
            },
        )],
        vec![button(
            "⬅️ Back",
            Action::Managers {
                chat_id: chat.id,
                page: 1,
            },
        )],
    ]);
    (
        format!("Manager {} of {}", manager.full_name, chat_label(chat)),
        kb,
    )
}

pub(crate) fn no_groups_text() -> &'static str {
    "You have no groups"
}

pub(crate) fn not_implemented_text() -> &'static str {
    "Not implemented yet."
}
