use teloxide::{
    ApiError, RequestError,
    prelude::*,
    types::{CallbackQueryId, ChatMemberUpdated, MessageId, ReplyMarkup, User as TgUser},
};
use tracing::Instrument;

use crate::{
    ConfigParameters,
    callback::Action,
    commands::parse_command,
    dialog::{self, Target},
    error::{BotError, HandlerResult},
    gateway::Gateway,
    navigation::{self, Outcome},
    reactors::{self, MemberEvent, Person},
    ui, user_key,
};

const DENIED_TEXT: &str = "You are not allowed to manage this group.";
const MISSING_TEXT: &str = "This group or user is no longer known to the bot.";

pub(crate) async fn handle_message(bot: Bot, msg: Message, cfg: ConfigParameters) -> HandlerResult {
    if !msg.chat.is_private() {
        return Ok(());
    }
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };

    let user = cfg
        .engine
        .get_or_create_user(user_key(from.id.0)?, &display_name(from))
        .await?;
    let span = tracing::info_span!(
        "dialog",
        handler = "message",
        user_id = user.id,
        user_name = %user.full_name
    );

    async {
        let outcome = match msg.text() {
            Some(text) if parse_command(text, &cfg.bot_username).is_some() => {
                navigation::open_menu(&cfg.engine, &user).await?
            }
            Some(text) if text.trim() == ui::MY_GROUPS => {
                navigation::navigate(&cfg.engine, &user, Action::Groups { page: 1 }).await?
            }
            _ => navigation::handle_input(&cfg.engine, &user, Target::from_message(&msg)).await?,
        };
        reply(&bot, msg.chat.id.0, outcome).await?;
        Ok::<(), BotError>(())
    }
    .instrument(span)
    .await
}

pub(crate) async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    cfg: ConfigParameters,
) -> HandlerResult {
    let user = cfg
        .engine
        .get_or_create_user(user_key(q.from.id.0)?, &display_name(&q.from))
        .await?;
    let span = tracing::info_span!(
        "dialog",
        handler = "callback",
        user_id = user.id,
        user_name = %user.full_name
    );

    async {
        let message = q.message.as_ref().map(|m| (m.chat().id.0, m.id()));
        let outcome = match q.data.as_deref().map(str::parse::<Action>) {
            Some(Ok(action)) => navigation::navigate(&cfg.engine, &user, action).await?,
            Some(Err(err)) => {
                tracing::warn!("{}", BotError::from(err));
                Outcome::Nothing
            }
            None => Outcome::Nothing,
        };
        present(&bot, q.id.clone(), message, outcome).await?;
        Ok::<(), BotError>(())
    }
    .instrument(span)
    .await
}

/// The bot's own status changed.
pub(crate) async fn handle_my_chat_member(
    bot: Bot,
    update: ChatMemberUpdated,
    cfg: ConfigParameters,
) -> HandlerResult {
    if !(update.chat.is_group() || update.chat.is_supergroup()) {
        return Ok(());
    }
    let old = &update.old_chat_member.kind;
    let promoted = !(old.is_administrator() || old.is_owner())
        && update.new_chat_member.kind.is_administrator();
    if !promoted {
        return Ok(());
    }

    let event = member_event(&update);
    let span = tracing::info_span!("reactor", handler = "promotion", chat_id = event.chat_id);
    reactors::register_chat(&bot, &cfg.engine, cfg.bot_id, &event)
        .instrument(span)
        .await?;
    Ok(())
}

/// Somebody else's status changed.
pub(crate) async fn handle_chat_member(
    bot: Bot,
    update: ChatMemberUpdated,
    cfg: ConfigParameters,
) -> HandlerResult {
    if !(update.chat.is_group() || update.chat.is_supergroup()) {
        return Ok(());
    }
    let joined =
        !update.old_chat_member.kind.is_present() && update.new_chat_member.kind.is_present();
    if !joined {
        return Ok(());
    }

    let event = member_event(&update);
    let span = tracing::info_span!("reactor", handler = "join", chat_id = event.chat_id);
    reactors::restrict_new_member(&bot, &cfg.engine, &cfg.policy, cfg.bot_id, &event)
        .instrument(span)
        .await?;
    Ok(())
}

fn display_name(user: &TgUser) -> String {
    dialog::full_name(&user.first_name, user.last_name.as_deref())
}

fn member_event(update: &ChatMemberUpdated) -> MemberEvent {
    let person = |user: &TgUser| Person {
        id: user.id.0,
        full_name: display_name(user),
        is_bot: user.is_bot,
    };
    MemberEvent {
        chat_id: update.chat.id.0,
        chat_title: update.chat.title().unwrap_or_default().to_string(),
        actor: person(&update.from),
        member: person(&update.new_chat_member.user),
    }
}

/// Delivers an outcome as new messages in a private chat.
async fn reply<G: Gateway>(gateway: &G, chat_id: i64, outcome: Outcome) -> Result<(), RequestError> {
    match outcome {
        Outcome::Menu => {
            gateway
                .send_text(
                    chat_id,
                    ui::menu_text().to_string(),
                    Some(ReplyMarkup::Keyboard(ui::menu_keyboard())),
                )
                .await
        }
        Outcome::Screen { text, keyboard } => {
            gateway
                .send_text(chat_id, text, Some(ReplyMarkup::InlineKeyboard(keyboard)))
                .await
        }
        Outcome::Prompt(text) => gateway.send_text(chat_id, text.to_string(), None).await,
        Outcome::Notice(text) => gateway.send_text(chat_id, text, None).await,
        Outcome::Denied => gateway.send_text(chat_id, DENIED_TEXT.to_string(), None).await,
        Outcome::Missing => gateway.send_text(chat_id, MISSING_TEXT.to_string(), None).await,
        Outcome::Nothing => Ok(()),
    }
}

/// Delivers an outcome by editing the message that carried the pressed
/// button, then answers the press.
async fn present<G: Gateway>(
    gateway: &G,
    callback_id: CallbackQueryId,
    message: Option<(i64, MessageId)>,
    outcome: Outcome,
) -> Result<(), RequestError> {
    let alert = match outcome {
        Outcome::Screen { text, keyboard } => {
            edit(gateway, message, text, Some(keyboard)).await?;
            None
        }
        Outcome::Prompt(text) => {
            edit(gateway, message, text.to_string(), None).await?;
            None
        }
        Outcome::Menu => {
            if let Some((chat_id, _)) = message {
                reply(gateway, chat_id, Outcome::Menu).await?;
            }
            None
        }
        Outcome::Notice(text) => Some(text),
        Outcome::Denied => Some(DENIED_TEXT.to_string()),
        Outcome::Missing => Some(MISSING_TEXT.to_string()),
        Outcome::Nothing => None,
    };
    gateway.answer_callback(callback_id, alert).await
}

async fn edit<G: Gateway>(
    gateway: &G,
    message: Option<(i64, MessageId)>,
    text: String,
    keyboard: Option<teloxide::types::InlineKeyboardMarkup>,
) -> Result<(), RequestError> {
    let Some((chat_id, message_id)) = message else {
        return Ok(());
    };
    match gateway.edit_text(chat_id, message_id, text, keyboard).await {
        Ok(()) | Err(RequestError::Api(ApiError::MessageNotModified)) => Ok(()),
        Err(err) => Err(err),
    }
}
