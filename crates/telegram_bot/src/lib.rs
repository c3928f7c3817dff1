//! Telegram bot.
//!
//! Owners and managers administer their groups from a private chat with the
//! bot; in the groups themselves the bot registers ownership when promoted
//! and restricts members as they join.

use std::{sync::Arc, time::Duration};

use engine::Engine;
use teloxide::{
    prelude::*,
    types::AllowedUpdate,
    update_listeners::Polling,
    utils::command::BotCommands,
};

mod callback;
mod commands;
mod dialog;
mod error;
mod gateway;
mod handlers;
mod navigation;
mod pagination;
mod reactors;
mod ui;

pub use callback::CallbackParseError;
pub use error::BotError;
pub use reactors::{RestrictionMode, RestrictionPolicy, UnknownPermission, parse_permissions};

const DEFAULT_POLLING_TIMEOUT: Duration = Duration::from_secs(10);

/// Store key of a Telegram user.
pub(crate) fn user_key(id: u64) -> Result<i64, BotError> {
    i64::try_from(id).map_err(|_| BotError::IdOutOfRange(id))
}

#[derive(Clone)]
pub(crate) struct ConfigParameters {
    engine: Engine,
    policy: Arc<RestrictionPolicy>,
    bot_id: u64,
    bot_username: String,
}

pub struct Bot {
    token: String,
    engine: Engine,
    policy: Arc<RestrictionPolicy>,
    polling_timeout: Duration,
}

impl Bot {
    pub fn builder() -> BotBuilder {
        BotBuilder::default()
    }

    /// Long polls until interrupted with ctrl-c.
    pub async fn run(&self) -> Result<(), BotError> {
        tracing::info!("Starting telegram bot...");

        let bot = teloxide::Bot::new(&self.token);
        let me = bot.get_me().await?;
        bot.set_my_commands(commands::Command::bot_commands())
            .await?;
        tracing::info!(
            bot_id = me.user.id.0,
            username = me.username(),
            mode = ?self.policy.mode(),
            "authenticated"
        );

        let parameters = ConfigParameters {
            engine: self.engine.clone(),
            policy: Arc::clone(&self.policy),
            bot_id: me.user.id.0,
            bot_username: me.username().to_string(),
        };

        let handler = dptree::entry()
            .branch(Update::filter_message().endpoint(handlers::handle_message))
            .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
            .branch(Update::filter_my_chat_member().endpoint(handlers::handle_my_chat_member))
            .branch(Update::filter_chat_member().endpoint(handlers::handle_chat_member));

        // Member updates are only delivered when asked for explicitly.
        let listener = Polling::builder(bot.clone())
            .timeout(self.polling_timeout)
            .allowed_updates(vec![
                AllowedUpdate::Message,
                AllowedUpdate::CallbackQuery,
                AllowedUpdate::MyChatMember,
                AllowedUpdate::ChatMember,
            ])
            .delete_webhook()
            .await
            .build();

        Dispatcher::builder(bot, handler)
            .dependencies(dptree::deps![parameters])
            .default_handler(|upd| async move {
                tracing::warn!("Unhandled update: {:?}", upd);
            })
            .error_handler(LoggingErrorHandler::with_custom_text(
                "An error has occurred in the dispatcher",
            ))
            .enable_ctrlc_handler()
            .build()
            .dispatch_with_listener(
                listener,
                LoggingErrorHandler::with_custom_text("An error from the update listener"),
            )
            .await;

        Ok(())
    }
}

#[derive(Default)]
pub struct BotBuilder {
    token: String,
    engine: Option<Engine>,
    policy: RestrictionPolicy,
    polling_timeout: Option<Duration>,
}

impl BotBuilder {
    pub fn token(mut self, token: &str) -> BotBuilder {
        self.token = token.to_string();
        self
    }

    pub fn engine(mut self, engine: Engine) -> BotBuilder {
        self.engine = Some(engine);
        self
    }

    pub fn policy(mut self, policy: RestrictionPolicy) -> BotBuilder {
        self.policy = policy;
        self
    }

    pub fn polling_timeout(mut self, timeout: Duration) -> BotBuilder {
        self.polling_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<Bot, String> {
        tracing::info!("Initializing telegram bot...");
        if self.token.is_empty() {
            return Err("telegram token is empty".to_string());
        }
        let engine = self
            .engine
            .ok_or_else(|| "telegram bot needs an engine".to_string())?;

        Ok(Bot {
            token: self.token,
            engine,
            policy: Arc::new(self.policy),
            polling_timeout: self.polling_timeout.unwrap_or(DEFAULT_POLLING_TIMEOUT),
        })
    }
}
