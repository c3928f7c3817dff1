//! The slice of the Bot API the core talks to.

use std::future::Future;

use teloxide::{
    RequestError,
    prelude::*,
    types::{
        CallbackQueryId, ChatPermissions, InlineKeyboardMarkup, MessageId, ReplyMarkup,
    },
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Administrator {
    pub id: u64,
    pub full_name: String,
    pub is_bot: bool,
    pub is_creator: bool,
}

pub(crate) trait Gateway {
    fn send_text(
        &self,
        chat_id: i64,
        text: String,
        markup: Option<ReplyMarkup>,
    ) -> impl Future<Output = Result<(), RequestError>> + Send;

    fn edit_text(
        &self,
        chat_id: i64,
        message_id: MessageId,
        text: String,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> impl Future<Output = Result<(), RequestError>> + Send;

    /// Answers a button press, as an alert when `alert` is set.
    fn answer_callback(
        &self,
        callback_id: CallbackQueryId,
        alert: Option<String>,
    ) -> impl Future<Output = Result<(), RequestError>> + Send;

    fn restrict_member(
        &self,
        chat_id: i64,
        user_id: u64,
        permissions: ChatPermissions,
    ) -> impl Future<Output = Result<(), RequestError>> + Send;

    fn chat_administrators(
        &self,
        chat_id: i64,
    ) -> impl Future<Output = Result<Vec<Administrator>, RequestError>> + Send;
}

impl Gateway for Bot {
    async fn send_text(
        &self,
        chat_id: i64,
        text: String,
        markup: Option<ReplyMarkup>,
    ) -> Result<(), RequestError> {
        let request = self.send_message(ChatId(chat_id), text);
        match markup {
            Some(markup) => request.reply_markup(markup).await?,
            None => request.await?,
        };
        Ok(())
    }

    async fn edit_text(
        &self,
        chat_id: i64,
        message_id: MessageId,
        text: String,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), RequestError> {
        let request = self.edit_message_text(ChatId(chat_id), message_id, text);
        match keyboard {
            Some(keyboard) => request.reply_markup(keyboard).await?,
            None => request.await?,
        };
        Ok(())
    }

    async fn answer_callback(
        &self,
        callback_id: CallbackQueryId,
        alert: Option<String>,
    ) -> Result<(), RequestError> {
        let request = self.answer_callback_query(callback_id);
        match alert {
            Some(text) => request.text(text).show_alert(true).await?,
            None => request.await?,
        };
        Ok(())
    }

    async fn restrict_member(
        &self,
        chat_id: i64,
        user_id: u64,
        permissions: ChatPermissions,
    ) -> Result<(), RequestError> {
        self.restrict_chat_member(ChatId(chat_id), UserId(user_id), permissions)
            .await?;
        Ok(())
    }

    async fn chat_administrators(&self, chat_id: i64) -> Result<Vec<Administrator>, RequestError> {
        let members = self.get_chat_administrators(ChatId(chat_id)).await?;
        Ok(members
            .into_iter()
            .map(|member| Administrator {
                id: member.user.id.0,
                full_name: member.user.full_name(),
                is_bot: member.user.is_bot,
                is_creator: member.kind.is_owner(),
            })
            .collect())
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use std::sync::Mutex;

    use teloxide::ApiError;

    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    pub(crate) enum Call {
        Send { chat_id: i64, text: String },
        Edit { chat_id: i64, text: String },
        Answer { alert: Option<String> },
        Restrict { chat_id: i64, user_id: u64 },
        Administrators { chat_id: i64 },
    }

    /// Records every call; restrictions fail when `reject_restrictions` is set.
    #[derive(Default)]
    pub(crate) struct RecordingGateway {
        pub calls: Mutex<Vec<Call>>,
        pub administrators: Vec<Administrator>,
        pub reject_restrictions: bool,
    }

    impl RecordingGateway {
        pub(crate) fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }
    }

    impl Gateway for RecordingGateway {
        async fn send_text(
            &self,
            chat_id: i64,
            text: String,
            _markup: Option<ReplyMarkup>,
        ) -> Result<(), RequestError> {
            self.record(Call::Send { chat_id, text });
            Ok(())
        }

        async fn edit_text(
            &self,
            chat_id: i64,
            _message_id: MessageId,
            text: String,
            _keyboard: Option<InlineKeyboardMarkup>,
        ) -> Result<(), RequestError> {
            self.record(Call::Edit { chat_id, text });
            Ok(())
        }

        async fn answer_callback(
            &self,
            _callback_id: CallbackQueryId,
            alert: Option<String>,
        ) -> Result<(), RequestError> {
            self.record(Call::Answer { alert });
            Ok(())
        }

        async fn restrict_member(
            &self,
            chat_id: i64,
            user_id: u64,
            _permissions: ChatPermissions,
        ) -> Result<(), RequestError> {
            self.record(Call::Restrict { chat_id, user_id });
            if self.reject_restrictions {
                return Err(RequestError::Api(ApiError::Unknown(
                    "not enough rights to restrict/unrestrict chat member".to_string(),
                )));
            }
            Ok(())
        }

        async fn chat_administrators(
            &self,
            chat_id: i64,
        ) -> Result<Vec<Administrator>, RequestError> {
            self.record(Call::Administrators { chat_id });
            Ok(self.administrators.clone())
        }
    }
}
