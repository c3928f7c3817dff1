//! Reactions to membership changes in groups.
//!
//! Promotion of the bot to administrator registers the group, with the
//! promoting user as owner. Members joining a group get restricted according
//! to the configured [`RestrictionPolicy`].

use std::collections::HashSet;

use engine::Engine;
use serde::Deserialize;
use teloxide::types::ChatPermissions;
use thiserror::Error;

use crate::{error::BotError, gateway::Gateway, user_key};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestrictionMode {
    /// Only groups registered through a promotion are enforced.
    #[default]
    Registered,
    /// Every group the bot sees is enforced.
    Whitelist,
}

#[derive(Clone, Debug)]
pub struct RestrictionPolicy {
    mode: RestrictionMode,
    whitelist: HashSet<u64>,
    permissions: ChatPermissions,
}

impl Default for RestrictionPolicy {
    fn default() -> Self {
        Self::new(RestrictionMode::default(), [], ChatPermissions::empty())
    }
}

impl RestrictionPolicy {
    pub fn new(
        mode: RestrictionMode,
        whitelist: impl IntoIterator<Item = u64>,
        permissions: ChatPermissions,
    ) -> Self {
        Self {
            mode,
            whitelist: whitelist.into_iter().collect(),
            permissions,
        }
    }

    pub fn mode(&self) -> RestrictionMode {
        self.mode
    }

    fn exempts(&self, user_id: u64) -> bool {
        self.whitelist.contains(&user_id)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown chat permission: {0}")]
pub struct UnknownPermission(pub String);

/// Builds the permission set left to new members from config names.
pub fn parse_permissions<S: AsRef<str>>(names: &[S]) -> Result<ChatPermissions, UnknownPermission> {
    names.iter().try_fold(ChatPermissions::empty(), |acc, name| {
        let flag = match name.as_ref().trim() {
            "send_messages" => ChatPermissions::SEND_MESSAGES,
            "send_audios" => ChatPermissions::SEND_AUDIOS,
            "send_documents" => ChatPermissions::SEND_DOCUMENTS,
            "send_photos" => ChatPermissions::SEND_PHOTOS,
            "send_videos" => ChatPermissions::SEND_VIDEOS,
            "send_video_notes" => ChatPermissions::SEND_VIDEO_NOTES,
            "send_voice_notes" => ChatPermissions::SEND_VOICE_NOTES,
            "send_polls" => ChatPermissions::SEND_POLLS,
            "send_other_messages" => ChatPermissions::SEND_OTHER_MESSAGES,
            "add_web_page_previews" => ChatPermissions::ADD_WEB_PAGE_PREVIEWS,
            "change_info" => ChatPermissions::CHANGE_INFO,
            "invite_users" => ChatPermissions::INVITE_USERS,
            "pin_messages" => ChatPermissions::PIN_MESSAGES,
            "manage_topics" => ChatPermissions::MANAGE_TOPICS,
            other => return Err(UnknownPermission(other.to_string())),
        };
        Ok(acc | flag)
    })
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Person {
    pub id: u64,
    pub full_name: String,
    pub is_bot: bool,
}

/// A membership change: `actor` changed the status of `member` in a group.
#[derive(Clone, Debug)]
pub(crate) struct MemberEvent {
    pub chat_id: i64,
    pub chat_title: String,
    pub actor: Person,
    pub member: Person,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Registration {
    Registered { owner_id: i64 },
    /// Known chat, only the title was refreshed.
    Refreshed,
    NotSelf,
    NoOwner,
}

pub(crate) async fn register_chat<G: Gateway>(
    gateway: &G,
    engine: &Engine,
    bot_id: u64,
    event: &MemberEvent,
) -> Result<Registration, BotError> {
    let chat_id = event.chat_id;
    let chat_title = event.chat_title.as_str();

    if event.member.id != bot_id {
        tracing::error!(
            chat_id,
            chat_title,
            member_id = event.member.id,
            "promotion notice is not about the bot"
        );
        return Ok(Registration::NotSelf);
    }

    if engine.get_chat(chat_id).await?.is_some() {
        engine.set_chat_title(chat_id, chat_title).await?;
        tracing::warn!(chat_id, chat_title, "chat already registered");
        return Ok(Registration::Refreshed);
    }

    let owner = if event.actor.is_bot {
        creator(gateway, chat_id).await?
    } else {
        Some(event.actor.clone())
    };
    let Some(owner) = owner else {
        tracing::error!(chat_id, chat_title, "no human owner found, chat not registered");
        return Ok(Registration::NoOwner);
    };

    let owner_id = user_key(owner.id)?;
    engine.get_or_create_user(owner_id, &owner.full_name).await?;
    engine.create_chat(chat_id, chat_title, owner_id).await?;
    tracing::info!(
        chat_id,
        chat_title,
        owner_id,
        owner_name = %owner.full_name,
        "chat registered"
    );
    Ok(Registration::Registered { owner_id })
}

async fn creator<G: Gateway>(gateway: &G, chat_id: i64) -> Result<Option<Person>, BotError> {
    let administrators = gateway.chat_administrators(chat_id).await?;
    Ok(administrators
        .into_iter()
        .find(|admin| admin.is_creator && !admin.is_bot)
        .map(|admin| Person {
            id: admin.id,
            full_name: admin.full_name,
            is_bot: admin.is_bot,
        }))
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Restriction {
    Applied,
    /// The platform refused; already logged.
    Rejected,
    Exempt,
    UnknownChat,
}

pub(crate) async fn restrict_new_member<G: Gateway>(
    gateway: &G,
    engine: &Engine,
    policy: &RestrictionPolicy,
    bot_id: u64,
    event: &MemberEvent,
) -> Result<Restriction, BotError> {
    let chat_id = event.chat_id;
    let chat_title = event.chat_title.as_str();
    let member_id = event.member.id;
    let member_name = event.member.full_name.as_str();

    if member_id == bot_id || event.member.is_bot || policy.exempts(member_id) {
        tracing::info!(chat_id, chat_title, member_id, member_name, "member exempt from restriction");
        return Ok(Restriction::Exempt);
    }

    if policy.mode == RestrictionMode::Registered && engine.get_chat(chat_id).await?.is_none() {
        tracing::debug!(chat_id, chat_title, member_id, "join in unregistered chat ignored");
        return Ok(Restriction::UnknownChat);
    }

    match gateway
        .restrict_member(chat_id, member_id, policy.permissions.clone())
        .await
    {
        Ok(()) => {
            tracing::info!(chat_id, chat_title, member_id, member_name, "member restricted");
            Ok(Restriction::Applied)
        }
        Err(err) => {
            tracing::error!(
                chat_id,
                chat_title,
                member_id,
                member_name,
                "failed to restrict member: {err}"
            );
            Ok(Restriction::Rejected)
        }
    }
}
