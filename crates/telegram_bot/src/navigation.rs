//! Menu navigation.
//!
//! Every function here takes the acting user and returns an [`Outcome`]: what
//! the transport should show. Authority is read from the store on every call,
//! nothing is carried over from the previous screen.

use engine::{Chat, Engine, User};
use teloxide::types::InlineKeyboardMarkup;

use crate::{
    callback::Action,
    dialog::{self, Flow, Step, Target},
    error::BotError,
    ui,
};

#[derive(Debug, PartialEq)]
pub(crate) enum Outcome {
    /// The reply keyboard with the top level entries.
    Menu,
    Screen {
        text: String,
        keyboard: InlineKeyboardMarkup,
    },
    /// A flow is waiting for input.
    Prompt(&'static str),
    /// A short message; an alert when answering a button press.
    Notice(String),
    Denied,
    Missing,
    Nothing,
}

impl From<(String, InlineKeyboardMarkup)> for Outcome {
    fn from((text, keyboard): (String, InlineKeyboardMarkup)) -> Self {
        Self::Screen { text, keyboard }
    }
}

/// Start or menu command: always back to idle.
pub(crate) async fn open_menu(engine: &Engine, user: &User) -> Result<Outcome, BotError> {
    engine.reset_dialog(user.id).await?;
    Ok(Outcome::Menu)
}

pub(crate) async fn navigate(
    engine: &Engine,
    user: &User,
    action: Action,
) -> Result<Outcome, BotError> {
    match screen(engine, user, action).await {
        Err(err @ BotError::NotFound(_)) => {
            engine.reset_dialog(user.id).await?;
            resolve(Err(err))
        }
        other => resolve(other),
    }
}

/// Feeds a private message to the flow the user is running, if any.
pub(crate) async fn handle_input(
    engine: &Engine,
    user: &User,
    target: Target,
) -> Result<Outcome, BotError> {
    let dialog = engine.dialog(user.id).await?;
    let Some(flow) = Flow::from_state(dialog.state) else {
        return Ok(Outcome::Nothing);
    };

    let result = match dialog::step(&dialog, target) {
        Step::Ignore => return Ok(Outcome::Nothing),
        Step::Reprompt(_) => {
            tracing::debug!(?flow, "invalid input, waiting again");
            return Ok(Outcome::Prompt(flow.prompt()));
        }
        Step::Abort(_) => Err(BotError::UnresolvableIdentity),
        Step::Lost(_) => Err(BotError::NotFound(format!("chat of the pending {flow:?} flow"))),
        Step::Apply {
            chat_id,
            target_id,
            target_name,
            ..
        } => apply(engine, user, flow, chat_id, target_id, &target_name).await,
    };

    match result {
        Err(BotError::UnresolvableIdentity) => {
            tracing::info!(?flow, "flow aborted: {}", BotError::UnresolvableIdentity);
            engine.reset_dialog(user.id).await?;
            Ok(Outcome::Notice(flow.hidden_identity().to_string()))
        }
        Err(err @ (BotError::NotAuthorized { .. } | BotError::NotFound(_))) => {
            engine.reset_dialog(user.id).await?;
            resolve(Err(err))
        }
        other => other,
    }
}

fn resolve(result: Result<Outcome, BotError>) -> Result<Outcome, BotError> {
    match result {
        Err(BotError::NotAuthorized { chat_id, user_id }) => {
            tracing::warn!(chat_id, user_id, "access denied");
            Ok(Outcome::Denied)
        }
        Err(BotError::NotFound(what)) => {
            tracing::error!("{what} not found");
            Ok(Outcome::Missing)
        }
        other => other,
    }
}

async fn screen(engine: &Engine, user: &User, action: Action) -> Result<Outcome, BotError> {
    match action {
        Action::Groups { page } => {
            let chats = engine.chats_for_user(user.id).await?;
            engine.reset_dialog(user.id).await?;
            Ok(match ui::render_groups(&chats, page) {
                Some(screen) => screen.into(),
                None => Outcome::Notice(ui::no_groups_text().to_string()),
            })
        }
        Action::Group { chat_id } => {
            let chat = managed_chat(engine, chat_id, user.id).await?;
            engine.reset_dialog(user.id).await?;
            Ok(ui::render_group(&chat, user.id).into())
        }
        Action::ChangeOwner { chat_id } => {
            start_flow(engine, user, chat_id, Flow::TransferOwnership).await
        }
        Action::Managers { chat_id, page } => {
            let chat = owned_chat(engine, chat_id, user.id).await?;
            let managers = engine.list_managers(chat.id).await?;
            engine.reset_dialog(user.id).await?;
            Ok(ui::render_managers(&chat, &managers, page).into())
        }
        Action::AddManager { chat_id } => start_flow(engine, user, chat_id, Flow::AddManager).await,
        Action::Manager {
            chat_id,
            manager_id,
        } => {
            let chat = owned_chat(engine, chat_id, user.id).await?;
            let missing = || BotError::NotFound(format!("manager {manager_id} of chat {chat_id}"));
            if !engine.is_manager(chat.id, manager_id).await? {
                return Err(missing());
            }
            let manager = engine.get_user(manager_id).await?.ok_or_else(missing)?;
            engine.reset_dialog(user.id).await?;
            Ok(ui::render_manager(&chat, &manager).into())
        }
        Action::RemoveManager {
            chat_id,
            manager_id,
        } => {
            let chat = owned_chat(engine, chat_id, user.id).await?;
            engine.remove_manager(chat.id, manager_id).await?;
            tracing::info!(chat_id, manager_id, "manager removed");
            let managers = engine.list_managers(chat.id).await?;
            engine.reset_dialog(user.id).await?;
            Ok(ui::render_managers(&chat, &managers, 1).into())
        }
        Action::Functions { chat_id, .. } => {
            managed_chat(engine, chat_id, user.id).await?;
            Ok(Outcome::Notice(ui::not_implemented_text().to_string()))
        }
        Action::Noop => Ok(Outcome::Nothing),
    }
}

async fn start_flow(
    engine: &Engine,
    user: &User,
    chat_id: i64,
    flow: Flow,
) -> Result<Outcome, BotError> {
    let chat = owned_chat(engine, chat_id, user.id).await?;
    engine.set_dialog(user.id, flow.begin(chat.id)).await?;
    tracing::debug!(?flow, chat_id, "flow started");
    Ok(Outcome::Prompt(flow.prompt()))
}

async fn apply(
    engine: &Engine,
    user: &User,
    flow: Flow,
    chat_id: i64,
    target_id: i64,
    target_name: &str,
) -> Result<Outcome, BotError> {
    let chat = owned_chat(engine, chat_id, user.id).await?;
    if flow == Flow::AddManager && chat.is_owned_by(target_id) {
        return Ok(Outcome::Prompt(flow.prompt()));
    }

    engine.get_or_create_user(target_id, target_name).await?;
    let screen = match flow {
        Flow::TransferOwnership => {
            let chat = engine.transfer_ownership(chat.id, target_id).await?;
            ui::render_group(&chat, user.id)
        }
        Flow::AddManager => {
            let chat = engine.add_manager(chat.id, target_id).await?;
            let managers = engine.list_managers(chat.id).await?;
            ui::render_managers(&chat, &managers, 1)
        }
    };
    tracing::info!(?flow, chat_id, target_id, target_name, "flow completed");

    engine.reset_dialog(user.id).await?;
    Ok(screen.into())
}

async fn known_chat(engine: &Engine, chat_id: i64) -> Result<Chat, BotError> {
    engine
        .get_chat(chat_id)
        .await?
        .ok_or_else(|| BotError::NotFound(format!("chat {chat_id}")))
}

async fn managed_chat(engine: &Engine, chat_id: i64, user_id: i64) -> Result<Chat, BotError> {
    let chat = known_chat(engine, chat_id).await?;
    if engine.can_manage(&chat, user_id).await? {
        Ok(chat)
    } else {
        Err(BotError::NotAuthorized { chat_id, user_id })
    }
}

async fn owned_chat(engine: &Engine, chat_id: i64, user_id: i64) -> Result<Chat, BotError> {
    let chat = known_chat(engine, chat_id).await?;
    if engine.is_owner(&chat, user_id) {
        Ok(chat)
    } else {
        Err(BotError::NotAuthorized { chat_id, user_id })
    }
}

#[cfg(test)]
mod tests {
    use engine::{Dialog, DialogData, DialogState};
    use migration::MigratorTrait;
    use sea_orm::Database;
    use teloxide::types::InlineKeyboardButtonKind;

    use super::*;

    const GROUP: i64 = -100_500;

    async fn setup() -> (Engine, User, User) {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        let engine = Engine::builder().database(db).build().await.unwrap();
        let alice = engine.get_or_create_user(1, "Alice").await.unwrap();
        let bob = engine.get_or_create_user(2, "Bob").await.unwrap();
        engine.create_chat(GROUP, "Tailors", alice.id).await.unwrap();
        (engine, alice, bob)
    }

    fn callbacks(outcome: &Outcome) -> Vec<String> {
        let Outcome::Screen { keyboard, .. } = outcome else {
            panic!("expected a screen, got {outcome:?}");
        };
        keyboard
            .inline_keyboard
            .iter()
            .flatten()
            .filter_map(|b| match &b.kind {
                InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn menu_resets_a_running_flow() {
        let (engine, alice, _) = setup().await;
        navigate(&engine, &alice, Action::ChangeOwner { chat_id: GROUP })
            .await
            .unwrap();

        assert_eq!(open_menu(&engine, &alice).await.unwrap(), Outcome::Menu);
        assert_eq!(engine.dialog(alice.id).await.unwrap(), Dialog::default());
    }

    #[tokio::test]
    async fn owner_sees_owner_actions() {
        let (engine, alice, _) = setup().await;
        let outcome = navigate(&engine, &alice, Action::Group { chat_id: GROUP })
            .await
            .unwrap();
        let data = callbacks(&outcome);
        assert!(data.contains(&format!("group_managers:{GROUP}:1")));
        assert!(data.contains(&format!("group_change_owner:{GROUP}")));
    }

    #[tokio::test]
    async fn manager_sees_group_without_owner_actions() {
        let (engine, _, bob) = setup().await;
        engine.add_manager(GROUP, bob.id).await.unwrap();

        let outcome = navigate(&engine, &bob, Action::Group { chat_id: GROUP })
            .await
            .unwrap();
        assert_eq!(
            callbacks(&outcome),
            vec![format!("group_functions:{GROUP}:1"), "groups:1".to_string()]
        );
    }

    #[tokio::test]
    async fn outsider_is_denied_without_state_change() {
        let (engine, _, bob) = setup().await;
        let pending = Dialog::new(DialogState::AwaitingNewManager, DialogData::with_chat_id(-7));
        engine.set_dialog(bob.id, pending.clone()).await.unwrap();

        for action in [
            Action::Group { chat_id: GROUP },
            Action::Managers {
                chat_id: GROUP,
                page: 1,
            },
            Action::ChangeOwner { chat_id: GROUP },
        ] {
            assert_eq!(
                navigate(&engine, &bob, action).await.unwrap(),
                Outcome::Denied
            );
        }
        assert_eq!(engine.dialog(bob.id).await.unwrap(), pending);
    }

    #[tokio::test]
    async fn manager_cannot_open_owner_screens() {
        let (engine, _, bob) = setup().await;
        engine.add_manager(GROUP, bob.id).await.unwrap();

        let outcome = navigate(
            &engine,
            &bob,
            Action::Managers {
                chat_id: GROUP,
                page: 1,
            },
        )
        .await
        .unwrap();
        assert_eq!(outcome, Outcome::Denied);
    }

    #[tokio::test]
    async fn unknown_chat_is_missing() {
        let (engine, alice, _) = setup().await;
        let outcome = navigate(&engine, &alice, Action::Group { chat_id: -1 })
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Missing);
    }

    #[tokio::test]
    async fn stale_button_drops_a_running_flow() {
        let (engine, alice, bob) = setup().await;
        navigate(&engine, &alice, Action::ChangeOwner { chat_id: GROUP })
            .await
            .unwrap();

        let outcome = navigate(&engine, &alice, Action::Group { chat_id: -999 })
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Missing);
        assert_eq!(engine.dialog(alice.id).await.unwrap(), Dialog::default());

        let target = Target::User {
            id: bob.id,
            full_name: bob.full_name.clone(),
        };
        assert_eq!(
            handle_input(&engine, &alice, target).await.unwrap(),
            Outcome::Nothing
        );
        let chat = engine.get_chat(GROUP).await.unwrap().unwrap();
        assert_eq!(chat.owner_id, alice.id);
    }

    #[tokio::test]
    async fn manager_screen_requires_a_manager() {
        let (engine, alice, bob) = setup().await;
        let manager = |manager_id| Action::Manager {
            chat_id: GROUP,
            manager_id,
        };

        assert_eq!(
            navigate(&engine, &alice, manager(bob.id)).await.unwrap(),
            Outcome::Missing
        );
        assert_eq!(
            navigate(&engine, &alice, manager(alice.id)).await.unwrap(),
            Outcome::Missing
        );

        engine.add_manager(GROUP, bob.id).await.unwrap();
        let outcome = navigate(&engine, &alice, manager(bob.id)).await.unwrap();
        assert_eq!(
            callbacks(&outcome),
            vec![
                format!("group_manager_remove:{GROUP}:{}", bob.id),
                format!("group_managers:{GROUP}:1"),
            ]
        );
    }

    #[tokio::test]
    async fn empty_group_list_is_a_notice() {
        let (engine, _, bob) = setup().await;
        let outcome = navigate(&engine, &bob, Action::Groups { page: 1 })
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Notice(ui::no_groups_text().to_string()));
    }

    #[tokio::test]
    async fn group_list_links_every_group() {
        let (engine, alice, _) = setup().await;
        let outcome = navigate(&engine, &alice, Action::Groups { page: 1 })
            .await
            .unwrap();
        assert_eq!(callbacks(&outcome), vec![format!("group:{GROUP}")]);
    }

    #[tokio::test]
    async fn transfer_flow_applies_a_resolved_contact() {
        let (engine, alice, bob) = setup().await;

        let prompt = navigate(&engine, &alice, Action::ChangeOwner { chat_id: GROUP })
            .await
            .unwrap();
        assert_eq!(prompt, Outcome::Prompt(Flow::TransferOwnership.prompt()));
        let dialog = engine.dialog(alice.id).await.unwrap();
        assert_eq!(dialog.state, DialogState::AwaitingNewOwner);
        assert_eq!(dialog.pending_chat_id(), Some(GROUP));

        let target = Target::User {
            id: bob.id,
            full_name: bob.full_name.clone(),
        };
        let outcome = handle_input(&engine, &alice, target).await.unwrap();
        assert!(matches!(outcome, Outcome::Screen { .. }));

        let chat = engine.get_chat(GROUP).await.unwrap().unwrap();
        assert_eq!(chat.owner_id, bob.id);
        assert_eq!(engine.dialog(alice.id).await.unwrap(), Dialog::default());
    }

    #[tokio::test]
    async fn transfer_flow_aborts_on_hidden_forward() {
        let (engine, alice, _) = setup().await;
        navigate(&engine, &alice, Action::ChangeOwner { chat_id: GROUP })
            .await
            .unwrap();

        let outcome = handle_input(&engine, &alice, Target::Hidden).await.unwrap();
        assert_eq!(
            outcome,
            Outcome::Notice(Flow::TransferOwnership.hidden_identity().to_string())
        );

        let chat = engine.get_chat(GROUP).await.unwrap().unwrap();
        assert_eq!(chat.owner_id, alice.id);
        assert_eq!(engine.dialog(alice.id).await.unwrap(), Dialog::default());
    }

    #[tokio::test]
    async fn invalid_input_keeps_the_flow() {
        let (engine, alice, _) = setup().await;
        navigate(&engine, &alice, Action::AddManager { chat_id: GROUP })
            .await
            .unwrap();

        let outcome = handle_input(&engine, &alice, Target::Invalid).await.unwrap();
        assert_eq!(outcome, Outcome::Prompt(Flow::AddManager.prompt()));
        assert_eq!(
            engine.dialog(alice.id).await.unwrap().state,
            DialogState::AwaitingNewManager
        );
    }

    #[tokio::test]
    async fn add_manager_flow_creates_unknown_target() {
        let (engine, alice, _) = setup().await;
        navigate(&engine, &alice, Action::AddManager { chat_id: GROUP })
            .await
            .unwrap();

        let target = Target::User {
            id: 3,
            full_name: "Carol".to_string(),
        };
        let outcome = handle_input(&engine, &alice, target).await.unwrap();
        assert_eq!(
            callbacks(&outcome),
            vec![
                format!("group_add_manager:{GROUP}"),
                format!("group_manager:{GROUP}:3"),
                format!("group:{GROUP}"),
            ]
        );

        let managers = engine.list_managers(GROUP).await.unwrap();
        assert_eq!(managers.len(), 1);
        assert_eq!(managers[0].full_name, "Carol");
    }

    #[tokio::test]
    async fn flow_is_dropped_when_ownership_was_lost() {
        let (engine, alice, bob) = setup().await;
        navigate(&engine, &alice, Action::AddManager { chat_id: GROUP })
            .await
            .unwrap();
        engine.transfer_ownership(GROUP, bob.id).await.unwrap();

        let target = Target::User {
            id: 3,
            full_name: "Carol".to_string(),
        };
        let outcome = handle_input(&engine, &alice, target).await.unwrap();
        assert_eq!(outcome, Outcome::Denied);
        assert_eq!(engine.dialog(alice.id).await.unwrap(), Dialog::default());
        assert_eq!(
            engine
                .list_managers(GROUP)
                .await
                .unwrap()
                .into_iter()
                .map(|u| u.id)
                .collect::<Vec<_>>(),
            vec![alice.id]
        );
    }

    #[tokio::test]
    async fn idle_input_is_ignored() {
        let (engine, alice, bob) = setup().await;
        let target = Target::User {
            id: bob.id,
            full_name: bob.full_name,
        };
        assert_eq!(
            handle_input(&engine, &alice, target).await.unwrap(),
            Outcome::Nothing
        );
    }

    #[tokio::test]
    async fn remove_manager_returns_to_the_list() {
        let (engine, alice, bob) = setup().await;
        engine.add_manager(GROUP, bob.id).await.unwrap();

        let outcome = navigate(
            &engine,
            &alice,
            Action::RemoveManager {
                chat_id: GROUP,
                manager_id: bob.id,
            },
        )
        .await
        .unwrap();
        assert_eq!(
            callbacks(&outcome),
            vec![format!("group_add_manager:{GROUP}"), format!("group:{GROUP}")]
        );
        assert!(engine.list_managers(GROUP).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn functions_are_not_implemented() {
        let (engine, alice, _) = setup().await;
        let outcome = navigate(
            &engine,
            &alice,
            Action::Functions {
                chat_id: GROUP,
                page: 1,
            },
        )
        .await
        .unwrap();
        assert_eq!(outcome, Outcome::Notice(ui::not_implemented_text().to_string()));
    }
}
