use sea_orm::Database;

use engine::{Dialog, DialogData, DialogState, Engine, EngineError};
use migration::MigratorTrait;

async fn engine_with_user(user_id: i64) -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();
    engine.get_or_create_user(user_id, "Alice").await.unwrap();
    engine
}

#[tokio::test]
async fn new_users_start_idle() {
    let engine = engine_with_user(1).await;
    let dialog = engine.dialog(1).await.unwrap();
    assert_eq!(dialog.state, DialogState::Idle);
    assert!(dialog.data.is_empty());
}

#[tokio::test]
async fn unknown_users_read_as_idle() {
    let engine = engine_with_user(1).await;
    assert_eq!(engine.dialog(2).await.unwrap(), Dialog::default());
}

#[tokio::test]
async fn state_and_data_are_stored_separately() {
    let engine = engine_with_user(1).await;
    engine
        .set_dialog_state(1, DialogState::AwaitingNewManager)
        .await
        .unwrap();
    engine
        .set_dialog_data(1, DialogData::with_chat_id(-42))
        .await
        .unwrap();

    assert_eq!(
        engine.dialog_state(1).await.unwrap(),
        DialogState::AwaitingNewManager
    );
    assert_eq!(engine.dialog_data(1).await.unwrap().chat_id(), Some(-42));
    assert_eq!(engine.dialog(1).await.unwrap().pending_chat_id(), Some(-42));
}

#[tokio::test]
async fn a_second_flow_overwrites_the_first() {
    let engine = engine_with_user(1).await;
    engine
        .set_dialog(
            1,
            Dialog::new(DialogState::AwaitingNewOwner, DialogData::with_chat_id(-1)),
        )
        .await
        .unwrap();
    engine
        .set_dialog(
            1,
            Dialog::new(DialogState::AwaitingNewManager, DialogData::with_chat_id(-2)),
        )
        .await
        .unwrap();

    let dialog = engine.dialog(1).await.unwrap();
    assert_eq!(dialog.state, DialogState::AwaitingNewManager);
    assert_eq!(dialog.pending_chat_id(), Some(-2));
}

#[tokio::test]
async fn reset_clears_state_and_data() {
    let engine = engine_with_user(1).await;
    engine
        .set_dialog(
            1,
            Dialog::new(DialogState::AwaitingNewOwner, DialogData::with_chat_id(-1)),
        )
        .await
        .unwrap();
    engine.reset_dialog(1).await.unwrap();

    assert_eq!(engine.dialog(1).await.unwrap(), Dialog::default());
}

#[tokio::test]
async fn dialogs_need_a_known_user() {
    let engine = engine_with_user(1).await;
    let err = engine
        .set_dialog_state(7, DialogState::AwaitingNewOwner)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("user not exists".to_string()));
}
