use super::support::{ChatFixture, EventLog, TURN_EVENTS};
use phonestar::chat::{Category, ConversationHistory, DialogueEngine, LastIntent};
use phonestar::events::{ChatEvent, EventChannel, EventKind};
use phonestar::models::Role;
use phonestar::services::{BackendError, MemoryStore};
use phonestar::settings::{AppConfig, ChatSettings};
use std::sync::Arc;
use std::time::Duration;

async fn wait_for(log: &EventLog, kind: EventKind, count: usize) {
    for _ in 0..200 {
        if log.count(kind) >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("timed out waiting for {} x{count}", kind.name());
}

#[tokio::test]
async fn turn_events_follow_lifecycle_order() {
    let fixture = ChatFixture::new();
    let reply = fixture.say(" 0931328218 ").await;

    assert_eq!(
        fixture.log.names(),
        vec![
            "turn:user-added",
            "turn:started",
            "turn:assistant-added",
            "turn:ended"
        ]
    );
    let events = fixture.log.events();
    match &events[0] {
        ChatEvent::UserTurnAdded(turn) => {
            assert_eq!(turn.role, Role::User);
            assert_eq!(turn.content, "0931328218");
        }
        other => panic!("unexpected first event {other:?}"),
    }
    assert_eq!(events[2], ChatEvent::AssistantTurnAdded(reply));
}

#[tokio::test]
async fn failed_turn_still_ends_once() {
    let fixture = ChatFixture::new();
    fixture
        .backend
        .push_answer(Err(BackendError::Network("offline".into())));

    fixture.say("bát tinh là gì").await;

    assert_eq!(fixture.log.count(EventKind::TurnStarted), 1);
    assert_eq!(fixture.log.count(EventKind::TurnEnded), 1);
    assert_eq!(fixture.log.names().last(), Some(&"turn:ended"));
}

#[tokio::test]
async fn misbehaving_subscriber_does_not_break_the_turn() {
    let fixture = ChatFixture::new();
    fixture
        .channel
        .subscribe(EventKind::TurnStarted, |_| panic!("typing indicator crashed"));
    fixture
        .channel
        .subscribe(EventKind::AssistantTurnAdded, |_| anyhow::bail!("render failed"));

    let reply = fixture.say("0931328218").await;

    assert!(reply.has_analysis());
    assert_eq!(fixture.log.count(EventKind::TurnEnded), 1);
    assert_eq!(fixture.engine.history().len(), 3);
}

#[tokio::test]
async fn clearing_resets_history_context_and_store() {
    let fixture = ChatFixture::new();
    fixture.say("0931328218").await;
    fixture.say("vậy còn sự nghiệp").await;

    let snapshot = fixture.engine.clear_conversation();

    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].role, Role::Assistant);
    assert_eq!(
        fixture.log.events().last(),
        Some(&ChatEvent::HistoryCleared(snapshot.clone()))
    );
    assert_eq!(fixture.context().last_intent, LastIntent::None);
    assert_eq!(fixture.context().last_phone_number, None);

    let reopened = ConversationHistory::open(fixture.store.clone(), &ChatSettings::default());
    assert_eq!(reopened.turns(), snapshot.as_slice());
}

#[tokio::test]
async fn attached_engine_reacts_to_shell_events() {
    let fixture = ChatFixture::new();
    let subscriptions = fixture.engine.attach().expect("runtime available");
    assert_eq!(fixture.log.names(), vec!["chat:ready"]);

    fixture
        .channel
        .publish(ChatEvent::SubmitText("0931328218".into()));
    wait_for(&fixture.log, EventKind::TurnEnded, 1).await;
    assert_eq!(fixture.context().last_phone_number.as_deref(), Some("0931328218"));

    fixture
        .channel
        .publish(ChatEvent::CategorySelected(Category::Health));
    wait_for(&fixture.log, EventKind::TurnEnded, 2).await;
    assert_eq!(fixture.backend.asks()[0].question, Category::Health.question());

    fixture.channel.publish(ChatEvent::ClearConversation);
    assert_eq!(fixture.log.count(EventKind::HistoryCleared), 1);
    assert_eq!(fixture.engine.history().len(), 1);

    for subscription in subscriptions {
        assert!(subscription.unsubscribe());
    }
    fixture
        .channel
        .publish(ChatEvent::SubmitText("0987654321".into()));
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(fixture.backend.call_count(), 2);
}

#[test]
fn attach_requires_a_runtime() {
    let engine = Arc::new(DialogueEngine::from_config(
        &AppConfig::default(),
        Arc::new(MemoryStore::new()),
        super::support::ScriptedBackend::new(),
        EventChannel::new(),
    ));
    assert!(engine.attach().is_err());
}

#[tokio::test]
async fn ready_event_carries_restored_history() {
    let fixture = ChatFixture::new();
    fixture.say("0931328218").await;

    let channel = EventChannel::new();
    let log = EventLog::attach(&channel, TURN_EVENTS);
    let restored = Arc::new(DialogueEngine::from_config(
        &AppConfig::default(),
        fixture.store.clone(),
        fixture.backend.clone(),
        channel,
    ));
    let _subscriptions = restored.attach().unwrap();

    match &log.events()[..] {
        [ChatEvent::ConversationReady(turns)] => assert_eq!(turns.len(), 3),
        other => panic!("unexpected events {other:?}"),
    }
}
