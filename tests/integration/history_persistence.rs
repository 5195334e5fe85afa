use super::support::ScriptedBackend;
use phonestar::chat::{ConversationHistory, DialogueEngine};
use phonestar::events::EventChannel;
use phonestar::models::Turn;
use phonestar::services::{FileStore, KeyValueStore, MemoryStore, StoreError};
use phonestar::settings::{AppConfig, STORE_FILE_NAME};
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn engine_over(store: Arc<FileStore>, config: &AppConfig) -> DialogueEngine {
    DialogueEngine::from_config(config, store, ScriptedBackend::new(), EventChannel::new())
}

#[tokio::test]
async fn conversation_survives_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(STORE_FILE_NAME);
    let config = AppConfig::default();

    let engine = engine_over(Arc::new(FileStore::new(&path)), &config);
    engine.handle_user_input("0931328218").await.unwrap();
    let before = engine.history();
    drop(engine);

    let restored = engine_over(Arc::new(FileStore::new(&path)), &config);
    assert_eq!(restored.history(), before);
    assert!(restored.history()[2].has_analysis());
    assert!(restored.context().last_phone_number.is_none());
}

#[tokio::test]
async fn history_cap_applies_across_turns() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(FileStore::new(dir.path().join(STORE_FILE_NAME)));
    let mut config = AppConfig::default();
    config.chat.history_cap = 4;

    let engine = engine_over(store.clone(), &config);
    for question in ["bát tinh là gì", "tứ cát là gì", "tứ hung là gì"] {
        engine.handle_user_input(question).await.unwrap();
    }

    let history = engine.history();
    assert_eq!(history.len(), 4);
    assert_eq!(history[0].content, "tứ cát là gì");
    assert_eq!(ConversationHistory::open(store, &config.chat).len(), 4);
}

#[test]
fn corrupt_store_file_starts_from_welcome() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(STORE_FILE_NAME);
    fs::write(&path, "{ this is not json").unwrap();
    let config = AppConfig::default();

    let history = ConversationHistory::open(Arc::new(FileStore::new(&path)), &config.chat);

    assert_eq!(history.len(), 1);
    assert_eq!(history.turns()[0].content, config.chat.welcome_message);
}

#[test]
fn history_is_saved_again_after_corrupt_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(STORE_FILE_NAME);
    fs::write(&path, "{ this is not json").unwrap();
    let config = AppConfig::default();

    let mut history = ConversationHistory::open(Arc::new(FileStore::new(&path)), &config.chat);
    history.append(Turn::user("0931328218"));
    assert!(history.save().is_ok());

    let reopened = ConversationHistory::open(Arc::new(FileStore::new(&path)), &config.chat);
    assert_eq!(reopened.len(), 2);
    assert_eq!(reopened.turns()[1].content, "0931328218");
}

#[test]
fn corrupt_history_value_starts_from_welcome() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(FileStore::new(dir.path().join(STORE_FILE_NAME)));
    let config = AppConfig::default();
    store
        .set(&config.chat.storage_key, r#"[{"role":"user"}]"#)
        .unwrap();

    let history = ConversationHistory::open(store, &config.chat);

    assert_eq!(history.len(), 1);
    assert!(history.turns()[0].is_assistant());
}

/// Store whose writes take a while, like a slow disk.
struct SlowStore {
    inner: MemoryStore,
    write_delay: Duration,
}

impl KeyValueStore for SlowStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        std::thread::sleep(self.write_delay);
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.inner.remove(key)
    }
}

#[tokio::test]
async fn slow_store_writes_do_not_stall_the_runtime() {
    let store = Arc::new(SlowStore {
        inner: MemoryStore::new(),
        write_delay: Duration::from_millis(100),
    });
    let config = AppConfig::default();
    let engine = DialogueEngine::from_config(
        &config,
        store.clone(),
        ScriptedBackend::new(),
        EventChannel::new(),
    );

    let ticks = Arc::new(AtomicUsize::new(0));
    let ticker = {
        let ticks = ticks.clone();
        tokio::spawn(async move {
            loop {
                ticks.fetch_add(1, Ordering::Relaxed);
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
    };

    engine.handle_user_input("bát tinh là gì").await.unwrap();
    ticker.abort();

    assert!(ticks.load(Ordering::Relaxed) >= 10);
    assert_eq!(ConversationHistory::open(store, &config.chat).len(), 3);
}
