use crate::models::Turn;
use crate::services::{KeyValueStore, StoreError};
use crate::settings::ChatSettings;
use std::sync::Arc;
use tracing::{debug, warn};

/// Ordered, size-capped conversation log persisted under one store key.
///
/// Never empty: initialization, a failed load and [`clear`](Self::clear) all
/// leave a single assistant welcome turn.
pub struct ConversationHistory {
    turns: Vec<Turn>,
    cap: usize,
    storage_key: String,
    welcome_message: String,
    store: Arc<dyn KeyValueStore>,
}

impl ConversationHistory {
    /// Fresh history holding only the welcome turn. Does not touch the store.
    pub fn new(store: Arc<dyn KeyValueStore>, settings: &ChatSettings) -> Self {
        let mut history = Self {
            turns: Vec::new(),
            cap: settings.history_cap.max(1),
            storage_key: settings.storage_key.clone(),
            welcome_message: settings.welcome_message.clone(),
            store,
        };
        history.turns.push(history.welcome_turn());
        history
    }

    /// [`new`](Self::new) followed by [`load`](Self::load).
    pub fn open(store: Arc<dyn KeyValueStore>, settings: &ChatSettings) -> Self {
        let mut history = Self::new(store, settings);
        history.load();
        history
    }

    /// Replaces the in-memory log with the persisted one, falling back to the
    /// welcome turn when nothing usable is stored.
    pub fn load(&mut self) {
        let stored = match self.store.get(&self.storage_key) {
            Ok(stored) => stored,
            Err(err) => {
                warn!(key = %self.storage_key, error = %err, "failed to read conversation history");
                None
            }
        };
        let turns = stored.and_then(|data| match serde_json::from_str::<Vec<Turn>>(&data) {
            Ok(turns) => Some(turns),
            Err(err) => {
                warn!(key = %self.storage_key, error = %err, "stored conversation history is corrupt");
                None
            }
        });
        match turns {
            Some(turns) if !turns.is_empty() => {
                self.turns = turns;
                self.trim();
                debug!(turns = self.turns.len(), "loaded conversation history");
            }
            _ => {
                self.turns = vec![self.welcome_turn()];
                debug!("starting conversation from welcome turn");
            }
        }
    }

    pub fn save(&self) -> Result<(), StoreError> {
        self.pending_save()?.write()
    }

    /// Serialized copy of the current turns, written later by
    /// [`PendingSave::write`] without borrowing the history.
    pub fn pending_save(&self) -> Result<PendingSave, StoreError> {
        Ok(PendingSave {
            store: self.store.clone(),
            key: self.storage_key.clone(),
            data: serde_json::to_string(&self.turns)?,
        })
    }

    /// Appends `turn`, drops the oldest turns beyond the cap and persists.
    /// A failed write is logged; the in-memory append stands.
    pub fn append(&mut self, turn: Turn) {
        self.push(turn);
        self.persist();
    }

    /// In-memory half of [`append`](Self::append); the caller persists.
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
        self.trim();
    }

    /// Resets to a single welcome turn and persists.
    pub fn clear(&mut self) {
        self.turns = vec![self.welcome_turn()];
        self.persist();
    }

    /// Up to `count` most recent turns, oldest first.
    pub fn get_recent(&self, count: usize) -> &[Turn] {
        let start = self.turns.len().saturating_sub(count);
        &self.turns[start..]
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.clone()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn welcome_turn(&self) -> Turn {
        Turn::assistant(self.welcome_message.clone())
    }

    fn trim(&mut self) {
        if self.turns.len() > self.cap {
            let excess = self.turns.len() - self.cap;
            self.turns.drain(..excess);
        }
    }

    fn persist(&self) {
        if let Err(err) = self.save() {
            warn!(key = %self.storage_key, error = %err, "failed to persist conversation history");
        }
    }
}

/// One history write detached from the [`ConversationHistory`] it came from.
pub struct PendingSave {
    store: Arc<dyn KeyValueStore>,
    key: String,
    data: String,
}

impl PendingSave {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn write(self) -> Result<(), StoreError> {
        self.store.set(&self.key, &self.data)
    }
}
