//! Turn orchestration: classify, update dialogue memory, call the analysis
//! service, record both turns and publish lifecycle events.

use super::categories::Category;
use super::classifier::{extract_phone_numbers, normalize_digits, InputClassifier, Intent};
use super::context::DialogueContext;
use super::messages;
use super::history::PendingSave;
use super::session::DialogueSession;
use crate::events::{ChatEvent, EventChannel, EventKind, Subscription};
use crate::models::{AskRequest, Turn};
use crate::services::{AlwaysActive, AnalysisBackend, BackendError, KeyValueStore, SessionGate};
use crate::settings::AppConfig;
use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Content of the assistant turn a route produced.
struct Reply {
    content: String,
    analysis_data: Option<Value>,
}

impl Reply {
    fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            analysis_data: None,
        }
    }

    fn into_turn(self) -> Turn {
        match self.analysis_data {
            Some(data) => Turn::assistant_with_analysis(self.content, data),
            None => Turn::assistant(self.content),
        }
    }
}

/// Runs one user turn at a time against the analysis service.
///
/// Inputs arriving while a turn is in flight are dropped, not queued. Backend
/// failures never escape: they become a generic assistant reply.
pub struct DialogueEngine {
    session: Mutex<DialogueSession>,
    backend: Arc<dyn AnalysisBackend>,
    channel: EventChannel,
    gate: Arc<dyn SessionGate>,
    classifier: InputClassifier,
    request_timeout: Duration,
    busy: AtomicBool,
}

/// Holds the busy flag for one accepted turn. Dropping it publishes
/// `turn:ended` and releases the flag, also when the turn future is cancelled.
struct TurnGuard<'a> {
    engine: &'a DialogueEngine,
}

impl<'a> TurnGuard<'a> {
    fn acquire(engine: &'a DialogueEngine) -> Option<Self> {
        engine
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { engine })
    }
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        self.engine.channel.publish(ChatEvent::TurnEnded);
        self.engine.busy.store(false, Ordering::Release);
    }
}

impl DialogueEngine {
    pub fn new(
        session: DialogueSession,
        backend: Arc<dyn AnalysisBackend>,
        channel: EventChannel,
    ) -> Self {
        Self {
            session: Mutex::new(session),
            backend,
            channel,
            gate: Arc::new(AlwaysActive),
            classifier: InputClassifier::new(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            busy: AtomicBool::new(false),
        }
    }

    /// Engine over the conversation persisted in `store`, with limits and
    /// timeouts taken from `config`.
    pub fn from_config(
        config: &AppConfig,
        store: Arc<dyn KeyValueStore>,
        backend: Arc<dyn AnalysisBackend>,
        channel: EventChannel,
    ) -> Self {
        let session = DialogueSession::open(store, &config.chat);
        Self::new(session, backend, channel).with_request_timeout(config.backend.request_timeout())
    }

    pub fn with_session_gate(mut self, gate: Arc<dyn SessionGate>) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn channel(&self) -> &EventChannel {
        &self.channel
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn context(&self) -> DialogueContext {
        self.lock_session().context.clone()
    }

    pub fn history(&self) -> Vec<Turn> {
        self.lock_session().history.snapshot()
    }

    pub fn recent_history(&self, count: usize) -> Vec<Turn> {
        self.lock_session().history.get_recent(count).to_vec()
    }

    /// Processes one raw user input and returns the assistant turn.
    ///
    /// Returns `None` without side effects when the input is blank or another
    /// turn is still in flight.
    pub async fn handle_user_input(&self, raw: &str) -> Option<Turn> {
        self.run_turn(raw, None).await
    }

    /// Asks the canned question for `category` about the number in context.
    pub async fn handle_category(&self, category: &Category) -> Option<Turn> {
        self.run_turn(&category.question(), Some(Intent::Question)).await
    }

    /// Resets history to the welcome turn, forgets dialogue memory and
    /// publishes `history:cleared` with the new snapshot.
    pub fn clear_conversation(&self) -> Vec<Turn> {
        let snapshot = {
            let mut session = self.lock_session();
            session.clear();
            session.history.snapshot()
        };
        info!("conversation cleared");
        self.channel.publish(ChatEvent::HistoryCleared(snapshot.clone()));
        snapshot
    }

    /// Subscribes the engine to the shell's submit/clear/category events and
    /// announces `chat:ready`. Async work is spawned on the current tokio
    /// runtime. The channel holds only weak references to the engine.
    pub fn attach(self: &Arc<Self>) -> Result<Vec<Subscription>> {
        let runtime =
            Handle::try_current().context("DialogueEngine::attach requires a tokio runtime")?;
        let mut subscriptions = Vec::new();

        let engine = Arc::downgrade(self);
        let handle = runtime.clone();
        subscriptions.push(self.channel.subscribe(EventKind::SubmitText, move |event| {
            if let (ChatEvent::SubmitText(text), Some(engine)) = (event, engine.upgrade()) {
                let text = text.clone();
                handle.spawn(async move {
                    engine.handle_user_input(&text).await;
                });
            }
            Ok(())
        }));

        let engine = Arc::downgrade(self);
        subscriptions.push(self.channel.subscribe(EventKind::ClearConversation, move |_| {
            if let Some(engine) = engine.upgrade() {
                engine.clear_conversation();
            }
            Ok(())
        }));

        let engine = Arc::downgrade(self);
        subscriptions.push(self.channel.subscribe(EventKind::CategorySelected, move |event| {
            if let (ChatEvent::CategorySelected(category), Some(engine)) = (event, engine.upgrade()) {
                let category = category.clone();
                runtime.spawn(async move {
                    engine.handle_category(&category).await;
                });
            }
            Ok(())
        }));

        self.channel.publish(ChatEvent::ConversationReady(self.history()));
        Ok(subscriptions)
    }

    async fn run_turn(&self, raw: &str, forced: Option<Intent>) -> Option<Turn> {
        let text = raw.trim();
        if text.is_empty() {
            return None;
        }
        let Some(_guard) = TurnGuard::acquire(self) else {
            debug!("input ignored while another turn is in flight");
            return None;
        };

        let user_turn = Turn::user(text);
        let pending = self.record_turn(user_turn.clone());
        self.channel.publish(ChatEvent::UserTurnAdded(user_turn));
        self.persist(pending).await;
        self.channel.publish(ChatEvent::TurnStarted);

        let assistant_turn = match self.respond(text, forced).await {
            Ok(reply) => reply.into_turn(),
            Err(err) => {
                warn!(error = %err, "turn failed");
                Turn::assistant(messages::GENERIC_FAILURE)
            }
        };
        let pending = self.record_turn(assistant_turn.clone());
        self.persist(pending).await;
        self.channel.publish(ChatEvent::AssistantTurnAdded(assistant_turn.clone()));
        Some(assistant_turn)
    }

    /// Appends in memory and returns the write to perform once the session
    /// lock is released.
    fn record_turn(&self, turn: Turn) -> Option<PendingSave> {
        let mut session = self.lock_session();
        session.history.push(turn);
        match session.history.pending_save() {
            Ok(pending) => Some(pending),
            Err(err) => {
                warn!(error = %err, "failed to serialize conversation history");
                None
            }
        }
    }

    /// Writes history on the blocking pool so slow stores do not stall the
    /// runtime. Failures are logged; the in-memory history stands.
    async fn persist(&self, pending: Option<PendingSave>) {
        let Some(pending) = pending else {
            return;
        };
        let key = pending.key().to_string();
        match tokio::task::spawn_blocking(move || pending.write()).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                warn!(key = %key, error = %err, "failed to persist conversation history");
            }
            Err(err) => {
                warn!(key = %key, error = %err, "conversation history write task failed");
            }
        }
    }

    async fn respond(&self, text: &str, forced: Option<Intent>) -> Result<Reply, BackendError> {
        if !self.gate.is_active() {
            info!("no active session; asking the user to log in");
            return Ok(Reply::text(messages::LOGIN_REQUIRED));
        }

        let intent = match forced {
            Some(intent) => intent,
            None => self.classifier.route(text, &self.context()),
        };
        debug!(?intent, "classified input");

        match intent {
            Intent::Phone => self.analyze_phone(text).await,
            Intent::Compare => self.compare(text).await,
            Intent::FollowUp => self.follow_up(text).await,
            Intent::Question => self.question(text).await,
            // Unknown is only produced for blank text, which run_turn rejects.
            Intent::General | Intent::Unknown => {
                self.lock_session().context.record_general();
                self.general(text).await
            }
        }
    }

    /// Context is updated before the call and kept if the analysis fails.
    async fn analyze_phone(&self, text: &str) -> Result<Reply, BackendError> {
        let digits = normalize_digits(text);
        self.lock_session().context.record_phone(digits.clone());

        let result = self.call(self.backend.analyze(&digits)).await?;
        if !result.success {
            return Err(BackendError::rejected(
                result.message.as_deref(),
                messages::ANALYSIS_REJECTED,
            ));
        }
        let content = result
            .narrative
            .clone()
            .unwrap_or_else(|| messages::analyzed_number(&digits));
        let data = result
            .analysis_data
            .unwrap_or_else(|| json!({ "phoneNumber": result.phone_number }));
        Ok(Reply {
            content,
            analysis_data: Some(data),
        })
    }

    /// A failed follow-up is retried once as a general question.
    async fn follow_up(&self, text: &str) -> Result<Reply, BackendError> {
        let phone_number = {
            let mut session = self.lock_session();
            session.context.record_follow_up();
            session.context.last_phone_number.clone()
        };
        match self.ask(AskRequest::followup(text, phone_number)).await {
            Ok(answer) => Ok(Reply::text(
                answer.unwrap_or_else(|| messages::NO_SPECIFIC_ANSWER.to_string()),
            )),
            Err(err) => {
                warn!(error = %err, "follow-up failed; retrying as a general question");
                self.general(text).await
            }
        }
    }

    async fn question(&self, text: &str) -> Result<Reply, BackendError> {
        let phone_number = {
            let mut session = self.lock_session();
            let Some(phone_number) = session.context.last_phone_number.clone() else {
                return Ok(Reply::text(messages::PHONE_REQUIRED));
            };
            session.context.record_question();
            phone_number
        };
        let answer = self.ask(AskRequest::question(text, phone_number)).await?;
        Ok(Reply::text(
            answer.unwrap_or_else(|| messages::NO_SPECIFIC_ANSWER.to_string()),
        ))
    }

    async fn general(&self, text: &str) -> Result<Reply, BackendError> {
        let answer = self.ask(AskRequest::general(text)).await?;
        Ok(Reply::text(
            answer.unwrap_or_else(|| messages::NO_SPECIFIC_ANSWER.to_string()),
        ))
    }

    async fn compare(&self, text: &str) -> Result<Reply, BackendError> {
        self.lock_session().context.record_compare();
        let phone_numbers = extract_phone_numbers(text);
        if phone_numbers.len() < 2 {
            return Ok(Reply::text(messages::TWO_NUMBERS_REQUIRED));
        }
        let answer = self
            .ask(AskRequest::compare(text, phone_numbers.clone()))
            .await?;
        Ok(Reply::text(
            answer.unwrap_or_else(|| messages::compared_numbers(&phone_numbers)),
        ))
    }

    /// Answer text of a successful ask; `success == false` is a failure.
    async fn ask(&self, request: AskRequest) -> Result<Option<String>, BackendError> {
        let response = self.call(self.backend.ask(&request)).await?;
        if !response.success {
            return Err(BackendError::rejected(
                response.message.as_deref(),
                messages::QUESTION_REJECTED,
            ));
        }
        Ok(response.answer)
    }

    async fn call<T>(
        &self,
        request: impl Future<Output = Result<T, BackendError>>,
    ) -> Result<T, BackendError> {
        match tokio::time::timeout(self.request_timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(BackendError::Timeout(self.request_timeout)),
        }
    }

    fn lock_session(&self) -> MutexGuard<'_, DialogueSession> {
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
