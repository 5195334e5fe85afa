use crate::chat::{messages, DialogueEngine};
use crate::events::{ChatEvent, EventChannel};
use crate::models::{AnalysisRecord, HistoryPage, Pagination, Turn};
use crate::services::{AnalysisBackend, BackendError};
use crate::settings::AppConfig;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PanelError {
    /// The last loaded page is already the final one.
    #[error("no more analysis history to load")]
    NoMoreData,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl PanelError {
    /// Text suitable for showing in the panel.
    pub fn user_message(&self) -> String {
        match self {
            PanelError::NoMoreData => messages::NO_MORE_HISTORY.to_string(),
            PanelError::Backend(BackendError::Rejected(message)) => message.clone(),
            PanelError::Backend(_) => messages::HISTORY_LOAD_FAILED.to_string(),
        }
    }
}

/// Client-side state of the analysis-history list: loaded records plus the
/// pagination reported by the service.
///
/// Every outcome is also published on the [`EventChannel`] so views can stay
/// passive.
pub struct AnalysisHistoryPanel {
    backend: Arc<dyn AnalysisBackend>,
    channel: EventChannel,
    engine: Option<Arc<DialogueEngine>>,
    records: Vec<AnalysisRecord>,
    pagination: Pagination,
    request_timeout: Duration,
}

impl AnalysisHistoryPanel {
    pub fn new(backend: Arc<dyn AnalysisBackend>, channel: EventChannel, page_limit: u32) -> Self {
        Self {
            backend,
            channel,
            engine: None,
            records: Vec::new(),
            pagination: empty_pagination(page_limit),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn from_config(
        config: &AppConfig,
        backend: Arc<dyn AnalysisBackend>,
        channel: EventChannel,
    ) -> Self {
        Self::new(backend, channel, config.history_panel.page_limit)
            .with_request_timeout(config.backend.request_timeout())
    }

    /// Selected numbers are fed to `engine` as user input.
    pub fn with_engine(mut self, engine: Arc<DialogueEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn records(&self) -> &[AnalysisRecord] {
        &self.records
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    pub fn has_more(&self) -> bool {
        self.pagination.page < self.pagination.pages
    }

    /// Replaces the list with page `page`.
    pub async fn load(&mut self, page: u32, limit: u32) -> Result<&[AnalysisRecord], PanelError> {
        let history = match self.fetch(page, limit).await {
            Ok(history) => history,
            Err(err) => return Err(self.load_failed(err)),
        };
        self.pagination = page_state(&history, page, limit);
        self.records = history.records;
        info!(
            records = self.records.len(),
            page = self.pagination.page,
            pages = self.pagination.pages,
            "analysis history loaded"
        );
        self.channel.publish(ChatEvent::AnalysisHistoryLoaded {
            records: self.records.clone(),
            pagination: self.pagination,
        });
        Ok(&self.records)
    }

    /// Appends the next page. Returns only the newly loaded records.
    pub async fn load_more(&mut self) -> Result<Vec<AnalysisRecord>, PanelError> {
        if !self.has_more() {
            debug!(page = self.pagination.page, "no more analysis history pages");
            return Err(PanelError::NoMoreData);
        }
        let next_page = self.pagination.page + 1;
        let limit = self.pagination.limit;
        let history = match self.fetch(next_page, limit).await {
            Ok(history) => history,
            Err(err) => return Err(self.load_failed(err)),
        };
        self.pagination = page_state(&history, next_page, limit);
        let added = history.records;
        self.records.extend(added.iter().cloned());
        info!(added = added.len(), page = next_page, "loaded more analysis history");
        self.channel.publish(ChatEvent::AnalysisHistoryMoreLoaded {
            records: added.clone(),
            pagination: self.pagination,
        });
        Ok(added)
    }

    /// Deletes every stored analysis on the service and empties the list.
    pub async fn clear(&mut self) -> Result<(), PanelError> {
        if let Err(err) = within(self.request_timeout, self.backend.delete_history()).await {
            warn!(error = %err, "failed to clear analysis history");
            let message = match &err {
                BackendError::Rejected(message) => message.clone(),
                _ => messages::HISTORY_CLEAR_FAILED.to_string(),
            };
            self.channel.publish(ChatEvent::AnalysisHistoryClearFailed(message));
            return Err(err.into());
        }

        self.records.clear();
        self.pagination = empty_pagination(self.pagination.limit);
        info!("analysis history cleared");
        self.channel.publish(ChatEvent::AnalysisHistoryCleared);
        Ok(())
    }

    /// Announces the selection and, when an engine is attached, submits the
    /// number to it. Returns the engine's reply.
    pub async fn select(&self, phone_number: &str) -> Option<Turn> {
        self.channel
            .publish(ChatEvent::AnalysisHistoryItemSelected(phone_number.to_string()));
        match &self.engine {
            Some(engine) => engine.handle_user_input(phone_number).await,
            None => None,
        }
    }

    async fn fetch(&self, page: u32, limit: u32) -> Result<HistoryPage, BackendError> {
        within(self.request_timeout, self.backend.history(page, limit)).await
    }

    fn load_failed(&self, err: BackendError) -> PanelError {
        warn!(error = %err, "failed to load analysis history");
        let err = PanelError::from(err);
        self.channel
            .publish(ChatEvent::AnalysisHistoryLoadFailed(err.user_message()));
        err
    }
}

async fn within<T>(
    timeout: Duration,
    request: impl Future<Output = Result<T, BackendError>>,
) -> Result<T, BackendError> {
    tokio::time::timeout(timeout, request)
        .await
        .unwrap_or(Err(BackendError::Timeout(timeout)))
}

fn empty_pagination(limit: u32) -> Pagination {
    Pagination {
        page: 1,
        limit,
        total: 0,
        pages: 1,
    }
}

/// Pagination after loading `page`; the page number is the one requested.
fn page_state(history: &HistoryPage, page: u32, limit: u32) -> Pagination {
    let reported = history.pagination_or(page, limit);
    Pagination {
        page,
        limit: if reported.limit == 0 { limit } else { reported.limit },
        total: reported.total,
        pages: reported.pages.max(1),
    }
}
