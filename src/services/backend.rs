//! Boundary to the remote numerology service.

use crate::models::{AnalysisResult, AskRequest, AskResponse, HistoryPage};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Failure of any remote call. The dialogue engine treats every variant the
/// same way; the distinction only matters for logs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("network error: {0}")]
    Network(String),

    #[error("service responded with status {code}: {message}")]
    Status { code: u16, message: String },

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("service rejected the request: {0}")]
    Rejected(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl BackendError {
    pub fn rejected(message: Option<&str>, fallback: &str) -> Self {
        BackendError::Rejected(message.unwrap_or(fallback).to_string())
    }
}

/// Remote analysis service consumed by the chat core.
///
/// Implementations are adapters over the HTTP API. They normalize raw replies
/// with [`AnalysisResult::from_raw`], [`AskResponse::from_raw`] and
/// [`HistoryPage::from_raw`] and may return `success == false` results; the
/// callers in this crate convert those into [`BackendError::Rejected`].
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    async fn analyze(&self, phone_number: &str) -> Result<AnalysisResult, BackendError>;

    async fn ask(&self, request: &AskRequest) -> Result<AskResponse, BackendError>;

    async fn history(&self, page: u32, limit: u32) -> Result<HistoryPage, BackendError>;

    async fn delete_history(&self) -> Result<(), BackendError>;
}
