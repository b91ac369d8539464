use async_trait::async_trait;
use core_types::Document;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

/// AI provider selection forwarded to `POST /api/ai/configure`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AiConfigRequest {
    pub provider: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,
}

impl AiConfigRequest {
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            cluster_id: None,
            openai_api_key: None,
        }
    }
}

/// One document question, bound to a conversation id so the backend can
/// thread context and the client can detect stale replies.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct QueryRequest {
    pub question: String,
    pub pdf_path: String,
    pub conversation_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub create_notebook: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthReport {
    pub status: String,
    pub databricks_connected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOutcome {
    pub message: String,
    pub user: Option<String>,
    pub workspace_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusReport {
    pub connected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigureOutcome {
    pub provider: String,
    pub model: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub workspace_path: String,
    pub notebook_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryReply {
    pub answer: Option<String>,
    pub conversation_id: Option<String>,
    pub model_used: Option<String>,
}

/// Server-side transcript for one conversation id; the entry shape is
/// backend-defined, so it is carried as raw JSON.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct HistoryReply {
    pub conversation_id: String,
    pub history: Value,
}

/// Seam between the application services and the backend HTTP surface.
#[async_trait]
pub trait BackendApi: Send + Sync {
    async fn health(&self) -> Result<HealthReport, ApiError>;
    async fn connect(&self, host: &str, token: &str) -> Result<ConnectOutcome, ApiError>;
    async fn status(&self) -> Result<StatusReport, ApiError>;
    async fn configure_ai(&self, request: &AiConfigRequest) -> Result<ConfigureOutcome, ApiError>;
    async fn upload_pdf(&self, request: UploadRequest) -> Result<UploadReceipt, ApiError>;
    async fn list_pdfs(&self) -> Result<Vec<Document>, ApiError>;
    async fn query_pdf(&self, request: &QueryRequest) -> Result<QueryReply, ApiError>;
    async fn conversation_history(&self, conversation_id: &str) -> Result<HistoryReply, ApiError>;
    async fn clear_history(&self, conversation_id: &str) -> Result<String, ApiError>;
}
