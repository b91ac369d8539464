use std::sync::Arc;
use std::time::Duration;

use config::AppConfig;
use core_types::{ConnectionState, Document};
use parking_lot::Mutex;
use paperlens_api::{
    ApiError, BackendApi, HealthReport, HistoryReply, HttpBackendClient, UploadReceipt,
    UploadRequest,
};
use tracing::{info, warn};

use crate::analysis::AnalysisRunner;
use crate::conversation::ConversationManager;
use crate::gate::SessionGate;

pub struct AppServicesBuilder {
    config: AppConfig,
    backend: Option<Arc<dyn BackendApi>>,
}

impl AppServicesBuilder {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            backend: None,
        }
    }

    pub fn with_backend(mut self, backend: Arc<dyn BackendApi>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn build(self) -> anyhow::Result<AppServices> {
        let api: Arc<dyn BackendApi> = match self.backend {
            Some(api) => api,
            None => Arc::new(HttpBackendClient::new(
                &self.config.api_base_url,
                Duration::from_secs(self.config.request_timeout_secs),
            )?),
        };
        Ok(AppServices {
            gate: Arc::new(SessionGate::new(api.clone())),
            conversation: Arc::new(ConversationManager::new(api.clone())),
            analysis: Arc::new(AnalysisRunner::new(api.clone())),
            documents: Arc::new(Mutex::new(Vec::new())),
            config: Arc::new(self.config),
            api,
        })
    }
}

/// Cheap-to-clone handle bundling every client-side service around one
/// shared backend client.
#[derive(Clone)]
pub struct AppServices {
    config: Arc<AppConfig>,
    api: Arc<dyn BackendApi>,
    gate: Arc<SessionGate>,
    conversation: Arc<ConversationManager>,
    analysis: Arc<AnalysisRunner>,
    documents: Arc<Mutex<Vec<Document>>>,
}

impl AppServices {
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn gate(&self) -> &SessionGate {
        &self.gate
    }

    pub fn conversation(&self) -> &ConversationManager {
        &self.conversation
    }

    pub fn analysis(&self) -> &AnalysisRunner {
        &self.analysis
    }

    /// Initializes the session from configuration and, when a platform
    /// connection came up, primes the document listing.
    pub async fn startup(&self) -> ConnectionState {
        let state = self.gate.initialize(&self.config).await;
        info!(state = state.label(), "session initialized");
        if state.platform_connected() {
            if let Err(error) = self.refresh_documents().await {
                warn!(error = %error, "initial document listing failed");
            }
        }
        state
    }

    /// Replaces the cached document listing with the backend's.
    pub async fn refresh_documents(&self) -> Result<usize, ApiError> {
        let listing = self.api.list_pdfs().await?;
        let count = listing.len();
        *self.documents.lock() = listing;
        Ok(count)
    }

    pub fn documents(&self) -> Vec<Document> {
        self.documents.lock().clone()
    }

    /// Looks a document up by workspace path or display name.
    pub fn find_document(&self, name_or_path: &str) -> Option<Document> {
        self.documents
            .lock()
            .iter()
            .find(|document| {
                document.workspace_path == name_or_path || document.display_name == name_or_path
            })
            .cloned()
    }

    /// Uploads a PDF and refreshes the listing on success. The refresh is
    /// best-effort: a failed listing does not undo a completed upload.
    pub async fn upload_pdf(
        &self,
        filename: &str,
        bytes: Vec<u8>,
        create_notebook: bool,
    ) -> Result<UploadReceipt, ApiError> {
        if !filename.to_lowercase().ends_with(".pdf") {
            return Err(ApiError::Validation(
                "only PDF files can be uploaded".to_owned(),
            ));
        }
        if bytes.is_empty() {
            return Err(ApiError::Validation("the file is empty".to_owned()));
        }

        let receipt = self
            .api
            .upload_pdf(UploadRequest {
                filename: filename.to_owned(),
                bytes,
                create_notebook,
            })
            .await?;
        info!(workspace_path = %receipt.workspace_path, "pdf uploaded");
        if let Err(error) = self.refresh_documents().await {
            warn!(error = %error, "post-upload listing refresh failed");
        }
        Ok(receipt)
    }

    /// Resets the local conversation and asks the backend to forget the
    /// old one. Returns the backend's confirmation message.
    pub async fn clear_conversation(&self) -> Result<String, ApiError> {
        let previous = self.conversation.clear();
        self.api.clear_history(&previous).await
    }

    pub async fn fetch_history(&self, conversation_id: &str) -> Result<HistoryReply, ApiError> {
        self.api.conversation_history(conversation_id).await
    }

    pub async fn health(&self) -> Result<HealthReport, ApiError> {
        self.api.health().await
    }
}
