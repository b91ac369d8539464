use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use core_types::Document;
use parking_lot::Mutex;
use paperlens_api::{
    AiConfigRequest, ApiError, BackendApi, ConfigureOutcome, ConnectOutcome, HealthReport,
    HistoryReply, QueryReply, QueryRequest, StatusReport, UploadReceipt, UploadRequest,
};
use tokio::sync::Notify;

/// Scripted backend double. Each method pops its reply queue; an empty
/// queue yields a backend error so unscripted calls fail loudly.
#[derive(Default)]
pub(crate) struct MockBackend {
    pub status_replies: Mutex<VecDeque<Result<StatusReport, ApiError>>>,
    pub connect_replies: Mutex<VecDeque<Result<ConnectOutcome, ApiError>>>,
    pub configure_replies: Mutex<VecDeque<Result<ConfigureOutcome, ApiError>>>,
    pub upload_replies: Mutex<VecDeque<Result<UploadReceipt, ApiError>>>,
    pub list_replies: Mutex<VecDeque<Result<Vec<Document>, ApiError>>>,
    pub query_replies: Mutex<VecDeque<Result<QueryReply, ApiError>>>,
    pub clear_replies: Mutex<VecDeque<Result<String, ApiError>>>,

    pub query_requests: Mutex<Vec<QueryRequest>>,
    pub status_calls: AtomicUsize,
    pub connect_calls: AtomicUsize,
    pub configure_calls: AtomicUsize,
    pub upload_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub query_calls: AtomicUsize,
    pub clear_calls: AtomicUsize,

    /// When set, `query_pdf` parks until the gate is notified, letting
    /// tests interleave work with an in-flight request.
    pub query_gate: Option<Arc<Notify>>,
}

impl MockBackend {
    pub fn arc() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn connect_ok(&self) {
        self.connect_replies.lock().push_back(Ok(ConnectOutcome {
            message: "Successfully connected".to_owned(),
            user: Some("tester@example.com".to_owned()),
            workspace_url: Some("https://dbc.example.com".to_owned()),
        }));
    }

    pub fn configure_ok(&self) {
        self.configure_replies.lock().push_back(Ok(ConfigureOutcome {
            provider: "databricks".to_owned(),
            model: "llama-3".to_owned(),
            message: "AI configured".to_owned(),
        }));
    }

    pub fn status_connected(&self, connected: bool) {
        self.status_replies
            .lock()
            .push_back(Ok(StatusReport { connected }));
    }

    pub fn answer(&self, text: &str) {
        self.query_replies.lock().push_back(Ok(QueryReply {
            answer: Some(text.to_owned()),
            conversation_id: None,
            model_used: Some("llama-3".to_owned()),
        }));
    }

    pub fn query_fails(&self, message: &str) {
        self.query_replies
            .lock()
            .push_back(Err(ApiError::Backend(message.to_owned())));
    }
}

fn unscripted<T>() -> Result<T, ApiError> {
    Err(ApiError::Backend("no scripted reply".to_owned()))
}

#[async_trait]
impl BackendApi for MockBackend {
    async fn health(&self) -> Result<HealthReport, ApiError> {
        Ok(HealthReport {
            status: "healthy".to_owned(),
            databricks_connected: false,
        })
    }

    async fn connect(&self, _host: &str, _token: &str) -> Result<ConnectOutcome, ApiError> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        self.connect_replies
            .lock()
            .pop_front()
            .unwrap_or_else(unscripted)
    }

    async fn status(&self) -> Result<StatusReport, ApiError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.status_replies
            .lock()
            .pop_front()
            .unwrap_or_else(unscripted)
    }

    async fn configure_ai(&self, _request: &AiConfigRequest) -> Result<ConfigureOutcome, ApiError> {
        self.configure_calls.fetch_add(1, Ordering::SeqCst);
        self.configure_replies
            .lock()
            .pop_front()
            .unwrap_or_else(unscripted)
    }

    async fn upload_pdf(&self, _request: UploadRequest) -> Result<UploadReceipt, ApiError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        self.upload_replies
            .lock()
            .pop_front()
            .unwrap_or_else(unscripted)
    }

    async fn list_pdfs(&self) -> Result<Vec<Document>, ApiError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.list_replies
            .lock()
            .pop_front()
            .unwrap_or_else(unscripted)
    }

    async fn query_pdf(&self, request: &QueryRequest) -> Result<QueryReply, ApiError> {
        self.query_requests.lock().push(request.clone());
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.query_gate {
            gate.notified().await;
        }
        self.query_replies
            .lock()
            .pop_front()
            .unwrap_or_else(unscripted)
    }

    async fn conversation_history(&self, conversation_id: &str) -> Result<HistoryReply, ApiError> {
        Ok(HistoryReply {
            conversation_id: conversation_id.to_owned(),
            history: serde_json::Value::Array(Vec::new()),
        })
    }

    async fn clear_history(&self, conversation_id: &str) -> Result<String, ApiError> {
        self.clear_calls.fetch_add(1, Ordering::SeqCst);
        self.clear_replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(format!("Conversation {conversation_id} cleared")))
    }
}
