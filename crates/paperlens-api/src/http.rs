use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use core_types::Document;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::backend::{
    AiConfigRequest, BackendApi, ConfigureOutcome, ConnectOutcome, HealthReport, HistoryReply,
    QueryReply, QueryRequest, StatusReport, UploadReceipt, UploadRequest,
};
use crate::error::ApiError;

/// Backend client speaking the question-answering service's JSON API.
#[derive(Debug, Clone)]
pub struct HttpBackendClient {
    http: Client,
    base_url: String,
}

impl HttpBackendClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn read_json<R: DeserializeOwned>(response: reqwest::Response) -> Result<R, ApiError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| ApiError::Transport(error.to_string()))?;
        if !status.is_success() {
            return Err(ApiError::Backend(extract_error_message(&body, status)));
        }
        serde_json::from_str(&body)
            .map_err(|error| ApiError::Backend(format!("invalid backend response: {error}")))
    }

    async fn get_json<R: DeserializeOwned>(&self, path: &str) -> Result<R, ApiError> {
        let response = self.http.get(self.url(path)).send().await?;
        Self::read_json(response).await
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, ApiError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let response = self.http.post(self.url(path)).json(body).send().await?;
        Self::read_json(response).await
    }

    async fn delete_json<R: DeserializeOwned>(&self, path: &str) -> Result<R, ApiError> {
        let response = self.http.delete(self.url(path)).send().await?;
        Self::read_json(response).await
    }
}

#[async_trait]
impl BackendApi for HttpBackendClient {
    async fn health(&self) -> Result<HealthReport, ApiError> {
        let raw: HealthEnvelope = self.get_json("/health").await?;
        Ok(HealthReport {
            status: raw.status,
            databricks_connected: raw.databricks_connected,
        })
    }

    async fn connect(&self, host: &str, token: &str) -> Result<ConnectOutcome, ApiError> {
        debug!(host, "connecting to platform");
        let raw: ConnectEnvelope = self
            .post_json("/api/databricks/connect", &ConnectBody { host, token })
            .await?;
        if !raw.success {
            return Err(envelope_error(raw.error, "connection failed"));
        }
        Ok(ConnectOutcome {
            message: raw.message.unwrap_or_else(|| "Connected".to_owned()),
            user: raw.user,
            workspace_url: raw.workspace_url,
        })
    }

    async fn status(&self) -> Result<StatusReport, ApiError> {
        let raw: StatusEnvelope = self.get_json("/api/databricks/status").await?;
        Ok(StatusReport {
            connected: raw.connected,
        })
    }

    async fn configure_ai(&self, request: &AiConfigRequest) -> Result<ConfigureOutcome, ApiError> {
        debug!(provider = %request.provider, model = %request.model, "configuring ai provider");
        let raw: ConfigureEnvelope = self.post_json("/api/ai/configure", request).await?;
        if !raw.success {
            return Err(envelope_error(raw.error, "AI configuration failed"));
        }
        Ok(ConfigureOutcome {
            provider: raw.provider.unwrap_or_else(|| request.provider.clone()),
            model: raw.model.unwrap_or_else(|| request.model.clone()),
            message: raw.message.unwrap_or_else(|| "AI configured".to_owned()),
        })
    }

    async fn upload_pdf(&self, request: UploadRequest) -> Result<UploadReceipt, ApiError> {
        debug!(filename = %request.filename, bytes = request.bytes.len(), "uploading pdf");
        let part = Part::bytes(request.bytes)
            .file_name(request.filename.clone())
            .mime_str("application/pdf")
            .map_err(|error| ApiError::Validation(error.to_string()))?;
        let form = Form::new()
            .part("file", part)
            .text("create_notebook", request.create_notebook.to_string());
        let response = self
            .http
            .post(self.url("/api/pdf/upload"))
            .multipart(form)
            .send()
            .await?;
        let raw: UploadEnvelope = Self::read_json(response).await?;
        if !raw.success {
            return Err(envelope_error(raw.error, "upload failed"));
        }
        let workspace_path = raw
            .workspace_path
            .ok_or_else(|| ApiError::Backend("upload response missing workspace_path".to_owned()))?;
        Ok(UploadReceipt {
            workspace_path,
            notebook_path: raw.notebook_path,
        })
    }

    async fn list_pdfs(&self) -> Result<Vec<Document>, ApiError> {
        let raw: ListEnvelope = self.get_json("/api/pdf/list").await?;
        if !raw.success {
            return Err(envelope_error(raw.error, "document listing failed"));
        }
        Ok(raw.pdfs.into_iter().map(PdfEntry::into_document).collect())
    }

    async fn query_pdf(&self, request: &QueryRequest) -> Result<QueryReply, ApiError> {
        debug!(conversation_id = %request.conversation_id, pdf = %request.pdf_path, "querying pdf");
        let raw: QueryEnvelope = self.post_json("/api/analyze/pdf", request).await?;
        if !raw.success {
            return Err(envelope_error(raw.error, "query failed"));
        }
        Ok(QueryReply {
            answer: raw.answer,
            conversation_id: raw.conversation_id,
            model_used: raw.metadata.and_then(|metadata| metadata.model_used),
        })
    }

    async fn conversation_history(&self, conversation_id: &str) -> Result<HistoryReply, ApiError> {
        let raw: HistoryEnvelope = self
            .get_json(&format!("/api/chat/history/{conversation_id}"))
            .await?;
        if !raw.success {
            return Err(envelope_error(raw.error, "history fetch failed"));
        }
        Ok(HistoryReply {
            conversation_id: raw
                .conversation_id
                .unwrap_or_else(|| conversation_id.to_owned()),
            history: raw.history,
        })
    }

    async fn clear_history(&self, conversation_id: &str) -> Result<String, ApiError> {
        let raw: DeleteEnvelope = self
            .delete_json(&format!("/api/chat/history/{conversation_id}"))
            .await?;
        if !raw.success {
            return Err(envelope_error(raw.error, "history deletion failed"));
        }
        Ok(raw
            .message
            .unwrap_or_else(|| format!("Conversation {conversation_id} cleared")))
    }
}

fn envelope_error(error: Option<String>, fallback: &str) -> ApiError {
    ApiError::Backend(error.unwrap_or_else(|| fallback.to_owned()))
}

/// Pulls a human-readable message out of a non-2xx body. FastAPI-style
/// errors use `detail`; envelope failures use `error`.
fn extract_error_message(body: &str, status: StatusCode) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<String>,
        detail: Option<String>,
        message: Option<String>,
    }

    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = parsed.error.or(parsed.detail).or(parsed.message) {
            return message;
        }
    }
    format!("request failed with status {status}")
}

#[derive(Serialize)]
struct ConnectBody<'a> {
    host: &'a str,
    token: &'a str,
}

#[derive(Deserialize)]
struct HealthEnvelope {
    status: String,
    #[serde(default)]
    databricks_connected: bool,
}

#[derive(Deserialize)]
struct ConnectEnvelope {
    #[serde(default)]
    success: bool,
    message: Option<String>,
    user: Option<String>,
    workspace_url: Option<String>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct StatusEnvelope {
    #[serde(default)]
    connected: bool,
}

#[derive(Deserialize)]
struct ConfigureEnvelope {
    #[serde(default)]
    success: bool,
    provider: Option<String>,
    model: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct UploadEnvelope {
    #[serde(default)]
    success: bool,
    workspace_path: Option<String>,
    notebook_path: Option<String>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct ListEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    pdfs: Vec<PdfEntry>,
    error: Option<String>,
}

/// One listing entry as the backend serializes it. Older backend builds
/// named the display field differently, so all known spellings are kept
/// and resolved by precedence.
#[derive(Deserialize)]
struct PdfEntry {
    workspace_path: String,
    display_name: Option<String>,
    filename: Option<String>,
    name: Option<String>,
    size: Option<u64>,
    upload_date: Option<String>,
}

impl PdfEntry {
    fn into_document(self) -> Document {
        let display_name = self
            .display_name
            .or(self.filename)
            .or(self.name)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| basename(&self.workspace_path));
        Document {
            workspace_path: self.workspace_path,
            display_name,
            size_bytes: self.size.unwrap_or(0),
            uploaded_at: self.upload_date.as_deref().and_then(parse_timestamp),
        }
    }
}

fn basename(path: &str) -> String {
    path.rsplit('/').next().unwrap_or(path).to_owned()
}

/// Accepts RFC 3339 or the backend's naive ISO timestamps, treating the
/// latter as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    raw.parse::<NaiveDateTime>().ok().map(|naive| naive.and_utc())
}

#[derive(Deserialize)]
struct QueryEnvelope {
    #[serde(default)]
    success: bool,
    answer: Option<String>,
    conversation_id: Option<String>,
    metadata: Option<QueryMetadata>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct QueryMetadata {
    model_used: Option<String>,
}

#[derive(Deserialize)]
struct HistoryEnvelope {
    #[serde(default)]
    success: bool,
    conversation_id: Option<String>,
    #[serde(default)]
    history: Value,
    error: Option<String>,
}

#[derive(Deserialize)]
struct DeleteEnvelope {
    #[serde(default)]
    success: bool,
    message: Option<String>,
    error: Option<String>,
}
