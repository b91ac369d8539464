use std::cmp;
use std::sync::Arc;

use chrono::Utc;
use core_types::ChatMessage;
use parking_lot::Mutex;
use paperlens_api::{ApiError, BackendApi, QueryRequest};
use tracing::debug;

/// Assistant text shown when a query fails outright.
pub const FAILURE_CONTENT: &str =
    "Sorry, I couldn't process that question. Please try again.";
/// Assistant text shown when the backend accepts a query but returns no
/// answer body.
pub const EMPTY_ANSWER_CONTENT: &str = "No response received";

/// Result of an attempted send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The question was accepted and this assistant message was appended.
    Replied(ChatMessage),
    /// A previous question is still in flight; nothing was changed.
    Busy,
    /// The conversation was cleared while the question was in flight; the
    /// reply was discarded.
    Superseded,
}

struct ConversationInner {
    conversation_id: String,
    document_path: Option<String>,
    messages: Vec<ChatMessage>,
    pending: bool,
    last_message_id: u64,
}

impl ConversationInner {
    fn fresh() -> Self {
        Self {
            conversation_id: crate::ids::conversation_id(),
            document_path: None,
            messages: Vec::new(),
            pending: false,
            last_message_id: 0,
        }
    }

    fn next_message_id(&mut self) -> u64 {
        let id = cmp::max(
            Utc::now().timestamp_millis() as u64,
            self.last_message_id + 1,
        );
        self.last_message_id = id;
        id
    }
}

/// The chat transcript and its single-flight send latch. At most one
/// question is in flight at a time, and every accepted question produces
/// exactly one assistant message, even on failure.
pub struct ConversationManager {
    api: Arc<dyn BackendApi>,
    inner: Mutex<ConversationInner>,
}

impl ConversationManager {
    pub fn new(api: Arc<dyn BackendApi>) -> Self {
        Self {
            api,
            inner: Mutex::new(ConversationInner::fresh()),
        }
    }

    pub fn conversation_id(&self) -> String {
        self.inner.lock().conversation_id.clone()
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.inner.lock().messages.clone()
    }

    pub fn is_pending(&self) -> bool {
        self.inner.lock().pending
    }

    pub fn document(&self) -> Option<String> {
        self.inner.lock().document_path.clone()
    }

    /// Binds the conversation to a workspace document. The transcript is
    /// kept; only future questions target the new document.
    pub fn select_document(&self, workspace_path: impl Into<String>) {
        self.inner.lock().document_path = Some(workspace_path.into());
    }

    /// Resets to an empty transcript under a fresh conversation id and
    /// releases the send latch. Returns the previous id so the caller can
    /// purge server-side history. A reply still in flight for the old id
    /// will be discarded when it lands.
    pub fn clear(&self) -> String {
        let mut inner = self.inner.lock();
        let document_path = inner.document_path.take();
        let previous = std::mem::replace(&mut *inner, ConversationInner::fresh());
        inner.document_path = document_path;
        debug!(previous_id = %previous.conversation_id, "conversation cleared");
        previous.conversation_id
    }

    /// Sends one question about the selected document. Validation failures
    /// return an error and leave the transcript untouched; an accepted
    /// question appends the user message immediately and exactly one
    /// assistant message once the backend replies.
    pub async fn send(&self, question: &str) -> Result<SendOutcome, ApiError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ApiError::Validation("question must not be empty".to_owned()));
        }

        let request = {
            let mut inner = self.inner.lock();
            if inner.pending {
                return Ok(SendOutcome::Busy);
            }
            let document_path = match &inner.document_path {
                Some(path) => path.clone(),
                None => {
                    return Err(ApiError::Validation(
                        "select a document before asking questions".to_owned(),
                    ))
                }
            };
            inner.pending = true;
            let id = inner.next_message_id();
            inner.messages.push(ChatMessage::user(id, question));
            QueryRequest {
                question: question.to_owned(),
                pdf_path: document_path,
                conversation_id: inner.conversation_id.clone(),
            }
        };

        let reply = self.api.query_pdf(&request).await;

        let mut inner = self.inner.lock();
        if inner.conversation_id != request.conversation_id {
            // Cleared mid-flight. The latch now belongs to the new
            // conversation, so it must not be touched here.
            debug!(conversation_id = %request.conversation_id, "discarding stale reply");
            return Ok(SendOutcome::Superseded);
        }
        inner.pending = false;
        let id = inner.next_message_id();
        let message = match reply {
            Ok(reply) => {
                let content = reply
                    .answer
                    .filter(|answer| !answer.trim().is_empty())
                    .unwrap_or_else(|| EMPTY_ANSWER_CONTENT.to_owned());
                ChatMessage::assistant(id, content, reply.model_used)
            }
            Err(error) => {
                ChatMessage::failed_assistant(id, FAILURE_CONTENT, error.detail().to_owned())
            }
        };
        inner.messages.push(message.clone());
        Ok(SendOutcome::Replied(message))
    }
}
