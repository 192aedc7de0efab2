//! Message backend trait definition.
//!
//! This module defines the [`MessageBackend`] trait which abstracts over the
//! provider's message store. The resolver and service layers only talk to
//! the backend through this trait, so tests can swap in an in-memory store.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::domain::{DraftId, EmailId, Label, RawMessage, ThreadId};

/// Result type alias for backend operations.
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Errors that can occur during backend operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// Authentication failed or credentials expired.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Network or connection error.
    #[error("connection error: {0}")]
    Connection(String),

    /// Rate limit exceeded.
    #[error("rate limit exceeded, retry after {retry_after_secs:?} seconds")]
    RateLimited {
        /// Seconds to wait before retrying, if known.
        retry_after_secs: Option<u64>,
    },

    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid request or parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Provider-specific error.
    #[error("provider error: {0}")]
    Provider(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Search parameters for listing messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageQuery {
    /// Provider search expression, e.g. `is:unread from:alice@example.com`.
    pub q: Option<String>,
    /// Maximum number of references to return.
    pub max_results: u32,
}

impl MessageQuery {
    /// Upper bound accepted by the provider for a single page.
    pub const MAX_RESULTS_LIMIT: u32 = 500;

    /// Creates a query, clamping `max_results` to `1..=500`.
    pub fn new(q: Option<String>, max_results: u32) -> Self {
        Self {
            q: q.filter(|q| !q.trim().is_empty()),
            max_results: max_results.clamp(1, Self::MAX_RESULTS_LIMIT),
        }
    }
}

/// Reference to a message returned by a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRef {
    /// Message identifier.
    pub id: EmailId,
    /// Conversation identifier.
    pub thread_id: ThreadId,
}

/// Downloaded attachment content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentData {
    /// Decoded bytes.
    pub data: Bytes,
    /// Size reported by the provider.
    pub size: u64,
}

/// A stored draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftRef {
    /// Draft identifier.
    pub id: DraftId,
    /// Message created for the draft.
    pub message: MessageRef,
}

/// An email to be drafted or sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingEmail {
    /// Recipient addresses.
    pub to: Vec<String>,
    /// CC addresses.
    pub cc: Vec<String>,
    /// BCC addresses.
    pub bcc: Vec<String>,
    /// Email subject.
    pub subject: String,
    /// Plain text body.
    pub body_text: String,
    /// Thread to file the message into, for replies.
    pub thread_id: Option<ThreadId>,
    /// Message-ID of the email being replied to.
    pub in_reply_to: Option<String>,
    /// Full `References` chain for replies.
    pub references: Option<String>,
}

/// Access to a provider's message store.
///
/// Every method maps to a single provider request. Implementations must not
/// retry or cache; both are the caller's concern.
#[async_trait]
pub trait MessageBackend: Send + Sync {
    /// Fetches a message and its part tree.
    ///
    /// `include_body` is a hint that inline body payloads will be consumed.
    /// Must be idempotent: repeated calls return the current state of the
    /// message, including freshly issued attachment handles.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::NotFound`] if the message does not exist.
    async fn fetch_message_tree(&self, message_id: &EmailId, include_body: bool) -> Result<RawMessage>;

    /// Downloads attachment bytes using a handle from a current fetch.
    async fn download_attachment(&self, message_id: &EmailId, attachment_id: &str) -> Result<AttachmentData>;

    /// Lists messages matching a provider search query, newest first.
    async fn list_messages(&self, query: &MessageQuery) -> Result<Vec<MessageRef>>;

    /// Fetches all labels for the mailbox.
    async fn fetch_labels(&self) -> Result<Vec<Label>>;

    /// Stores `email` as a draft.
    async fn create_draft(&self, email: &OutgoingEmail) -> Result<DraftRef>;

    /// Deletes a draft.
    async fn delete_draft(&self, draft_id: &DraftId) -> Result<()>;

    /// Sends `email`, returning the provider message reference.
    async fn send_email(&self, email: &OutgoingEmail) -> Result<MessageRef>;
}
