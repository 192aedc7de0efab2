//! Message part tree types.
//!
//! A [`MessagePart`] tree is built fresh for every fetch and never mutated
//! afterwards. Container nodes (`multipart/*`) hold ordered children; leaf
//! nodes hold either inline transfer-encoded content or a reference to
//! downloadable attachment bytes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EmailId, LabelId, PartId, ThreadId};

/// A single `name: value` header line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Header name as sent by the provider.
    pub name: String,
    /// Raw header value.
    pub value: String,
}

impl Header {
    /// Creates a header pair.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Backend-issued reference to downloadable attachment content.
///
/// The `id` may rotate between fetches of the same message, so a handle is a
/// short-lived capability: always obtain a fresh one right before download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentHandle {
    /// Volatile attachment identifier.
    pub id: String,
    /// Size of the decoded attachment in bytes.
    pub size: u64,
}

impl AttachmentHandle {
    /// Creates a handle.
    pub fn new(id: impl Into<String>, size: u64) -> Self {
        Self { id: id.into(), size }
    }

    /// Returns true if the backend sent a handle with no usable identifier.
    pub fn is_empty(&self) -> bool {
        self.id.trim().is_empty()
    }
}

/// A node in a message part tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePart {
    /// Structural position of this node.
    pub part_id: PartId,
    /// MIME type, e.g. `text/plain` or `multipart/alternative`.
    pub mime_type: String,
    /// Header lines. Only the root carries the message headers.
    pub headers: Vec<Header>,
    /// Attachment filename, if any.
    pub filename: Option<String>,
    /// URL-safe base64 payload for inline content.
    pub inline_data: Option<String>,
    /// Download handle for attachment content.
    pub attachment: Option<AttachmentHandle>,
    /// Ordered child parts of a container node.
    pub parts: Vec<MessagePart>,
}

impl MessagePart {
    /// Creates an empty node with the given position and type.
    pub fn new(part_id: impl Into<PartId>, mime_type: impl Into<String>) -> Self {
        Self {
            part_id: part_id.into(),
            mime_type: mime_type.into(),
            headers: Vec::new(),
            filename: None,
            inline_data: None,
            attachment: None,
            parts: Vec::new(),
        }
    }

    /// Creates a container node holding `parts`.
    pub fn container(
        part_id: impl Into<PartId>,
        mime_type: impl Into<String>,
        parts: Vec<MessagePart>,
    ) -> Self {
        Self {
            parts,
            ..Self::new(part_id, mime_type)
        }
    }

    /// Creates an inline content leaf with an already encoded payload.
    pub fn inline(
        part_id: impl Into<PartId>,
        mime_type: impl Into<String>,
        data: impl Into<String>,
    ) -> Self {
        Self {
            inline_data: Some(data.into()),
            ..Self::new(part_id, mime_type)
        }
    }

    /// Creates an attachment leaf.
    pub fn attachment(
        part_id: impl Into<PartId>,
        mime_type: impl Into<String>,
        filename: impl Into<String>,
        handle: AttachmentHandle,
    ) -> Self {
        Self {
            filename: Some(filename.into()),
            attachment: Some(handle),
            ..Self::new(part_id, mime_type)
        }
    }

    /// Attaches header lines to this node.
    pub fn with_headers(mut self, headers: Vec<Header>) -> Self {
        self.headers = headers;
        self
    }

    /// A node is an attachment iff it has a non-empty filename and a handle.
    pub fn is_attachment(&self) -> bool {
        self.attachment.is_some() && self.filename.as_deref().is_some_and(|f| !f.is_empty())
    }

    /// Returns true for a leaf carrying inline content.
    pub fn is_inline_leaf(&self) -> bool {
        self.inline_data.is_some() && self.parts.is_empty()
    }

    /// Looks up a header value by case-insensitive name; first match wins.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }
}

/// A fetched message: envelope metadata plus the root of its part tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMessage {
    /// Message identifier.
    pub id: EmailId,
    /// Conversation identifier.
    pub thread_id: ThreadId,
    /// Labels currently applied.
    pub label_ids: Vec<LabelId>,
    /// Provider-generated preview text.
    pub snippet: Option<String>,
    /// When the provider received the message.
    pub received_at: Option<DateTime<Utc>>,
    /// Root of the part tree; carries the message headers.
    pub payload: MessagePart,
}

impl RawMessage {
    /// Creates a message with no labels or envelope extras.
    pub fn new(id: impl Into<EmailId>, thread_id: impl Into<ThreadId>, payload: MessagePart) -> Self {
        Self {
            id: id.into(),
            thread_id: thread_id.into(),
            label_ids: Vec::new(),
            snippet: None,
            received_at: None,
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachment_requires_filename_and_handle() {
        let full = MessagePart::attachment(
            "1",
            "application/pdf",
            "invoice.pdf",
            AttachmentHandle::new("A1", 12345),
        );
        assert!(full.is_attachment());

        let mut no_name = full.clone();
        no_name.filename = Some(String::new());
        assert!(!no_name.is_attachment());

        let mut no_handle = full.clone();
        no_handle.attachment = None;
        assert!(!no_handle.is_attachment());
    }

    #[test]
    fn inline_without_filename_is_not_attachment() {
        let leaf = MessagePart::inline("0", "text/plain", "Qm9keQ");
        assert!(leaf.is_inline_leaf());
        assert!(!leaf.is_attachment());
    }

    #[test]
    fn container_is_not_inline_leaf() {
        let mut node = MessagePart::container(
            "0",
            "multipart/alternative",
            vec![MessagePart::inline("0.0", "text/plain", "eA")],
        );
        node.inline_data = Some("eA".to_string());
        assert!(!node.is_inline_leaf());
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let root = MessagePart::new("", "multipart/mixed").with_headers(vec![
            Header::new("Subject", "first"),
            Header::new("SUBJECT", "second"),
            Header::new("message-id", "<abc@example.com>"),
        ]);

        assert_eq!(root.header("subject"), Some("first"));
        assert_eq!(root.header("Message-ID"), Some("<abc@example.com>"));
        assert_eq!(root.header("Cc"), None);
    }

    #[test]
    fn empty_handle_detection() {
        assert!(AttachmentHandle::new("  ", 10).is_empty());
        assert!(!AttachmentHandle::new("ANGjdJ8", 10).is_empty());
    }
}
