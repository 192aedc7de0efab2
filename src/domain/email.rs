//! Resolved email types.
//!
//! Represents a message after its part tree has been walked: header-derived
//! scalar fields, the selected body, and the attachments found in the tree.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AttachmentHandle, EmailId, LabelId, PartId, RawMessage, ThreadId};

/// A message reduced to the fields callers consume.
///
/// Every header-derived field is `None` when the header is missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedMessage {
    /// Message identifier.
    pub id: EmailId,
    /// Conversation identifier.
    pub thread_id: ThreadId,
    /// `Subject` header.
    pub subject: Option<String>,
    /// `From` header.
    pub from: Option<String>,
    /// `To` header.
    pub to: Option<String>,
    /// `Cc` header.
    pub cc: Option<String>,
    /// `Bcc` header.
    pub bcc: Option<String>,
    /// `Date` header, unparsed.
    pub date: Option<String>,
    /// RFC 5322 `Message-ID` header.
    pub message_id: Option<String>,
    /// `In-Reply-To` header.
    pub in_reply_to: Option<String>,
    /// `References` header.
    pub references: Option<String>,
    /// `Delivered-To` header.
    pub delivered_to: Option<String>,
    /// Provider preview text.
    pub snippet: Option<String>,
    /// Labels applied to the message.
    pub label_ids: Vec<LabelId>,
    /// When the provider received the message.
    pub received_at: Option<DateTime<Utc>>,
    /// Selected body text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// MIME type of the selected body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl ResolvedMessage {
    /// Builds the header-derived part of a resolved message from the root
    /// headers of `raw`. The body fields start empty.
    pub fn from_headers(raw: &RawMessage) -> Self {
        let header = |name: &str| raw.payload.header(name).map(str::to_owned);

        Self {
            id: raw.id.clone(),
            thread_id: raw.thread_id.clone(),
            subject: header("Subject"),
            from: header("From"),
            to: header("To"),
            cc: header("Cc"),
            bcc: header("Bcc"),
            date: header("Date"),
            message_id: header("Message-ID"),
            in_reply_to: header("In-Reply-To"),
            references: header("References"),
            delivered_to: header("Delivered-To"),
            snippet: raw.snippet.clone(),
            label_ids: raw.label_ids.clone(),
            received_at: raw.received_at,
            body: None,
            mime_type: None,
        }
    }

    /// Returns the `References` chain split into individual Message-IDs.
    pub fn reference_chain(&self) -> Vec<&str> {
        self.references
            .as_deref()
            .map(|r| r.split_whitespace().collect())
            .unwrap_or_default()
    }
}

/// Metadata for one attachment found in a part tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentEntry {
    /// Stable structural reference.
    pub part_id: PartId,
    /// Volatile download handle as of the fetch that produced this entry.
    pub attachment_id: String,
    /// Original filename.
    pub filename: String,
    /// MIME content type.
    pub mime_type: String,
    /// Size in bytes.
    pub size_bytes: u64,
}

impl AttachmentEntry {
    /// Returns the download handle carried by this entry.
    pub fn handle(&self) -> AttachmentHandle {
        AttachmentHandle::new(self.attachment_id.clone(), self.size_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Header, MessagePart};

    fn raw_with_headers(headers: Vec<Header>) -> RawMessage {
        RawMessage::new(
            "123",
            "thread123",
            MessagePart::new("", "text/plain").with_headers(headers),
        )
    }

    #[test]
    fn from_headers_maps_every_field() {
        let raw = raw_with_headers(vec![
            Header::new("Subject", "Test Subject"),
            Header::new("From", "test@example.com"),
            Header::new("To", "recipient@example.com"),
            Header::new("Date", "Mon, 17 May 2021 12:00:00 +0000"),
            Header::new("Cc", "cc@example.com"),
            Header::new("Bcc", "bcc@example.com"),
            Header::new("Message-ID", "<message123@example.com>"),
            Header::new("In-Reply-To", "<parent123@example.com>"),
            Header::new("References", "<ref123@example.com>"),
            Header::new("Delivered-To", "delivered@example.com"),
        ]);

        let msg = ResolvedMessage::from_headers(&raw);
        assert_eq!(msg.id, EmailId::from("123"));
        assert_eq!(msg.thread_id, ThreadId::from("thread123"));
        assert_eq!(msg.subject.as_deref(), Some("Test Subject"));
        assert_eq!(msg.from.as_deref(), Some("test@example.com"));
        assert_eq!(msg.to.as_deref(), Some("recipient@example.com"));
        assert_eq!(msg.date.as_deref(), Some("Mon, 17 May 2021 12:00:00 +0000"));
        assert_eq!(msg.cc.as_deref(), Some("cc@example.com"));
        assert_eq!(msg.bcc.as_deref(), Some("bcc@example.com"));
        assert_eq!(msg.message_id.as_deref(), Some("<message123@example.com>"));
        assert_eq!(msg.in_reply_to.as_deref(), Some("<parent123@example.com>"));
        assert_eq!(msg.references.as_deref(), Some("<ref123@example.com>"));
        assert_eq!(msg.delivered_to.as_deref(), Some("delivered@example.com"));
        assert!(msg.body.is_none());
    }

    #[test]
    fn missing_headers_are_none() {
        let msg = ResolvedMessage::from_headers(&raw_with_headers(vec![]));
        assert!(msg.subject.is_none());
        assert!(msg.from.is_none());
        assert!(msg.delivered_to.is_none());
    }

    #[test]
    fn body_fields_are_omitted_when_absent() {
        let msg = ResolvedMessage::from_headers(&raw_with_headers(vec![]));
        let json = serde_json::to_value(&msg).unwrap();
        assert!(json.get("body").is_none());
        assert!(json.get("mimeType").is_none());
        assert_eq!(json["threadId"], "thread123");
    }

    #[test]
    fn reference_chain_splits_on_whitespace() {
        let raw = raw_with_headers(vec![Header::new(
            "References",
            "<a@example.com>\r\n <b@example.com>",
        )]);
        let msg = ResolvedMessage::from_headers(&raw);
        assert_eq!(msg.reference_chain(), vec!["<a@example.com>", "<b@example.com>"]);
    }

    #[test]
    fn attachment_entry_serialization() {
        let entry = AttachmentEntry {
            part_id: PartId::from("1"),
            attachment_id: "A1".to_string(),
            filename: "invoice.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            size_bytes: 12345,
        };

        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"partId\":\"1\""));
        assert!(json.contains("\"sizeBytes\":12345"));

        let deserialized: AttachmentEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.handle(), AttachmentHandle::new("A1", 12345));
    }
}
