//! Message service for orchestrating message operations.
//!
//! The [`MessageService`] sits between callers and a [`MessageBackend`]: it
//! fetches part trees, resolves them, and turns attachment references into
//! downloads and saved files. Nothing is cached between calls.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::batch::{Batch, BatchItem};
use crate::config::Settings;
use crate::domain::{AttachmentEntry, DraftId, EmailId, Label, PartId, ResolvedMessage};
use crate::mime::{self, AttachmentIndex, BodyWindow, DuplicatePartId, ResolveError};
use crate::providers::email::{
    DraftRef, MessageBackend, MessageQuery, MessageRef, OutgoingEmail, ProviderError,
};

/// Errors raised by [`MessageService`] operations.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Attachment reference could not be resolved.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Backend call failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The backend returned a part tree that breaks its own contract.
    #[error("invalid message state: {0}")]
    InvalidState(#[from] DuplicatePartId),

    /// Writing a file failed.
    #[error("failed to write {path}: {source}")]
    Io {
        /// Destination path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The caller's request is incomplete or inconsistent.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Result type alias for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// A resolved message together with its attachments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageDetails {
    /// Header fields and selected body.
    pub email: ResolvedMessage,
    /// Attachments keyed by part ID.
    pub attachments: AttachmentIndex,
}

/// Attachment bytes with the entry they were resolved from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedAttachment {
    /// Entry as of the revalidating fetch.
    pub entry: AttachmentEntry,
    /// Decoded content.
    pub data: Bytes,
}

/// An attachment written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedAttachment {
    /// Part the bytes came from.
    pub part_id: PartId,
    /// Original filename.
    pub filename: String,
    /// Where the bytes were written.
    pub path: PathBuf,
    /// Number of bytes written.
    pub size_bytes: u64,
}

/// One entry of a bulk save request. All fields are required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    /// Message holding the attachment.
    pub message_id: Option<EmailId>,
    /// Part ID of the attachment.
    pub part_id: Option<PartId>,
    /// Destination path.
    pub save_path: Option<PathBuf>,
}

impl SaveRequest {
    /// Creates a complete request.
    pub fn new(message_id: impl Into<EmailId>, part_id: impl Into<PartId>, save_path: impl Into<PathBuf>) -> Self {
        Self {
            message_id: Some(message_id.into()),
            part_id: Some(part_id.into()),
            save_path: Some(save_path.into()),
        }
    }

    fn key(&self) -> String {
        format!(
            "{}/{}",
            self.message_id.as_ref().map(|m| m.0.as_str()).unwrap_or("-"),
            self.part_id.as_ref().map(PartId::as_str).unwrap_or("-"),
        )
    }
}

/// What [`MessageService::create_reply`] did with the reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum ReplyOutcome {
    /// The reply was sent.
    Sent(MessageRef),
    /// The reply was stored as a draft.
    Drafted(DraftRef),
}

/// Orchestrates message operations over a backend.
///
/// # Example
///
/// ```ignore
/// let service = MessageService::new(Arc::new(backend), settings);
/// let details = service.get_message(&EmailId::from("18c1f"), true).await?;
/// let window = service.get_message_body_window(&details.email.id, 0, Some(500)).await?;
/// ```
pub struct MessageService<B: MessageBackend> {
    backend: Arc<B>,
    settings: Settings,
}

impl<B: MessageBackend> MessageService<B> {
    /// Creates a service over `backend`.
    pub fn new(backend: Arc<B>, settings: Settings) -> Self {
        Self { backend, settings }
    }

    /// Returns the settings in use.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Fetches and resolves a message.
    pub async fn get_message(&self, message_id: &EmailId, include_body: bool) -> Result<MessageDetails> {
        let raw = self.backend.fetch_message_tree(message_id, include_body).await?;
        let (email, attachments) = mime::resolve_message(&raw, include_body)?;

        tracing::debug!(
            message_id = %message_id,
            attachments = attachments.len(),
            has_body = email.body.is_some(),
            "resolved message"
        );
        Ok(MessageDetails { email, attachments })
    }

    /// Returns a window of the message's selected body.
    ///
    /// `limit` defaults to the configured window length.
    pub async fn get_message_body_window(
        &self,
        message_id: &EmailId,
        offset: usize,
        limit: Option<usize>,
    ) -> Result<BodyWindow> {
        let details = self.get_message(message_id, true).await?;
        let limit = limit.unwrap_or(self.settings.body.window_limit);
        Ok(mime::paginate(details.email.body.as_deref(), offset, limit))
    }

    /// Resolves a part ID to an entry with a currently valid handle.
    pub async fn resolve_attachment(&self, message_id: &EmailId, part_id: &PartId) -> Result<AttachmentEntry> {
        Ok(mime::resolve(self.backend.as_ref(), message_id, part_id).await?)
    }

    /// Resolves and downloads an attachment.
    pub async fn download_attachment(&self, message_id: &EmailId, part_id: &PartId) -> Result<DownloadedAttachment> {
        let entry = self.resolve_attachment(message_id, part_id).await?;
        let attachment = self
            .backend
            .download_attachment(message_id, &entry.attachment_id)
            .await?;

        if attachment.data.len() as u64 != entry.size_bytes {
            tracing::warn!(
                message_id = %message_id,
                part_id = %part_id,
                expected = entry.size_bytes,
                actual = attachment.data.len(),
                "attachment size differs from part metadata"
            );
        }

        Ok(DownloadedAttachment {
            entry,
            data: attachment.data,
        })
    }

    /// Searches messages and returns their header fields without bodies.
    ///
    /// `max_results` defaults to the configured page size and is clamped to
    /// `1..=500`. Only a failed search is an error; a listed message that
    /// cannot be fetched is logged and left out.
    pub async fn query_messages(&self, query: Option<String>, max_results: Option<u32>) -> Result<Vec<ResolvedMessage>> {
        let query = MessageQuery::new(query, max_results.unwrap_or(self.settings.gmail.max_results));
        let refs = self.backend.list_messages(&query).await?;

        let mut messages = Vec::with_capacity(refs.len());
        for r in refs {
            match self.get_message(&r.id, false).await {
                Ok(details) => messages.push(details.email),
                Err(e) => {
                    tracing::warn!(message_id = %r.id, error = %e, "skipping listed message that failed to load");
                }
            }
        }
        Ok(messages)
    }

    /// Fetches several messages with bodies, isolating per-message failures.
    pub async fn bulk_get_messages(&self, message_ids: &[EmailId]) -> Batch<MessageDetails> {
        let mut batch = Batch::default();
        for id in message_ids {
            match self.get_message(id, true).await {
                Ok(details) => batch.push(BatchItem::ok(id.0.clone(), details)),
                Err(e) => {
                    tracing::warn!(message_id = %id, error = %e, "bulk get failed for message");
                    batch.push(BatchItem::failed(id.0.clone(), e));
                }
            }
        }
        batch
    }

    /// Downloads an attachment and writes it to `path`.
    ///
    /// Relative paths are resolved against the configured save directory.
    /// Parent directories are created as needed.
    pub async fn save_attachment(&self, message_id: &EmailId, part_id: &PartId, path: &Path) -> Result<SavedAttachment> {
        let downloaded = self.download_attachment(message_id, part_id).await?;
        let path = self.settings.attachments.resolve_path(path);

        let io_err = |source| ServiceError::Io {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        tokio::fs::write(&path, &downloaded.data).await.map_err(io_err)?;

        tracing::info!(
            message_id = %message_id,
            part_id = %part_id,
            path = %path.display(),
            bytes = downloaded.data.len(),
            "saved attachment"
        );
        Ok(SavedAttachment {
            part_id: downloaded.entry.part_id,
            filename: downloaded.entry.filename,
            path,
            size_bytes: downloaded.data.len() as u64,
        })
    }

    /// Saves several attachments, isolating per-request failures.
    pub async fn bulk_save_attachments(&self, requests: &[SaveRequest]) -> Batch<SavedAttachment> {
        let mut batch = Batch::default();
        for request in requests {
            let key = request.key();
            let (Some(message_id), Some(part_id), Some(path)) =
                (&request.message_id, &request.part_id, &request.save_path)
            else {
                tracing::warn!(key = %key, "bulk save request is missing fields");
                batch.push(BatchItem::failed(
                    key,
                    ServiceError::InvalidRequest("messageId, partId and savePath are required".to_string()),
                ));
                continue;
            };

            match self.save_attachment(message_id, part_id, path).await {
                Ok(saved) => batch.push(BatchItem::ok(key, saved)),
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "bulk save failed for attachment");
                    batch.push(BatchItem::failed(key, e));
                }
            }
        }
        batch
    }

    /// Lists mailbox labels.
    pub async fn labels(&self) -> Result<Vec<Label>> {
        Ok(self.backend.fetch_labels().await?)
    }

    /// Stores `email` as a draft.
    pub async fn create_draft(&self, email: &OutgoingEmail) -> Result<DraftRef> {
        if email.to.is_empty() {
            return Err(ServiceError::InvalidRequest("draft needs at least one recipient".to_string()));
        }
        Ok(self.backend.create_draft(email).await?)
    }

    /// Deletes a draft.
    pub async fn delete_draft(&self, draft_id: &DraftId) -> Result<()> {
        Ok(self.backend.delete_draft(draft_id).await?)
    }

    /// Replies to a message in its thread, either sending or drafting it.
    pub async fn create_reply(
        &self,
        original_id: &EmailId,
        body: &str,
        send: bool,
        cc: Vec<String>,
    ) -> Result<ReplyOutcome> {
        let original = self.get_message(original_id, false).await?.email;
        let reply = build_reply(&original, body, cc)?;

        if send {
            let sent = self.backend.send_email(&reply).await?;
            tracing::info!(original = %original_id, message_id = %sent.id, "reply sent");
            Ok(ReplyOutcome::Sent(sent))
        } else {
            let draft = self.backend.create_draft(&reply).await?;
            tracing::info!(original = %original_id, draft_id = %draft.id, "reply drafted");
            Ok(ReplyOutcome::Drafted(draft))
        }
    }
}

/// Builds a reply to `original` addressed to its sender.
fn build_reply(original: &ResolvedMessage, body: &str, cc: Vec<String>) -> Result<OutgoingEmail> {
    let to = original
        .from
        .clone()
        .filter(|f| !f.trim().is_empty())
        .ok_or_else(|| ServiceError::InvalidRequest(format!("message {} has no sender to reply to", original.id)))?;

    let subject = original.subject.as_deref().unwrap_or_default();
    let subject = if subject.get(..3).is_some_and(|p| p.eq_ignore_ascii_case("re:")) {
        subject.to_string()
    } else {
        format!("Re: {}", subject)
    };

    let mut references: Vec<&str> = original.reference_chain();
    if let Some(id) = original.message_id.as_deref() {
        if !references.contains(&id) {
            references.push(id);
        }
    }

    Ok(OutgoingEmail {
        to: vec![to],
        cc,
        bcc: Vec::new(),
        subject,
        body_text: body.to_string(),
        thread_id: Some(original.thread_id.clone()),
        in_reply_to: original.message_id.clone(),
        references: (!references.is_empty()).then(|| references.join(" ")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AttachmentHandle, Header, MessagePart, RawMessage, ThreadId};
    use crate::providers::email::testing::MockBackend;
    use crate::providers::email::AttachmentData;
    use base64::engine::general_purpose::URL_SAFE;
    use base64::Engine;
    use mockall::predicate::eq;
    use pretty_assertions::assert_eq;

    fn invoice(id: &str) -> RawMessage {
        RawMessage::new(
            id,
            "t1",
            MessagePart::container(
                "",
                "multipart/mixed",
                vec![
                    MessagePart::inline("0", "text/plain", URL_SAFE.encode("0123456789")),
                    MessagePart::attachment(
                        "1",
                        "application/pdf",
                        "invoice.pdf",
                        AttachmentHandle::new("A1", 3),
                    ),
                ],
            )
            .with_headers(vec![
                Header::new("Subject", "Invoice"),
                Header::new("From", "billing@example.com"),
                Header::new("Message-ID", "<inv@example.com>"),
                Header::new("References", "<root@example.com>"),
            ]),
        )
    }

    fn service(backend: MockBackend) -> MessageService<MockBackend> {
        MessageService::new(Arc::new(backend), Settings::default())
    }

    #[tokio::test]
    async fn get_message_returns_body_and_attachments() {
        let mut backend = MockBackend::new();
        backend
            .expect_fetch_message_tree()
            .with(eq(EmailId::from("m1")), eq(true))
            .returning(|id, _| Ok(invoice(&id.0)));

        let details = service(backend).get_message(&EmailId::from("m1"), true).await.unwrap();
        assert_eq!(details.email.body.as_deref(), Some("0123456789"));
        assert_eq!(details.attachments.len(), 1);

        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["attachments"]["1"]["filename"], "invoice.pdf");
        assert_eq!(json["email"]["subject"], "Invoice");
    }

    #[tokio::test]
    async fn body_window_uses_default_limit() {
        let mut backend = MockBackend::new();
        backend
            .expect_fetch_message_tree()
            .returning(|id, _| Ok(invoice(&id.0)));

        let mut settings = Settings::default();
        settings.body.window_limit = 4;
        let service = MessageService::new(Arc::new(backend), settings);

        let window = service
            .get_message_body_window(&EmailId::from("m1"), 2, None)
            .await
            .unwrap();
        assert_eq!(window.text.as_deref(), Some("2345"));
        assert_eq!(window.total_length, 10);
        assert!(window.has_more);
    }

    #[tokio::test]
    async fn download_uses_revalidated_handle() {
        let mut backend = MockBackend::new();
        backend
            .expect_fetch_message_tree()
            .with(eq(EmailId::from("m1")), eq(false))
            .times(1)
            .returning(|id, _| Ok(invoice(&id.0)));
        backend
            .expect_download_attachment()
            .withf(|id, handle| id == &EmailId::from("m1") && handle == "A1")
            .times(1)
            .returning(|_, _| {
                Ok(AttachmentData {
                    data: Bytes::from_static(b"pdf"),
                    size: 3,
                })
            });

        let downloaded = service(backend)
            .download_attachment(&EmailId::from("m1"), &PartId::from("1"))
            .await
            .unwrap();
        assert_eq!(downloaded.data, Bytes::from_static(b"pdf"));
        assert_eq!(downloaded.entry.filename, "invoice.pdf");
    }

    #[tokio::test]
    async fn query_clamps_and_skips_bodies() {
        let mut backend = MockBackend::new();
        backend
            .expect_list_messages()
            .withf(|q| q.max_results == 500 && q.q.as_deref() == Some("is:unread"))
            .returning(|_| {
                Ok(vec![MessageRef {
                    id: EmailId::from("m1"),
                    thread_id: ThreadId::from("t1"),
                }])
            });
        backend
            .expect_fetch_message_tree()
            .with(eq(EmailId::from("m1")), eq(false))
            .returning(|id, _| Ok(invoice(&id.0)));

        let messages = service(backend)
            .query_messages(Some("is:unread".to_string()), Some(9_999))
            .await
            .unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].body.is_none());
    }

    #[tokio::test]
    async fn query_skips_messages_that_fail_to_load() {
        let mut backend = MockBackend::new();
        backend.expect_list_messages().returning(|_| {
            Ok(["good1", "gone", "good2"]
                .into_iter()
                .map(|id| MessageRef {
                    id: EmailId::from(id),
                    thread_id: ThreadId::from("t1"),
                })
                .collect())
        });
        backend.expect_fetch_message_tree().times(3).returning(|id, _| {
            if id.0 == "gone" {
                Err(ProviderError::NotFound("gone".to_string()))
            } else {
                Ok(invoice(&id.0))
            }
        });

        let messages = service(backend).query_messages(None, None).await.unwrap();
        let ids: Vec<&str> = messages.iter().map(|m| m.id.0.as_str()).collect();
        assert_eq!(ids, vec!["good1", "good2"]);
    }

    #[tokio::test]
    async fn query_fails_when_search_fails() {
        let mut backend = MockBackend::new();
        backend
            .expect_list_messages()
            .returning(|_| Err(ProviderError::Authentication("expired".to_string())));
        backend.expect_fetch_message_tree().never();

        let err = service(backend).query_messages(None, None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Provider(ProviderError::Authentication(_))));
    }

    #[tokio::test]
    async fn bulk_get_isolates_failures() {
        let mut backend = MockBackend::new();
        backend.expect_fetch_message_tree().returning(|id, _| {
            if id.0 == "missing" {
                Err(ProviderError::NotFound("missing".to_string()))
            } else {
                Ok(invoice(&id.0))
            }
        });

        let ids = [EmailId::from("m1"), EmailId::from("missing"), EmailId::from("m2")];
        let batch = service(backend).bulk_get_messages(&ids).await;

        assert_eq!(batch.succeeded(), 2);
        assert_eq!(batch.failed(), 1);
        assert_eq!(batch.items[1].key, "missing");
        assert!(batch.items[1].error().unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = MockBackend::new();
        backend
            .expect_fetch_message_tree()
            .returning(|id, _| Ok(invoice(&id.0)));
        backend.expect_download_attachment().returning(|_, _| {
            Ok(AttachmentData {
                data: Bytes::from_static(b"pdf"),
                size: 3,
            })
        });

        let path = dir.path().join("a").join("b").join("invoice.pdf");
        let saved = service(backend)
            .save_attachment(&EmailId::from("m1"), &PartId::from("1"), &path)
            .await
            .unwrap();

        assert_eq!(saved.path, path);
        assert_eq!(saved.size_bytes, 3);
        assert_eq!(std::fs::read(&path).unwrap(), b"pdf");
    }

    #[tokio::test]
    async fn bulk_save_reports_incomplete_and_unknown_parts() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = MockBackend::new();
        backend
            .expect_fetch_message_tree()
            .returning(|id, _| Ok(invoice(&id.0)));
        backend.expect_download_attachment().returning(|_, _| {
            Ok(AttachmentData {
                data: Bytes::from_static(b"pdf"),
                size: 3,
            })
        });

        let requests = vec![
            SaveRequest::new("m1", "1", dir.path().join("ok.pdf")),
            SaveRequest {
                message_id: Some(EmailId::from("m1")),
                ..Default::default()
            },
            SaveRequest::new("m1", "9", dir.path().join("nope.pdf")),
        ];
        let batch = service(backend).bulk_save_attachments(&requests).await;

        assert_eq!(batch.succeeded(), 1);
        assert_eq!(batch.items[1].key, "m1/-");
        assert!(batch.items[1].error().unwrap().contains("required"));
        assert!(batch.items[2].error().unwrap().contains("valid part ids"));
        assert!(!dir.path().join("nope.pdf").exists());
    }

    #[tokio::test]
    async fn duplicate_part_ids_surface_as_invalid_state() {
        let mut backend = MockBackend::new();
        backend.expect_fetch_message_tree().returning(|_, _| {
            Ok(RawMessage::new(
                "m1",
                "t1",
                MessagePart::container(
                    "",
                    "multipart/mixed",
                    vec![
                        MessagePart::attachment("1", "image/png", "a.png", AttachmentHandle::new("A", 1)),
                        MessagePart::attachment("1", "image/png", "b.png", AttachmentHandle::new("B", 1)),
                    ],
                ),
            ))
        });

        let err = service(backend).get_message(&EmailId::from("m1"), true).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn reply_is_drafted_in_thread() {
        let mut backend = MockBackend::new();
        backend
            .expect_fetch_message_tree()
            .returning(|id, _| Ok(invoice(&id.0)));
        backend
            .expect_create_draft()
            .withf(|email| {
                email.to == vec!["billing@example.com".to_string()]
                    && email.subject == "Re: Invoice"
                    && email.in_reply_to.as_deref() == Some("<inv@example.com>")
                    && email.references.as_deref() == Some("<root@example.com> <inv@example.com>")
                    && email.thread_id == Some(ThreadId::from("t1"))
            })
            .times(1)
            .returning(|_| {
                Ok(DraftRef {
                    id: DraftId::from("r-1"),
                    message: MessageRef {
                        id: EmailId::from("d1"),
                        thread_id: ThreadId::from("t1"),
                    },
                })
            });
        backend.expect_send_email().never();

        let outcome = service(backend)
            .create_reply(&EmailId::from("m1"), "Paid, thanks.", false, Vec::new())
            .await
            .unwrap();
        assert!(matches!(outcome, ReplyOutcome::Drafted(_)));
    }

    #[test]
    fn reply_subject_prefix_is_not_repeated() {
        let mut original = ResolvedMessage::from_headers(&invoice("m1"));
        original.subject = Some("RE: Invoice".to_string());

        let reply = build_reply(&original, "ok", vec!["cc@example.com".to_string()]).unwrap();
        assert_eq!(reply.subject, "RE: Invoice");
        assert_eq!(reply.cc, vec!["cc@example.com".to_string()]);
    }

    #[test]
    fn reply_without_sender_is_rejected() {
        let mut original = ResolvedMessage::from_headers(&invoice("m1"));
        original.from = None;
        assert!(matches!(
            build_reply(&original, "ok", Vec::new()),
            Err(ServiceError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn draft_requires_recipient() {
        let mut backend = MockBackend::new();
        backend.expect_create_draft().never();

        let err = service(backend)
            .create_draft(&OutgoingEmail::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidRequest(_)));
    }
}
