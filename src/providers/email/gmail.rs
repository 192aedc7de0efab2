//! Gmail API backend implementation.
//!
//! This module provides a [`MessageBackend`] implementation using the Gmail
//! REST API v1. It accepts an already issued OAuth access token; acquiring and
//! refreshing tokens happens elsewhere.
//!
//! # API Usage
//!
//! - `users.messages.get` (`format=full`) for message part trees
//! - `users.messages.attachments.get` for attachment bytes
//! - `users.messages.list` for searches
//! - `users.labels.list` for labels
//! - `users.drafts.create` / `users.drafts.delete` for drafts
//! - `users.messages.send` for sending

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, RETRY_AFTER};
use serde::{Deserialize, Serialize};
use url::Url;

use super::{
    AttachmentData, DraftRef, MessageBackend, MessageQuery, MessageRef, OutgoingEmail,
    ProviderError, Result,
};
use crate::config::GmailSettings;
use crate::domain::{
    AttachmentHandle, DraftId, EmailId, Header, Label, LabelId, MessagePart, RawMessage, ThreadId,
};
use crate::mime::decode::{decode_bytes, encode_text};

/// Gmail API message.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GmailMessage {
    id: String,
    thread_id: String,
    label_ids: Option<Vec<String>>,
    snippet: Option<String>,
    payload: Option<GmailPart>,
    internal_date: Option<String>,
}

/// Gmail message part; the payload root uses the same shape.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GmailPart {
    part_id: Option<String>,
    mime_type: Option<String>,
    filename: Option<String>,
    headers: Option<Vec<GmailHeader>>,
    body: Option<GmailBody>,
    parts: Option<Vec<GmailPart>>,
}

/// Gmail message header.
#[derive(Debug, Deserialize)]
struct GmailHeader {
    name: String,
    value: String,
}

/// Gmail part body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GmailBody {
    data: Option<String>,
    size: Option<u64>,
    attachment_id: Option<String>,
}

/// Gmail attachment download response.
#[derive(Debug, Deserialize)]
struct GmailAttachment {
    data: Option<String>,
    size: Option<u64>,
}

/// Gmail message list response.
#[derive(Debug, Deserialize)]
struct MessageListResponse {
    messages: Option<Vec<GmailMessageRef>>,
}

/// Gmail message reference as returned by list, send and drafts.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GmailMessageRef {
    id: String,
    thread_id: Option<String>,
}

/// Gmail API label.
#[derive(Debug, Deserialize)]
struct GmailLabel {
    id: String,
    name: String,
    #[serde(rename = "type")]
    label_type: Option<String>,
}

/// Gmail labels list response.
#[derive(Debug, Deserialize)]
struct LabelsListResponse {
    labels: Option<Vec<GmailLabel>>,
}

/// Gmail draft.
#[derive(Debug, Deserialize)]
struct GmailDraft {
    id: String,
    message: GmailMessageRef,
}

/// Raw RFC 5322 message payload for send and draft requests.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RawPayload {
    raw: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    thread_id: Option<String>,
}

/// Draft creation request.
#[derive(Debug, Serialize)]
struct DraftRequest {
    message: RawPayload,
}

impl From<GmailPart> for MessagePart {
    fn from(part: GmailPart) -> Self {
        let body = part.body.unwrap_or(GmailBody {
            data: None,
            size: None,
            attachment_id: None,
        });
        let size = body.size.unwrap_or(0);

        MessagePart {
            part_id: part.part_id.unwrap_or_default().into(),
            mime_type: part.mime_type.unwrap_or_default(),
            headers: part
                .headers
                .unwrap_or_default()
                .into_iter()
                .map(|h| Header::new(h.name, h.value))
                .collect(),
            // Gmail sends "" for parts that are not files.
            filename: part.filename.filter(|f| !f.is_empty()),
            inline_data: body.data,
            attachment: body.attachment_id.map(|id| AttachmentHandle::new(id, size)),
            parts: part
                .parts
                .unwrap_or_default()
                .into_iter()
                .map(MessagePart::from)
                .collect(),
        }
    }
}

impl From<GmailMessage> for RawMessage {
    fn from(msg: GmailMessage) -> Self {
        let received_at = msg
            .internal_date
            .as_deref()
            .and_then(|ms| ms.parse::<i64>().ok())
            .and_then(DateTime::<Utc>::from_timestamp_millis);

        RawMessage {
            id: EmailId::from(msg.id),
            thread_id: ThreadId::from(msg.thread_id),
            label_ids: msg
                .label_ids
                .unwrap_or_default()
                .into_iter()
                .map(LabelId::from)
                .collect(),
            snippet: msg.snippet,
            received_at,
            payload: msg
                .payload
                .map(MessagePart::from)
                .unwrap_or_else(|| MessagePart::new("", "")),
        }
    }
}

impl From<GmailMessageRef> for MessageRef {
    fn from(r: GmailMessageRef) -> Self {
        MessageRef {
            id: EmailId::from(r.id),
            thread_id: ThreadId::from(r.thread_id.unwrap_or_default()),
        }
    }
}

impl From<GmailLabel> for Label {
    fn from(l: GmailLabel) -> Self {
        Label {
            is_system: l.label_type.as_deref() == Some("system"),
            id: LabelId::from(l.id),
            name: l.name,
        }
    }
}

/// Gmail backend over the REST API.
pub struct GmailBackend {
    client: reqwest::Client,
    /// `{api_base}/users/{user_id}`.
    base: Url,
    access_token: String,
}

impl GmailBackend {
    /// Creates a backend for the mailbox named in `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::InvalidRequest`] for an unusable API base URL
    /// or an empty token.
    pub fn new(access_token: impl Into<String>, settings: &GmailSettings) -> Result<Self> {
        let access_token = access_token.into();
        if access_token.trim().is_empty() {
            return Err(ProviderError::Authentication("empty access token".to_string()));
        }

        let mut base = Url::parse(&settings.api_base)
            .map_err(|e| ProviderError::InvalidRequest(format!("api base {}: {}", settings.api_base, e)))?;
        base.path_segments_mut()
            .map_err(|()| ProviderError::InvalidRequest(format!("api base {} cannot hold a path", settings.api_base)))?
            .pop_if_empty()
            .extend(["users", settings.user_id.as_str()]);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|e| ProviderError::Internal(format!("http client: {}", e)))?;

        Ok(Self {
            client,
            base,
            access_token,
        })
    }

    /// Builds an endpoint URL below the mailbox root.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ProviderError::Internal("api base cannot hold a path".to_string()))?
            .extend(segments);
        Ok(url)
    }

    /// Builds authorization headers for API requests.
    fn auth_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.access_token))
                .map_err(|e| ProviderError::Internal(format!("invalid header: {}", e)))?,
        );
        Ok(headers)
    }

    /// Makes an authenticated GET request.
    async fn get<T: for<'de> Deserialize<'de>>(&self, url: Url) -> Result<T> {
        let response = self
            .client
            .get(url)
            .headers(self.auth_headers()?)
            .send()
            .await
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        Self::handle_response(response).await
    }

    /// Makes an authenticated POST request with a JSON body.
    async fn post<T: for<'de> Deserialize<'de>, B: Serialize>(&self, url: Url, body: &B) -> Result<T> {
        let response = self
            .client
            .post(url)
            .headers(self.auth_headers()?)
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        Self::handle_response(response).await
    }

    /// Makes an authenticated DELETE request that returns no body.
    async fn delete(&self, url: Url) -> Result<()> {
        let response = self
            .client
            .delete(url)
            .headers(self.auth_headers()?)
            .send()
            .await
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::handle_error(response).await);
        }
        Ok(())
    }

    /// Handles API response, checking for errors.
    async fn handle_response<T: for<'de> Deserialize<'de>>(response: reqwest::Response) -> Result<T> {
        if !response.status().is_success() {
            return Err(Self::handle_error(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::Internal(format!("parse response: {}", e)))
    }

    /// Handles API error responses.
    async fn handle_error(response: reqwest::Response) -> ProviderError {
        let status = response.status();
        let retry_after_secs = retry_after(response.headers());
        let body = response.text().await.unwrap_or_default();

        match status.as_u16() {
            401 => ProviderError::Authentication(format!("unauthorized: {}", body)),
            404 => ProviderError::NotFound(body),
            429 => ProviderError::RateLimited { retry_after_secs },
            _ => ProviderError::Provider(format!("API error ({}): {}", status, body)),
        }
    }
}

/// Reads a `Retry-After` header given in seconds.
fn retry_after(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Builds an RFC 5322 message from `email`.
///
/// No `From` header is written; Gmail fills in the authenticated sender.
fn build_raw_message(email: &OutgoingEmail) -> String {
    let mut message = String::new();

    message.push_str(&format!("To: {}\r\n", email.to.join(", ")));
    if !email.cc.is_empty() {
        message.push_str(&format!("Cc: {}\r\n", email.cc.join(", ")));
    }
    if !email.bcc.is_empty() {
        message.push_str(&format!("Bcc: {}\r\n", email.bcc.join(", ")));
    }
    message.push_str(&format!("Subject: {}\r\n", email.subject));
    if let Some(in_reply_to) = &email.in_reply_to {
        message.push_str(&format!("In-Reply-To: {}\r\n", in_reply_to));
    }
    if let Some(references) = &email.references {
        message.push_str(&format!("References: {}\r\n", references));
    }
    message.push_str("MIME-Version: 1.0\r\n");
    message.push_str("Content-Type: text/plain; charset=utf-8\r\n");
    message.push_str("\r\n");
    message.push_str(&email.body_text);

    message
}

fn raw_payload(email: &OutgoingEmail) -> RawPayload {
    RawPayload {
        raw: encode_text(&build_raw_message(email)),
        thread_id: email.thread_id.as_ref().map(|t| t.0.clone()),
    }
}

#[async_trait]
impl MessageBackend for GmailBackend {
    async fn fetch_message_tree(&self, message_id: &EmailId, include_body: bool) -> Result<RawMessage> {
        let mut url = self.endpoint(&["messages", message_id.0.as_str()])?;
        // Attachment parts only appear in the full format.
        url.query_pairs_mut().append_pair("format", "full");

        tracing::debug!(message_id = %message_id, include_body, "fetching message tree");
        let msg: GmailMessage = self.get(url).await?;
        Ok(msg.into())
    }

    async fn download_attachment(&self, message_id: &EmailId, attachment_id: &str) -> Result<AttachmentData> {
        let url = self.endpoint(&["messages", message_id.0.as_str(), "attachments", attachment_id])?;
        let attachment: GmailAttachment = self.get(url).await?;

        let data = attachment
            .data
            .ok_or_else(|| ProviderError::Provider("attachment response has no data".to_string()))?;
        let bytes = decode_bytes(&data)
            .map_err(|e| ProviderError::Provider(format!("attachment data: {}", e)))?;
        let size = attachment.size.unwrap_or(bytes.len() as u64);

        Ok(AttachmentData {
            data: Bytes::from(bytes),
            size,
        })
    }

    async fn list_messages(&self, query: &MessageQuery) -> Result<Vec<MessageRef>> {
        let mut url = self.endpoint(&["messages"])?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("maxResults", &query.max_results.to_string());
            if let Some(q) = &query.q {
                pairs.append_pair("q", q);
            }
        }

        let response: MessageListResponse = self.get(url).await?;
        Ok(response
            .messages
            .unwrap_or_default()
            .into_iter()
            .map(MessageRef::from)
            .collect())
    }

    async fn fetch_labels(&self) -> Result<Vec<Label>> {
        let response: LabelsListResponse = self.get(self.endpoint(&["labels"])?).await?;
        Ok(response
            .labels
            .unwrap_or_default()
            .into_iter()
            .map(Label::from)
            .collect())
    }

    async fn create_draft(&self, email: &OutgoingEmail) -> Result<DraftRef> {
        let request = DraftRequest {
            message: raw_payload(email),
        };
        let draft: GmailDraft = self.post(self.endpoint(&["drafts"])?, &request).await?;

        tracing::info!(draft_id = %draft.id, "draft created via Gmail API");
        Ok(DraftRef {
            id: DraftId::from(draft.id),
            message: draft.message.into(),
        })
    }

    async fn delete_draft(&self, draft_id: &DraftId) -> Result<()> {
        self.delete(self.endpoint(&["drafts", draft_id.0.as_str()])?).await?;
        tracing::info!(draft_id = %draft_id, "draft deleted via Gmail API");
        Ok(())
    }

    async fn send_email(&self, email: &OutgoingEmail) -> Result<MessageRef> {
        let sent: GmailMessageRef = self
            .post(self.endpoint(&["messages", "send"])?, &raw_payload(email))
            .await?;

        tracing::info!(message_id = %sent.id, "email sent via Gmail API");
        Ok(sent.into())
    }
}
