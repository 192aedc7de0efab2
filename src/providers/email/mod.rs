//! Message backend implementations.
//!
//! This module contains the [`MessageBackend`] trait and its Gmail REST
//! implementation:
//!
//! - [`GmailBackend`] - Gmail API v1 with a caller-supplied OAuth access token
//!
//! # Architecture
//!
//! The backend abstraction keeps all network I/O behind one seam. The
//! resolver and services never see HTTP; they receive [`RawMessage`] trees
//! and attachment bytes, which keeps them testable with in-memory stores.
//!
//! # Example
//!
//! ```ignore
//! use mailtree::providers::email::{GmailBackend, MessageBackend};
//! use mailtree::domain::EmailId;
//!
//! async fn subject(backend: &dyn MessageBackend, id: &EmailId) -> Option<String> {
//!     let raw = backend.fetch_message_tree(id, false).await.ok()?;
//!     raw.payload.header("Subject").map(str::to_owned)
//! }
//! ```
//!
//! [`RawMessage`]: crate::domain::RawMessage

mod gmail;
mod traits;

pub use gmail::GmailBackend;
pub use traits::{
    AttachmentData, DraftRef, MessageBackend, MessageQuery, MessageRef, OutgoingEmail,
    ProviderError, Result,
};
