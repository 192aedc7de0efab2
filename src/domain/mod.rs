//! Domain layer types for mailtree.
//!
//! This module contains the core domain types used throughout the crate:
//! identifiers, the raw message part tree, and the resolved views derived
//! from it.

mod email;
mod label;
mod message;
mod types;

pub use email::{AttachmentEntry, ResolvedMessage};
pub use label::Label;
pub use message::{AttachmentHandle, Header, MessagePart, RawMessage};
pub use types::{DraftId, EmailId, LabelId, PartId, ThreadId};
