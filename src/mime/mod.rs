//! Message structure resolution.
//!
//! Turns a fetched [`RawMessage`] part tree into something a caller can use:
//!
//! - [`walker`] - traversal that collects attachments and picks a body
//! - [`selector`] - precedence rules between competing body leaves
//! - [`index`] - insertion-ordered `partId → attachment` mapping
//! - [`paginate`](mod@paginate) - bounded windows over a resolved body
//! - [`resolver`] - revalidates a part ID against a fresh fetch
//!
//! Everything except the resolver is synchronous and pure; the resolver only
//! adds a single backend fetch in front of a walk.

pub mod decode;
pub mod index;
pub mod paginate;
pub mod resolver;
pub mod selector;
pub mod walker;

pub use decode::{DecodeError, LeafBody};
pub use index::{AttachmentIndex, DuplicatePartId};
pub use paginate::{paginate, BodyWindow};
pub use resolver::{resolve, ResolveError};
pub use walker::{walk, SelectedBody, WalkOutcome};

use crate::domain::{RawMessage, ResolvedMessage};

/// Resolves a fetched message into its caller-facing view and attachments.
///
/// # Errors
///
/// Returns [`DuplicatePartId`] if the tree repeats an attachment part ID.
pub fn resolve_message(
    raw: &RawMessage,
    include_body: bool,
) -> Result<(ResolvedMessage, AttachmentIndex), DuplicatePartId> {
    let outcome = walk(&raw.payload, include_body)?;
    let mut message = ResolvedMessage::from_headers(raw);
    if let Some(body) = outcome.body {
        message.body = Some(body.text);
        message.mime_type = Some(body.mime_type);
    }
    Ok((message, outcome.attachments))
}
