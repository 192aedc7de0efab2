//! Revalidation of attachment references.
//!
//! Attachment handles rotate between fetches, so a part ID is the only
//! reference a caller can hold on to. Resolving always re-fetches the tree
//! and reads the handle from that fresh fetch; nothing is cached.

use crate::domain::{AttachmentEntry, EmailId, PartId};
use crate::providers::email::{MessageBackend, ProviderError};

use super::index::DuplicatePartId;
use super::walker;

/// Errors raised while resolving an attachment reference.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// The part ID does not name an attachment in the current message.
    #[error("attachment part {part_id:?} not found in message {message_id}; valid part ids: {valid_part_ids:?}")]
    NotFound {
        /// Message that was searched.
        message_id: EmailId,
        /// Part ID the caller asked for.
        part_id: PartId,
        /// Part IDs that do resolve, for the caller to retry with.
        valid_part_ids: Vec<PartId>,
    },

    /// The backend returned an attachment node without a usable handle.
    #[error("attachment part {part_id:?} in message {message_id} has no download handle")]
    InvalidState {
        /// Message that was searched.
        message_id: EmailId,
        /// Offending part.
        part_id: PartId,
    },

    /// The backend sent a malformed tree.
    #[error("malformed message tree: {0}")]
    Tree(#[from] DuplicatePartId),

    /// The fetch itself failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Resolves `part_id` to an attachment entry carrying a current handle.
///
/// # Errors
///
/// - [`ResolveError::NotFound`] if no attachment has that part ID now.
/// - [`ResolveError::InvalidState`] if the entry's handle is empty.
/// - [`ResolveError::Provider`] if the fetch fails; no retry is attempted.
pub async fn resolve<B>(
    backend: &B,
    message_id: &EmailId,
    part_id: &PartId,
) -> Result<AttachmentEntry, ResolveError>
where
    B: MessageBackend + ?Sized,
{
    let raw = backend.fetch_message_tree(message_id, false).await?;
    let outcome = walker::walk(&raw.payload, false)?;

    let Some(entry) = outcome.attachments.get(part_id) else {
        return Err(ResolveError::NotFound {
            message_id: message_id.clone(),
            part_id: part_id.clone(),
            valid_part_ids: outcome.attachments.keys().cloned().collect(),
        });
    };

    if entry.handle().is_empty() {
        return Err(ResolveError::InvalidState {
            message_id: message_id.clone(),
            part_id: part_id.clone(),
        });
    }

    tracing::debug!(
        message_id = %message_id,
        part_id = %part_id,
        "resolved attachment handle"
    );
    Ok(entry.clone())
}
