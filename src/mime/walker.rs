//! Depth-first traversal of a message part tree.
//!
//! The walk uses an explicit work stack instead of recursion so adversarially
//! deep trees cannot exhaust the call stack. Children are pushed in reverse,
//! which keeps the visiting order identical to a recursive pre-order walk.

use crate::domain::{AttachmentEntry, MessagePart, PartId};

use super::decode::LeafBody;
use super::index::{AttachmentIndex, DuplicatePartId};
use super::selector::{self, BodyCandidate};

/// The body chosen for a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedBody {
    /// Leaf the text came from.
    pub part_id: PartId,
    /// MIME type of that leaf.
    pub mime_type: String,
    /// Decoded text.
    pub text: String,
}

/// Result of walking one tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkOutcome {
    /// Selected body, if body selection was requested and a leaf decoded.
    pub body: Option<SelectedBody>,
    /// Every attachment in the tree, in document order.
    pub attachments: AttachmentIndex,
}

/// Walks `root`, collecting attachments and (optionally) selecting a body.
///
/// Attachments are recorded and never descended into. Inline leaves compete
/// for the body only when `include_body` is set. A leaf whose payload fails
/// to decode is skipped without affecting the rest of the walk.
///
/// # Errors
///
/// Returns [`DuplicatePartId`] if two attachment nodes share a part ID.
pub fn walk(root: &MessagePart, include_body: bool) -> Result<WalkOutcome, DuplicatePartId> {
    let mut attachments = AttachmentIndex::new();
    let mut candidate: Option<BodyCandidate<'_>> = None;
    let mut stack: Vec<&MessagePart> = vec![root];

    while let Some(part) = stack.pop() {
        if let Some(entry) = attachment_entry(part) {
            attachments.put(part.part_id.clone(), entry)?;
            continue;
        }

        if part.is_inline_leaf() {
            if include_body {
                offer(&mut candidate, part);
            }
            continue;
        }

        stack.extend(part.parts.iter().rev());
    }

    let body = candidate.map(|c| SelectedBody {
        part_id: c.part_id.clone(),
        mime_type: c.mime_type.to_string(),
        text: c.text,
    });

    Ok(WalkOutcome { body, attachments })
}

/// Builds an index entry for `part` if it qualifies as an attachment.
fn attachment_entry(part: &MessagePart) -> Option<AttachmentEntry> {
    if !part.is_attachment() {
        return None;
    }
    let handle = part.attachment.as_ref()?;

    Some(AttachmentEntry {
        part_id: part.part_id.clone(),
        attachment_id: handle.id.clone(),
        filename: part.filename.clone().unwrap_or_default(),
        mime_type: part.mime_type.clone(),
        size_bytes: handle.size,
    })
}

/// Offers an inline leaf to the body selector.
///
/// Decoding happens only when the leaf could actually displace the current
/// candidate.
fn offer<'a>(candidate: &mut Option<BodyCandidate<'a>>, part: &'a MessagePart) {
    let current = candidate.as_ref().map(|c| c.mime_type);
    if current.is_some_and(selector::is_final) {
        return;
    }
    if !selector::would_replace(current, &part.mime_type) {
        return;
    }
    let Some(data) = part.inline_data.as_deref() else {
        return;
    };

    match LeafBody::decode(data) {
        LeafBody::Decoded(text) => {
            let incoming = BodyCandidate {
                part_id: &part.part_id,
                mime_type: &part.mime_type,
                text,
            };
            *candidate = Some(selector::select(candidate.take(), incoming));
        }
        LeafBody::Skipped(e) => {
            tracing::debug!(part_id = %part.part_id, error = %e, "skipping undecodable body part");
        }
    }
}
