//! Insertion-ordered attachment index keyed by part ID.

use std::collections::HashMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::domain::{AttachmentEntry, PartId};

/// Raised when a traversal yields the same part ID twice.
///
/// Part IDs are tree positions, so this only happens when the backend sends
/// a malformed tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("part {0:?} appears more than once in the message tree")]
pub struct DuplicatePartId(pub PartId);

/// Attachments of one message in traversal order.
///
/// The index lives for a single fetch. Entries carry the handle seen during
/// that fetch, which may already be stale by the time it is used.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachmentIndex {
    entries: Vec<AttachmentEntry>,
    positions: HashMap<PartId, usize>,
}

impl AttachmentIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `entry` under `part_id`.
    pub fn put(&mut self, part_id: PartId, entry: AttachmentEntry) -> Result<(), DuplicatePartId> {
        if self.positions.contains_key(&part_id) {
            return Err(DuplicatePartId(part_id));
        }
        self.positions.insert(part_id, self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    /// Looks up the entry recorded for `part_id`.
    pub fn get(&self, part_id: &PartId) -> Option<&AttachmentEntry> {
        self.positions.get(part_id).map(|&i| &self.entries[i])
    }

    /// Part IDs in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &PartId> + '_ {
        self.entries.iter().map(|e| &e.part_id)
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[AttachmentEntry] {
        &self.entries
    }

    /// Number of attachments.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the message has no attachments.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for AttachmentIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.part_id, entry)?;
        }
        map.end()
    }
}

impl IntoIterator for AttachmentIndex {
    type Item = AttachmentEntry;
    type IntoIter = std::vec::IntoIter<AttachmentEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
