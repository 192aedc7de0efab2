//! Label domain types.

use serde::{Deserialize, Serialize};

use super::LabelId;

/// A mailbox label as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    /// Provider label ID (`INBOX`, `Label_42`, ...).
    pub id: LabelId,
    /// Display name of the label.
    pub name: String,
    /// Whether this is a system label (INBOX, SENT, etc.).
    pub is_system: bool,
}
