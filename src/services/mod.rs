//! Services layer.
//!
//! Services orchestrate the pure message resolution in [`crate::mime`] with
//! backend I/O:
//!
//! ```text
//! Caller (binary, tool layer)
//!          |
//!          v
//!    Services Layer  <-- You are here
//!          |
//!          v
//!   MessageBackend (Gmail REST)
//! ```
//!
//! - [`MessageService`]: message, body window, attachment and draft operations
//! - [`Batch`]: per-item outcomes for bulk operations

mod batch;
mod message_service;

pub use batch::{Batch, BatchItem, BatchOutcome};
pub use message_service::{
    DownloadedAttachment, MessageDetails, MessageService, ReplyOutcome, SaveRequest,
    SavedAttachment, ServiceError,
};
