//! mailtree - Gmail message structure resolution
//!
//! This crate resolves Gmail message part trees into a selected body, an
//! attachment index keyed by stable part IDs, and bounded body windows. It
//! also revalidates attachment references against fresh fetches before
//! download.

pub mod config;
pub mod domain;
pub mod mime;
pub mod providers;
pub mod services;

pub use services::MessageService;
