//! Configuration and settings management.
//!
//! Settings are stored in the user's config directory as JSON.

mod settings;

pub use settings::{
    AttachmentSettings, BodySettings, GmailSettings, LoggingSettings, Settings, SettingsError,
};
