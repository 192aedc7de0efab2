//! Provider implementations.
//!
//! - [`email`] - Message store backends (Gmail API)

pub mod email;
