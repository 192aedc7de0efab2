//! Body precedence between competing text leaves.
//!
//! `text/plain` outranks `text/html`, which outranks any other inline type.
//! A leaf only displaces the current candidate when it ranks strictly
//! higher, so among equal types the first one in document order wins.

use crate::domain::PartId;

/// A decoded leaf competing to become the message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyCandidate<'a> {
    /// Position of the leaf.
    pub part_id: &'a PartId,
    /// MIME type of the leaf as sent.
    pub mime_type: &'a str,
    /// Decoded text.
    pub text: String,
}

/// Precedence of a MIME type for body selection. Higher wins.
pub fn rank(mime_type: &str) -> u8 {
    let essence = mime_type.split(';').next().unwrap_or("").trim();
    if essence.eq_ignore_ascii_case("text/plain") {
        2
    } else if essence.eq_ignore_ascii_case("text/html") {
        1
    } else {
        0
    }
}

/// Returns true if a leaf of `incoming` type would replace `current`.
///
/// Lets the walker skip decoding leaves that cannot win.
pub fn would_replace(current: Option<&str>, incoming: &str) -> bool {
    match current {
        None => true,
        Some(current) => rank(incoming) > rank(current),
    }
}

/// Returns true once no later leaf can displace a candidate of this type.
pub fn is_final(mime_type: &str) -> bool {
    rank(mime_type) == rank("text/plain")
}

/// Picks the winner between the current candidate and an incoming leaf.
pub fn select<'a>(
    candidate: Option<BodyCandidate<'a>>,
    incoming: BodyCandidate<'a>,
) -> BodyCandidate<'a> {
    match candidate {
        Some(current) if !would_replace(Some(current.mime_type), incoming.mime_type) => current,
        _ => incoming,
    }
}
