//! Transfer decoding for inline part payloads.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;

/// URL-safe base64 that accepts payloads with or without `=` padding.
///
/// Gmail omits padding on part bodies, while other producers (and most
/// test fixtures) include it.
pub(crate) const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Errors raised while decoding a single leaf payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Payload is not valid URL-safe base64.
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Decoded bytes are not UTF-8 text.
    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Outcome of decoding one leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeafBody {
    /// Payload decoded to text.
    Decoded(String),
    /// Payload could not be decoded; the leaf is treated as having no body.
    Skipped(DecodeError),
}

impl LeafBody {
    /// Decodes a URL-safe base64 payload into UTF-8 text.
    pub fn decode(data: &str) -> Self {
        match decode_text(data) {
            Ok(text) => Self::Decoded(text),
            Err(e) => Self::Skipped(e),
        }
    }
}

/// Decodes URL-safe base64 into raw bytes.
pub fn decode_bytes(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    // Some producers wrap or pad long payloads; whitespace is not part of the alphabet.
    if data.contains(|c: char| c.is_ascii_whitespace()) {
        let joined: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        return URL_SAFE_LENIENT.decode(joined);
    }
    URL_SAFE_LENIENT.decode(data)
}

/// Decodes URL-safe base64 into UTF-8 text.
pub fn decode_text(data: &str) -> Result<String, DecodeError> {
    let bytes = decode_bytes(data)?;
    Ok(String::from_utf8(bytes)?)
}

/// Encodes text as unpadded URL-safe base64, the form Gmail expects for
/// raw outgoing messages.
pub fn encode_text(text: &str) -> String {
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(text.as_bytes())
}
