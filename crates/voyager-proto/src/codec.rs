use serde::Serialize;

use crate::message::InboundMessage;

/// Errors from the line codec.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Serialize a value to protocol text, CRLF-terminated.
///
/// On failure nothing is produced; the caller must treat the error as
/// "not sent."
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    let mut text = serde_json::to_string(value).map_err(CodecError::Encode)?;
    text.push_str("\r\n");
    Ok(text.into_bytes())
}

/// Parse one line of protocol text as a JSON object.
///
/// Anything that is not a complete object (including valid non-object JSON)
/// is a decode failure; the caller drops the line, it is never buffered for
/// retry.
pub fn decode(line: &str) -> Result<InboundMessage, CodecError> {
    serde_json::from_str(line.trim()).map_err(CodecError::Decode)
}
