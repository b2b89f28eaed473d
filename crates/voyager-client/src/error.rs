use std::time::Duration;

use voyager_proto::CodecError;

/// Errors surfaced by the Voyager client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("not connected")]
    NotConnected,
    #[error("command already outstanding: {0}")]
    CommandInFlight(String),
    #[error("command {command} timed out after {timeout:?}")]
    CommandTimeout { command: String, timeout: Duration },
    #[error("connection closed before the command resolved")]
    ConnectionClosed,
}
