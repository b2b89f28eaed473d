//! Wire types, line codec, and description catalog for the Voyager
//! observatory-control protocol.
//!
//! The protocol is line-oriented JSON over TCP: one complete object per
//! line, CRLF-terminated, no length prefixing.

pub mod catalog;
pub mod codec;
pub mod message;

pub use codec::{decode, encode, CodecError};
pub use message::{InboundMessage, Request, HEARTBEAT_EVENTS};
