//! Client for the Voyager observatory-control protocol.
//!
//! One persistent TCP connection per client. A spawned receive task decodes
//! line-delimited JSON, answers protocol-mandated heartbeats, correlates the
//! single outstanding command with its reply, and fans matched events out to
//! registered handlers. Unclaimed messages, signals, and log events are
//! retained in fixed-capacity buffers.

pub mod buffer;
pub mod client;
pub mod commands;
pub mod config;
pub mod correlator;
pub mod error;
pub mod handler;

pub use client::{CommandOutput, VoyagerClient};
pub use commands::{MountAction, PointTarget};
pub use config::ClientConfig;
pub use error::ClientError;
pub use handler::Callback;
