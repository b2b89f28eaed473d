use std::time::Duration;

/// Connection and retention settings for a [`crate::VoyagerClient`].
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    /// Numeric client id sent with every request. A random id in 1..10 is
    /// assigned when absent.
    pub client_id: Option<u32>,
    /// Per-attempt socket read timeout. Doubles as the frame boundary for
    /// the receive loop: a timeout with bytes already accumulated completes
    /// the read unit.
    pub read_timeout: Duration,
    /// When set, `send_command` fails with `CommandTimeout` instead of
    /// waiting indefinitely for a reply that never comes.
    pub command_timeout: Option<Duration>,
    pub log_capacity: usize,
    pub signal_capacity: usize,
    pub message_capacity: usize,
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            client_id: None,
            read_timeout: Duration::from_millis(150),
            command_timeout: None,
            log_capacity: 1000,
            signal_capacity: 20,
            message_capacity: 30,
        }
    }

    pub fn with_client_id(mut self, id: u32) -> Self {
        self.client_id = Some(id);
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }
}
