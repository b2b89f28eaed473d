use parking_lot::Mutex;
use tokio::sync::oneshot;
use voyager_proto::InboundMessage;

use crate::error::ClientError;

struct Pending {
    command: String,
    assembly: Vec<InboundMessage>,
    tx: oneshot::Sender<Vec<InboundMessage>>,
}

/// Tracks the single outstanding command per client and resolves it when a
/// matching reply arrives on the receive loop.
#[derive(Default)]
pub struct CommandCorrelator {
    pending: Mutex<Option<Pending>>,
}

impl CommandCorrelator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `command` outstanding. At most one command may be in flight per
    /// client; a second caller fails instead of racing the first.
    pub fn begin(&self, command: &str) -> Result<oneshot::Receiver<Vec<InboundMessage>>, ClientError> {
        let mut slot = self.pending.lock();
        if let Some(pending) = slot.as_ref() {
            return Err(ClientError::CommandInFlight(pending.command.clone()));
        }
        let (tx, rx) = oneshot::channel();
        *slot = Some(Pending {
            command: command.to_string(),
            assembly: Vec::new(),
            tx,
        });
        Ok(rx)
    }

    /// Reply event name implied by a command name: a leading `Remote`, then
    /// a leading `Get`, are stripped (`RemoteGetCCDTemperature` becomes
    /// `CCDTemperature`).
    fn expected_reply(command: &str) -> &str {
        let stripped = command.strip_prefix("Remote").unwrap_or(command);
        stripped.strip_prefix("Get").unwrap_or(stripped)
    }

    /// Offer a routed message to the outstanding command. Returns true when
    /// the message was consumed and the command resolved; false when it
    /// should fall through to the generic message buffer. With no command
    /// outstanding this never consumes.
    pub fn offer(&self, event: &str, message: &InboundMessage) -> bool {
        let mut slot = self.pending.lock();
        let matched = slot
            .as_ref()
            .is_some_and(|p| event == "RemoteActionResult" || event == Self::expected_reply(&p.command));
        if !matched {
            return false;
        }
        if let Some(mut pending) = slot.take() {
            pending.assembly.push(message.clone());
            let Pending { command, assembly, tx } = pending;
            tracing::debug!(command = %command, "Command resolved");
            if tx.send(assembly).is_err() {
                tracing::warn!(command = %command, "Command resolved after its caller gave up");
            }
        }
        true
    }

    /// Drop the outstanding command, waking its caller with a closed
    /// channel. Used when the request never made it onto the wire and when
    /// the connection is lost.
    pub fn abort(&self) {
        self.pending.lock().take();
    }

    pub fn outstanding(&self) -> Option<String> {
        self.pending.lock().as_ref().map(|p| p.command.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(event: &str) -> InboundMessage {
        serde_json::from_str(&format!(r#"{{"Event":"{event}"}}"#)).unwrap()
    }

    #[test]
    fn expected_reply_strips_remote_then_get() {
        assert_eq!(CommandCorrelator::expected_reply("RemoteGetCCDTemperature"), "CCDTemperature");
        assert_eq!(CommandCorrelator::expected_reply("RemoteSetupConnect"), "SetupConnect");
        assert_eq!(CommandCorrelator::expected_reply("GetArrayElementData"), "ArrayElementData");
        assert_eq!(CommandCorrelator::expected_reply("Polling"), "Polling");
    }

    #[test]
    fn second_begin_is_rejected() {
        let correlator = CommandCorrelator::new();
        let _rx = correlator.begin("RemoteGetCCDTemperature").unwrap();
        let err = correlator.begin("RemoteSetupConnect").unwrap_err();
        assert!(matches!(err, ClientError::CommandInFlight(name) if name == "RemoteGetCCDTemperature"));
    }

    #[tokio::test]
    async fn matching_reply_resolves() {
        let correlator = CommandCorrelator::new();
        let rx = correlator.begin("RemoteGetCCDTemperature").unwrap();

        assert!(correlator.offer("CCDTemperature", &message("CCDTemperature")));
        assert!(correlator.outstanding().is_none());

        let assembly = rx.await.unwrap();
        assert_eq!(assembly.len(), 1);
        assert_eq!(assembly[0].event(), Some("CCDTemperature"));
    }

    #[tokio::test]
    async fn remote_action_result_resolves_any_command() {
        let correlator = CommandCorrelator::new();
        let rx = correlator.begin("RemoteSetProfile").unwrap();

        assert!(correlator.offer("RemoteActionResult", &message("RemoteActionResult")));
        let assembly = rx.await.unwrap();
        assert_eq!(assembly[0].event(), Some("RemoteActionResult"));
    }

    #[test]
    fn unrelated_event_is_not_consumed() {
        let correlator = CommandCorrelator::new();
        let _rx = correlator.begin("RemoteGetCCDTemperature").unwrap();

        assert!(!correlator.offer("ShotRunning", &message("ShotRunning")));
        assert_eq!(correlator.outstanding().as_deref(), Some("RemoteGetCCDTemperature"));
    }

    #[test]
    fn nothing_outstanding_never_consumes() {
        let correlator = CommandCorrelator::new();
        assert!(!correlator.offer("RemoteActionResult", &message("RemoteActionResult")));
        assert!(!correlator.offer("CCDTemperature", &message("CCDTemperature")));
    }

    #[tokio::test]
    async fn abort_wakes_the_caller_with_closed_channel() {
        let correlator = CommandCorrelator::new();
        let rx = correlator.begin("RemoteSetupConnect").unwrap();
        correlator.abort();
        assert!(rx.await.is_err());
        assert!(correlator.outstanding().is_none());
    }
}
