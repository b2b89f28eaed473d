use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Inbound events that obligate an immediate `Polling` reply to keep the
/// server-side session alive.
pub const HEARTBEAT_EVENTS: [&str; 4] = [
    "WeatherAndSafetyMonitorData",
    "Version",
    "Polling",
    "ControlData",
];

/// Fixed `TimeoutConnect` hint attached to every outbound command.
pub const TIMEOUT_CONNECT_SECS: u64 = 90;

/// One decoded line of protocol JSON.
///
/// Recognized shapes carry an `Event` key, optionally a `Code` (signals) or
/// an `ActionResultInt` (command results). JSON-RPC-style replies carry no
/// `Event` at all.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InboundMessage(pub Map<String, Value>);

impl InboundMessage {
    pub fn event(&self) -> Option<&str> {
        self.0.get("Event").and_then(Value::as_str)
    }

    pub fn code(&self) -> Option<i64> {
        self.0.get("Code").and_then(Value::as_i64)
    }

    pub fn action_result_int(&self) -> Option<i64> {
        self.0.get("ActionResultInt").and_then(Value::as_i64)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }
}

impl From<Map<String, Value>> for InboundMessage {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Outbound command request.
#[derive(Clone, Debug, Serialize)]
pub struct Request {
    pub method: String,
    pub params: Map<String, Value>,
    pub id: u32,
}

impl Request {
    /// Build a command request, attaching the correlation UID and the fixed
    /// connect-timeout hint to the parameter mapping.
    pub fn command(method: impl Into<String>, mut params: Map<String, Value>, uid: &str, id: u32) -> Self {
        params.insert("UID".into(), Value::from(uid));
        params.insert("TimeoutConnect".into(), Value::from(TIMEOUT_CONNECT_SECS));
        Self {
            method: method.into(),
            params,
            id,
        }
    }
}

/// Heartbeat reply: `{"Event": "Polling"}`.
pub fn heartbeat() -> Value {
    serde_json::json!({"Event": "Polling"})
}

/// Disconnect request sent during cooperative shutdown.
pub fn disconnect(id: u32) -> Value {
    serde_json::json!({"method": "disconnect", "id": id})
}

/// Fresh correlation UID for an outbound command.
pub fn new_uid() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_request_carries_uid_and_timeout() {
        let mut params = Map::new();
        params.insert("IsOn".into(), Value::from(true));

        let req = Request::command("RemoteSetLogEvent", params, "abc-123", 3);
        assert_eq!(req.method, "RemoteSetLogEvent");
        assert_eq!(req.id, 3);
        assert_eq!(req.params.get("UID"), Some(&Value::from("abc-123")));
        assert_eq!(req.params.get("TimeoutConnect"), Some(&Value::from(90)));
        assert_eq!(req.params.get("IsOn"), Some(&Value::from(true)));
    }

    #[test]
    fn inbound_accessors() {
        let msg: InboundMessage =
            serde_json::from_str(r#"{"Event":"Signal","Code":501,"ActionResultInt":4}"#).unwrap();
        assert_eq!(msg.event(), Some("Signal"));
        assert_eq!(msg.code(), Some(501));
        assert_eq!(msg.action_result_int(), Some(4));
        assert!(msg.get("Missing").is_none());
    }

    #[test]
    fn event_absent_on_rpc_style_reply() {
        let msg: InboundMessage = serde_json::from_str(r#"{"jsonrpc":"2.0","result":0,"id":1}"#).unwrap();
        assert_eq!(msg.event(), None);
    }

    #[test]
    fn heartbeat_shape() {
        assert_eq!(heartbeat(), serde_json::json!({"Event": "Polling"}));
    }

    #[test]
    fn disconnect_shape() {
        assert_eq!(disconnect(7), serde_json::json!({"method": "disconnect", "id": 7}));
    }

    #[test]
    fn new_uids_are_unique() {
        assert_ne!(new_uid(), new_uid());
    }
}
