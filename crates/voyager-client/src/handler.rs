use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tokio::task::JoinSet;
use voyager_proto::InboundMessage;

/// Callback invoked with the raw decoded message and the extra value the
/// owner supplied at registration time. The callback owns all further
/// formatting and transport.
pub type Callback = Arc<dyn Fn(InboundMessage, Value) + Send + Sync>;

/// Handler key namespace: signal handlers are keyed by numeric code,
/// everything else by event name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum HandlerKey {
    Event(String),
    Signal(i64),
}

#[derive(Clone)]
pub struct Handler {
    pub callback: Callback,
    pub extra: Value,
}

/// Registry of caller-installed event handlers.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: DashMap<HandlerKey, Handler>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a handler. Re-registering the same key replaces the prior
    /// handler.
    pub fn register(&self, key: HandlerKey, callback: Callback, extra: Value) {
        tracing::info!(key = ?key, "Adding handler");
        self.handlers.insert(key, Handler { callback, extra });
    }

    /// Remove a handler; absent keys are a no-op.
    pub fn unregister(&self, key: &HandlerKey) {
        tracing::info!(key = ?key, "Removing handler");
        self.handlers.remove(key);
    }

    pub fn get(&self, key: &HandlerKey) -> Option<Handler> {
        self.handlers.get(key).map(|entry| entry.clone())
    }
}

/// Runs matched handler callbacks off the receive loop, one blocking task
/// per message. The loop reaps finished tasks opportunistically; the task
/// count itself is not bounded.
#[derive(Default)]
pub struct Dispatcher {
    tasks: JoinSet<()>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatch(&mut self, message: InboundMessage, handler: Handler) {
        let Handler { callback, extra } = handler;
        self.tasks.spawn_blocking(move || callback(message, extra));
    }

    /// Join tasks that have already finished. A panicking callback is logged
    /// here and never reaches the receive loop.
    pub fn reap(&mut self) {
        while let Some(result) = self.tasks.try_join_next() {
            if let Err(err) = result {
                if err.is_panic() {
                    tracing::error!(error = %err, "Handler callback panicked");
                }
            }
        }
    }

    /// Drain every still-running dispatch; part of the shutdown protocol.
    pub async fn join_all(&mut self) {
        while let Some(result) = self.tasks.join_next().await {
            if let Err(err) = result {
                if err.is_panic() {
                    tracing::error!(error = %err, "Handler callback panicked");
                }
            }
        }
    }

    pub fn active(&self) -> usize {
        self.tasks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;

    fn message(event: &str) -> InboundMessage {
        serde_json::from_str(&format!(r#"{{"Event":"{event}"}}"#)).unwrap()
    }

    #[test]
    fn register_replaces_on_same_key() {
        let registry = HandlerRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let first: Callback = Arc::new(|_: InboundMessage, _: Value| {});
        registry.register(HandlerKey::Event("NewJPGReady".into()), first, Value::Null);

        let counter = Arc::clone(&calls);
        let second: Callback = Arc::new(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        registry.register(HandlerKey::Event("NewJPGReady".into()), second, Value::Null);

        let handler = registry.get(&HandlerKey::Event("NewJPGReady".into())).unwrap();
        (handler.callback)(message("NewJPGReady"), Value::Null);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn signal_keys_are_a_distinct_namespace() {
        let registry = HandlerRegistry::new();
        let callback: Callback = Arc::new(|_: InboundMessage, _: Value| {});
        registry.register(HandlerKey::Signal(502), callback, Value::Null);
        assert!(registry.get(&HandlerKey::Signal(502)).is_some());
        assert!(registry.get(&HandlerKey::Event("502".into())).is_none());
        assert!(registry.get(&HandlerKey::Event("Signal".into())).is_none());
    }

    #[test]
    fn unregister_absent_is_noop() {
        let registry = HandlerRegistry::new();
        registry.unregister(&HandlerKey::Event("Nothing".into()));
        assert!(registry.get(&HandlerKey::Event("Nothing".into())).is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn dispatch_invokes_callback_with_extra() {
        let (tx, rx) = mpsc::channel();
        let callback: Callback = Arc::new(move |msg: InboundMessage, extra: Value| {
            tx.send((msg, extra)).unwrap();
        });

        let mut dispatcher = Dispatcher::new();
        dispatcher.dispatch(
            message("ShotRunning"),
            Handler {
                callback,
                extra: serde_json::json!({"channel": "tests"}),
            },
        );
        dispatcher.join_all().await;

        let (msg, extra) = rx.try_recv().unwrap();
        assert_eq!(msg.event(), Some("ShotRunning"));
        assert_eq!(extra, serde_json::json!({"channel": "tests"}));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn panicking_callback_is_contained() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.dispatch(
            message("Bad"),
            Handler {
                callback: Arc::new(|_: InboundMessage, _: Value| panic!("boom")),
                extra: Value::Null,
            },
        );
        // Must not propagate the panic.
        dispatcher.join_all().await;
        assert_eq!(dispatcher.active(), 0);
    }
}
