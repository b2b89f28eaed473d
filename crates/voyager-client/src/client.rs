use std::sync::Arc;

use parking_lot::Mutex;
use rand::Rng;
use serde_json::{Map, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use voyager_proto::{catalog, codec, message, InboundMessage, Request, HEARTBEAT_EVENTS};

use crate::buffer::BoundedBuffer;
use crate::config::ClientConfig;
use crate::correlator::CommandCorrelator;
use crate::error::ClientError;
use crate::handler::{Callback, Dispatcher, HandlerKey, HandlerRegistry};

const RECV_CHUNK: usize = 2048;

/// Output of a resolved command: the accumulated reply message(s) plus the
/// correlation UID the request carried.
#[derive(Clone, Debug)]
pub struct CommandOutput {
    pub output: Vec<InboundMessage>,
    pub uid: String,
}

struct Shared {
    config: ClientConfig,
    client_id: u32,
    connected: watch::Sender<bool>,
    closed: watch::Sender<bool>,
    shutdown: CancellationToken,
    writer: tokio::sync::Mutex<Option<OwnedWriteHalf>>,
    logs: Mutex<BoundedBuffer<InboundMessage>>,
    signals: Mutex<BoundedBuffer<InboundMessage>>,
    messages: Mutex<BoundedBuffer<InboundMessage>>,
    handlers: HandlerRegistry,
    correlator: CommandCorrelator,
}

/// Client for one persistent control connection to the Voyager host.
///
/// `connect` opens the socket and spawns the receive task; the task performs
/// the handshake, answers heartbeats, classifies every decoded line, and
/// executes the cooperative shutdown protocol when [`VoyagerClient::close`]
/// is called.
pub struct VoyagerClient {
    shared: Arc<Shared>,
}

impl VoyagerClient {
    /// Open the control connection and start the receive loop. The protocol
    /// handshake completes on the spawned task; `send_command` waits for it.
    pub async fn connect(config: ClientConfig) -> Result<Self, ClientError> {
        tracing::info!(host = %config.host, port = config.port, "Connecting");
        let stream = TcpStream::connect((config.host.as_str(), config.port)).await?;
        let (read_half, write_half) = stream.into_split();

        let client_id = config
            .client_id
            .unwrap_or_else(|| rand::thread_rng().gen_range(1..10));
        let (connected, _) = watch::channel(false);
        let (closed, _) = watch::channel(false);

        let shared = Arc::new(Shared {
            logs: Mutex::new(BoundedBuffer::new(config.log_capacity)),
            signals: Mutex::new(BoundedBuffer::new(config.signal_capacity)),
            messages: Mutex::new(BoundedBuffer::new(config.message_capacity)),
            config,
            client_id,
            connected,
            closed,
            shutdown: CancellationToken::new(),
            writer: tokio::sync::Mutex::new(Some(write_half)),
            handlers: HandlerRegistry::new(),
            correlator: CommandCorrelator::new(),
        });

        let loop_shared = Arc::clone(&shared);
        tokio::spawn(async move {
            run_loop(loop_shared, read_half).await;
        });

        Ok(Self { shared })
    }

    /// Send a fire-and-forget command and wait for the message(s) that
    /// constitute its reply. At most one command may be outstanding; a
    /// second caller gets `CommandInFlight`. With no configured command
    /// timeout, a reply that never comes blocks forever, matching the host
    /// client this reproduces.
    pub async fn send_command(
        &self,
        command: &str,
        params: Option<Map<String, Value>>,
        uid: Option<String>,
    ) -> Result<CommandOutput, ClientError> {
        tracing::debug!(command = %command, "send_command");

        let mut connected = self.shared.connected.subscribe();
        let mut closed = self.shared.closed.subscribe();
        tokio::select! {
            result = connected.wait_for(|ready| *ready) => {
                result.map_err(|_| ClientError::NotConnected)?;
            }
            _ = closed.wait_for(|done| *done) => return Err(ClientError::NotConnected),
        }

        let uid = uid.unwrap_or_else(message::new_uid);
        let request = Request::command(command, params.unwrap_or_default(), &uid, self.shared.client_id);

        let rx = self.shared.correlator.begin(command)?;
        let bytes = match codec::encode(&request) {
            Ok(bytes) => bytes,
            Err(err) => {
                // Nothing reached the socket, so the command is no longer
                // outstanding.
                self.shared.correlator.abort();
                return Err(err.into());
            }
        };
        if let Err(err) = send_bytes(&self.shared, &bytes).await {
            self.shared.correlator.abort();
            return Err(err);
        }

        let assembly = match self.shared.config.command_timeout {
            Some(limit) => match timeout(limit, rx).await {
                Ok(result) => result.map_err(|_| ClientError::ConnectionClosed)?,
                Err(_) => {
                    self.shared.correlator.abort();
                    return Err(ClientError::CommandTimeout {
                        command: command.to_string(),
                        timeout: limit,
                    });
                }
            },
            None => rx.await.map_err(|_| ClientError::ConnectionClosed)?,
        };

        let mut output = assembly;
        if let Some(last) = output.last_mut() {
            if let Some(desc) = last.action_result_int().and_then(catalog::action_result_description) {
                last.insert("ActionResult", Value::from(desc));
            }
        }
        Ok(CommandOutput { output, uid })
    }

    /// Remove and return the newest unclaimed generic message.
    pub fn get_message(&self) -> Option<InboundMessage> {
        self.shared.messages.lock().pop()
    }

    /// Remove and return the newest retained signal.
    pub fn get_signal(&self) -> Option<InboundMessage> {
        self.shared.signals.lock().pop()
    }

    /// Remove and return the newest retained log event.
    pub fn get_log(&self) -> Option<InboundMessage> {
        self.shared.logs.lock().pop()
    }

    /// Install a handler for an event name. Matching messages are dispatched
    /// to the callback instead of being buffered or correlated.
    pub fn add_handler(&self, event: &str, callback: Callback, extra: Value) {
        self.shared
            .handlers
            .register(HandlerKey::Event(event.to_string()), callback, extra);
    }

    /// Install a handler for a numeric signal code.
    pub fn add_signal_handler(&self, code: i64, callback: Callback, extra: Value) {
        self.shared
            .handlers
            .register(HandlerKey::Signal(code), callback, extra);
    }

    pub fn remove_handler(&self, event: &str) {
        self.shared
            .handlers
            .unregister(&HandlerKey::Event(event.to_string()));
    }

    pub fn remove_signal_handler(&self, code: i64) {
        self.shared.handlers.unregister(&HandlerKey::Signal(code));
    }

    pub fn is_connected(&self) -> bool {
        *self.shared.connected.borrow()
    }

    /// Request the cooperative shutdown protocol and wait until the receive
    /// task has joined every dispatch, sent the disconnect request, and
    /// closed the socket. Returns immediately if the loop already ended.
    pub async fn close(&self) {
        self.shared.shutdown.cancel();
        tracing::info!("Waiting for the receive loop to shut down");
        let mut closed = self.shared.closed.subscribe();
        let _ = closed.wait_for(|done| *done).await;
    }
}

enum Handshake {
    Banner(String),
    Cancelled,
    Lost,
}

enum ReadUnit {
    Data(Vec<u8>),
    Idle,
    PeerClosed,
}

#[derive(PartialEq)]
enum Routing {
    Continue,
    HardStop,
}

async fn run_loop(shared: Arc<Shared>, mut reader: OwnedReadHalf) {
    let mut dispatcher = Dispatcher::new();

    match await_handshake(&shared, &mut reader).await {
        Handshake::Banner(banner) => tracing::info!(banner = %banner, "Version message"),
        Handshake::Cancelled => {
            shutdown(&shared, &mut dispatcher).await;
            finish(&shared);
            return;
        }
        Handshake::Lost => {
            finish(&shared);
            return;
        }
    }

    shared.connected.send_replace(true);

    loop {
        if shared.shutdown.is_cancelled() {
            shutdown(&shared, &mut dispatcher).await;
            break;
        }
        match read_unit(&shared, &mut reader).await {
            ReadUnit::Data(data) => {
                if route_unit(&shared, &mut dispatcher, &data).await == Routing::HardStop {
                    close_socket(&shared).await;
                    break;
                }
            }
            ReadUnit::Idle => {}
            ReadUnit::PeerClosed => {
                tracing::info!("Disconnect");
                break;
            }
        }
        dispatcher.reap();
    }

    finish(&shared);
}

/// Block until the initial handshake line arrives, retrying the read on
/// every timeout; there is no handshake deadline. Cancellation is observed
/// between attempts so `close()` still runs the full shutdown protocol.
async fn await_handshake(shared: &Shared, reader: &mut OwnedReadHalf) -> Handshake {
    let mut chunk = [0u8; RECV_CHUNK];
    loop {
        if shared.shutdown.is_cancelled() {
            return Handshake::Cancelled;
        }
        match timeout(shared.config.read_timeout, reader.read(&mut chunk)).await {
            Ok(Ok(0)) => {
                tracing::info!("Peer closed during handshake");
                return Handshake::Lost;
            }
            Ok(Ok(n)) => {
                return Handshake::Banner(String::from_utf8_lossy(&chunk[..n]).trim().to_string());
            }
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "Handshake read failed");
                return Handshake::Lost;
            }
            Err(_) => {}
        }
    }
}

/// Accumulate one read unit. The short read timeout is the frame boundary:
/// a timeout with nothing accumulated yields `Idle` so the caller can
/// re-check shutdown, a timeout with bytes completes the unit, and a
/// zero-length read means the peer closed.
async fn read_unit(shared: &Shared, reader: &mut OwnedReadHalf) -> ReadUnit {
    let mut data = Vec::new();
    let mut chunk = [0u8; RECV_CHUNK];
    loop {
        match timeout(shared.config.read_timeout, reader.read(&mut chunk)).await {
            // A zero-length read closes the unit too: bytes already
            // accumulated are routed before the next iteration observes the
            // close.
            Ok(Ok(0)) => {
                if data.is_empty() {
                    return ReadUnit::PeerClosed;
                }
                return ReadUnit::Data(data);
            }
            Ok(Ok(n)) => data.extend_from_slice(&chunk[..n]),
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "Socket read failed");
                return ReadUnit::PeerClosed;
            }
            Err(_) => {
                if data.is_empty() {
                    return ReadUnit::Idle;
                }
                return ReadUnit::Data(data);
            }
        }
    }
}

async fn route_unit(shared: &Shared, dispatcher: &mut Dispatcher, data: &[u8]) -> Routing {
    let text = String::from_utf8_lossy(data);
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let msg = match codec::decode(line) {
            Ok(msg) => msg,
            Err(err) => {
                tracing::warn!(error = %err, line = %line, "Dropping undecodable line");
                continue;
            }
        };
        if route(shared, dispatcher, msg).await == Routing::HardStop {
            return Routing::HardStop;
        }
    }
    Routing::Continue
}

async fn route(shared: &Shared, dispatcher: &mut Dispatcher, msg: InboundMessage) -> Routing {
    let Some(event) = msg.event().map(str::to_string) else {
        // JSON-RPC-style acknowledgements carry no Event key.
        tracing::debug!(msg = ?msg, "Ignoring reply without an Event field");
        return Routing::Continue;
    };
    tracing::debug!(event = %event, "Got message");

    if HEARTBEAT_EVENTS.contains(&event.as_str()) {
        send_heartbeat(shared).await;
        if event != "Version" && event != "Polling" {
            route_command(shared, dispatcher, &event, msg);
        }
    } else if event == "Signal" {
        handle_signal(shared, dispatcher, msg);
    } else if event == "LogEvent" {
        shared.logs.lock().push(msg);
        send_heartbeat(shared).await;
    } else if event == "ShutDown" {
        tracing::warn!("Received shutdown from host, closing connection");
        return Routing::HardStop;
    } else {
        route_command(shared, dispatcher, &event, msg);
    }
    Routing::Continue
}

/// Generic command routing: a registered handler takes priority over
/// correlation; anything unclaimed lands in the message buffer.
fn route_command(shared: &Shared, dispatcher: &mut Dispatcher, event: &str, msg: InboundMessage) {
    if let Some(handler) = shared.handlers.get(&HandlerKey::Event(event.to_string())) {
        dispatcher.dispatch(msg, handler);
        return;
    }
    if shared.correlator.offer(event, &msg) {
        return;
    }
    tracing::debug!(event = %event, "Buffering message");
    shared.messages.lock().push(msg);
}

/// Signals are annotated with their catalog description and always retained,
/// then dispatched if a handler is registered for the code.
fn handle_signal(shared: &Shared, dispatcher: &mut Dispatcher, mut msg: InboundMessage) {
    let code = msg.code();
    if let Some(desc) = code.and_then(catalog::signal_description) {
        msg.insert("CodeMsg", Value::from(desc));
    }
    shared.signals.lock().push(msg.clone());

    if let Some(code) = code {
        if let Some(handler) = shared.handlers.get(&HandlerKey::Signal(code)) {
            dispatcher.dispatch(msg, handler);
        }
    }
}

/// Heartbeat replies must go out before the triggering event is routed any
/// further; failures are logged and the loop carries on.
async fn send_heartbeat(shared: &Shared) {
    tracing::trace!("Sending heartbeat");
    match codec::encode(&message::heartbeat()) {
        Ok(bytes) => {
            if let Err(err) = send_bytes(shared, &bytes).await {
                tracing::warn!(error = %err, "Heartbeat send failed");
            }
        }
        Err(err) => tracing::warn!(error = %err, "Heartbeat encode failed"),
    }
}

async fn send_bytes(shared: &Shared, bytes: &[u8]) -> Result<(), ClientError> {
    let mut writer = shared.writer.lock().await;
    let Some(writer) = writer.as_mut() else {
        return Err(ClientError::NotConnected);
    };
    writer.write_all(bytes).await?;
    Ok(())
}

/// Cooperative shutdown: join all still-running dispatches, send the
/// disconnect request, close the socket.
async fn shutdown(shared: &Shared, dispatcher: &mut Dispatcher) {
    tracing::info!("Closing out");
    dispatcher.join_all().await;
    match codec::encode(&message::disconnect(shared.client_id)) {
        Ok(bytes) => {
            if let Err(err) = send_bytes(shared, &bytes).await {
                tracing::warn!(error = %err, "Disconnect send failed");
            }
        }
        Err(err) => tracing::warn!(error = %err, "Disconnect encode failed"),
    }
    close_socket(shared).await;
}

async fn close_socket(shared: &Shared) {
    let mut writer = shared.writer.lock().await;
    if let Some(mut write_half) = writer.take() {
        let _ = write_half.shutdown().await;
    }
}

/// Runs on every receive-task exit path: clears the connected flag, wakes
/// any command caller still waiting, and releases `close()`.
fn finish(shared: &Shared) {
    shared.connected.send_replace(false);
    shared.correlator.abort();
    shared.closed.send_replace(true);
}
