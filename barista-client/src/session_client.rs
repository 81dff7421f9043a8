/*
 * Copyright 2025 Barista Chat Contributors
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 *
 * Unless you explicitly state otherwise, any contribution intentionally
 * submitted for inclusion in the work by you, as defined in the Apache-2.0
 * license, shall be dual licensed as above, without any additional terms or
 * conditions.
 */

//! The reconnecting realtime session client.
//!
//! A [`SessionClient`] owns at most one channel to the chat endpoint of its
//! session. Every channel gets a generation number and a driver task that
//! consumes the channel's [`TransportEvent`]s; events of a channel that has
//! been replaced, timed out or disconnected are ignored.
//!
//! Handlers are always invoked with the state lock released, so they may call
//! back into the client (send a reply, disconnect, register more handlers).
//!
//! # Example
//!
//! ```no_run
//! use barista_client::{ClientOptions, SessionClient};
//! use barista_types::SessionId;
//!
//! # async fn example() -> Result<(), barista_client::ClientError> {
//! let client = SessionClient::native(ClientOptions::default(), SessionId::generate());
//! let _messages = client.on_message(|entry: barista_types::ChatEntry| {
//!     println!("{:?}: {}", entry.role, entry.content);
//! });
//! let _errors = client.on_error(|err: barista_client::ClientError| eprintln!("{err}"));
//!
//! client.connect().await?;
//! client.send_message("One oat flat white, please");
//! // ...
//! client.disconnect();
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::{Arc, Mutex};

use barista_transport::{Channel, Dialed, Transport, TransportEvent, ABNORMAL_CLOSURE};
use barista_types::{
    Callback, ChatEntry, Envelope, EnvelopeError, EnvelopeKind, SessionId, StatusKind,
    StatusUpdate, CLIENT_DISCONNECT_REASON, NORMAL_CLOSURE,
};
use log::{debug, error, info, warn};
use serde_json::{json, Value};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::ClientError;
use crate::event_bus::EventBus;
use crate::events::{ClientEvent, ConnectionState};
use crate::handlers::{lock, HandlerList, Subscription};
use crate::options::ClientOptions;
use crate::reconnect::ReconnectState;

type HandshakeResult = Result<(), ClientError>;

/// Cheap to clone; all clones drive the same connection.
#[derive(Clone)]
pub struct SessionClient {
    shared: Arc<Shared>,
}

struct Shared {
    options: ClientOptions,
    session_id: SessionId,
    transport: Arc<dyn Transport>,
    inner: Mutex<Inner>,
    message_handlers: Arc<HandlerList<ChatEntry>>,
    status_handlers: Arc<HandlerList<StatusUpdate>>,
    error_handlers: Arc<HandlerList<ClientError>>,
    events: EventBus,
}

#[derive(Default)]
struct Inner {
    state: ConnectionState,
    generation: u64,
    channel: Option<Box<dyn Channel>>,
    /// The current channel completed its handshake.
    established: bool,
    handshake: Option<oneshot::Sender<HandshakeResult>>,
    intentional_close: bool,
    reconnect: ReconnectState,
    reconnect_task: Option<JoinHandle<()>>,
}

impl SessionClient {
    pub fn new(options: ClientOptions, session_id: SessionId, transport: Arc<dyn Transport>) -> Self {
        Self {
            shared: Arc::new(Shared {
                options,
                session_id,
                transport,
                inner: Mutex::new(Inner::default()),
                message_handlers: Arc::new(HandlerList::new("message")),
                status_handlers: Arc::new(HandlerList::new("status")),
                error_handlers: Arc::new(HandlerList::new("error")),
                events: EventBus::new(),
            }),
        }
    }

    /// A client that dials real WebSockets.
    #[cfg(feature = "native")]
    pub fn native(options: ClientOptions, session_id: SessionId) -> Self {
        Self::new(
            options,
            session_id,
            Arc::new(barista_transport::native_websocket::NativeWebSocketTransport),
        )
    }

    /// Open the channel and wait for the handshake.
    ///
    /// Resolves once the server's `connected` frame arrives, or on transport
    /// open when [`ClientOptions::await_server_ack`] is off. Failures are
    /// returned and also reported to the error handlers.
    ///
    /// Fails without side effects while a channel is connecting or open. After
    /// `disconnect()` or an exhausted reconnect budget this is an explicit
    /// retry and starts with a fresh budget.
    pub async fn connect(&self) -> Result<(), ClientError> {
        let shared = &self.shared;
        let opened = {
            let mut inner = lock(&shared.inner);
            if inner.state.is_active() {
                return Err(ClientError::Connection("channel already active".to_string()));
            }
            inner.intentional_close = false;
            inner.reconnect.reset();
            if let Some(task) = inner.reconnect_task.take() {
                task.abort();
            }
            shared.open_channel(&mut inner)
        };

        let (generation, handshake) = match opened {
            Ok(opened) => opened,
            Err(e) => {
                shared.report_error(e.clone());
                return Err(e);
            }
        };
        shared.events.emit(ClientEvent::Connecting { attempt: 0 });
        shared.await_handshake(generation, handshake).await
    }

    /// Send a user chat turn. Fire and forget.
    ///
    /// When the channel is not open nothing is sent and
    /// [`ClientError::NotConnected`] goes to the error handlers.
    pub fn send_message(&self, content: &str) {
        self.shared.send_user_message(content, None);
    }

    /// [`send_message`](Self::send_message) with a `metadata` object attached.
    pub fn send_message_with_metadata(&self, content: &str, metadata: Value) {
        self.shared.send_user_message(content, Some(metadata));
    }

    pub fn on_message(&self, handler: impl Into<Callback<ChatEntry>>) -> Subscription {
        self.shared.message_handlers.register(handler.into())
    }

    pub fn on_status(&self, handler: impl Into<Callback<StatusUpdate>>) -> Subscription {
        self.shared.status_handlers.register(handler.into())
    }

    pub fn on_error(&self, handler: impl Into<Callback<ClientError>>) -> Subscription {
        self.shared.error_handlers.register(handler.into())
    }

    /// Close the channel for good and cancel any pending reconnect.
    ///
    /// Idempotent and safe to call before `connect()`.
    pub fn disconnect(&self) {
        self.shared.disconnect();
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    pub fn state(&self) -> ConnectionState {
        lock(&self.shared.inner).state
    }

    /// Reconnect attempts made since the last successful handshake.
    pub fn reconnect_attempts(&self) -> u32 {
        lock(&self.shared.inner).reconnect.attempts
    }

    pub fn session_id(&self) -> &SessionId {
        &self.shared.session_id
    }

    pub fn options(&self) -> &ClientOptions {
        &self.shared.options
    }

    pub fn subscribe_events(&self) -> async_broadcast::Receiver<ClientEvent> {
        self.shared.events.subscribe()
    }
}

impl fmt::Debug for SessionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionClient")
            .field("session_id", &self.shared.session_id)
            .field("state", &self.state())
            .finish()
    }
}

impl Shared {
    /// Replace the current channel with a freshly dialed one.
    fn open_channel(
        self: &Arc<Self>,
        inner: &mut Inner,
    ) -> Result<(u64, oneshot::Receiver<HandshakeResult>), ClientError> {
        let url = self.options.channel_url(&self.session_id)?;

        if let Some(stale) = inner.channel.take() {
            stale.close(NORMAL_CLOSURE, CLIENT_DISCONNECT_REASON);
        }
        inner.generation += 1;
        let generation = inner.generation;

        info!("Opening channel {generation} to {url}");
        let Dialed { channel, events } = self.transport.open(url.as_str());
        let (tx, rx) = oneshot::channel();
        inner.channel = Some(channel);
        inner.state = ConnectionState::Connecting;
        inner.established = false;
        inner.handshake = Some(tx);

        tokio::spawn(Arc::clone(self).drive(generation, events));
        Ok((generation, rx))
    }

    async fn await_handshake(
        &self,
        generation: u64,
        handshake: oneshot::Receiver<HandshakeResult>,
    ) -> HandshakeResult {
        match tokio::time::timeout(self.options.handshake_timeout, handshake).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(ClientError::Connection(
                "handshake abandoned".to_string(),
            )),
            Err(_) => self.abandon_handshake(generation),
        }
    }

    /// Give up on a handshake that did not finish in time.
    fn abandon_handshake(&self, generation: u64) -> HandshakeResult {
        let channel = {
            let mut inner = lock(&self.inner);
            if inner.generation != generation {
                return Err(ClientError::Connection("handshake abandoned".to_string()));
            }
            if inner.established {
                return Ok(());
            }
            inner.generation += 1;
            inner.handshake = None;
            inner.state = ConnectionState::Closed;
            inner.channel.take()
        };
        if let Some(channel) = channel {
            channel.close(NORMAL_CLOSURE, "Handshake timeout");
        }
        let err = ClientError::Connection(format!(
            "handshake timed out after {:?}",
            self.options.handshake_timeout
        ));
        self.report_error(err.clone());
        Err(err)
    }

    async fn drive(
        self: Arc<Self>,
        generation: u64,
        mut events: mpsc::UnboundedReceiver<TransportEvent>,
    ) {
        while let Some(event) = events.recv().await {
            if !self.is_current(generation) {
                debug!("Dropping {event:?} from stale channel {generation}");
                return;
            }
            match event {
                TransportEvent::Opened => self.on_open(generation),
                TransportEvent::Text(frame) => self.on_frame(generation, &frame),
                TransportEvent::Error(message) => self.on_transport_error(generation, message),
                TransportEvent::Closed { code, reason } => {
                    self.on_close(generation, code, &reason);
                    return;
                }
            }
        }
        // The transport went away without a close event.
        self.on_close(generation, ABNORMAL_CLOSURE, "transport ended");
    }

    fn is_current(&self, generation: u64) -> bool {
        lock(&self.inner).generation == generation
    }

    fn on_open(&self, generation: u64) {
        {
            let mut inner = lock(&self.inner);
            if inner.generation != generation {
                return;
            }
            inner.state = ConnectionState::Open;
        }
        info!("Channel {generation} open for {}", self.session_id);

        if !self.options.await_server_ack {
            self.complete_handshake(generation);
            self.status_handlers.emit(&StatusUpdate::new(
                StatusKind::Connected,
                json!({ "sessionId": self.session_id }),
            ));
        }
    }

    fn on_frame(&self, generation: u64, frame: &str) {
        let envelope = match Envelope::from_frame(frame) {
            Ok(envelope) => envelope,
            Err(EnvelopeError::UnknownKind(kind)) => {
                warn!("Unknown message type: {kind}");
                return;
            }
            Err(EnvelopeError::Malformed(e)) => {
                error!("Failed to parse server message: {e}");
                self.report_error(ClientError::Parse(e));
                return;
            }
        };

        match envelope.kind {
            EnvelopeKind::Message => match ChatEntry::from_envelope(&envelope) {
                Ok(entry) => self.message_handlers.emit(&entry),
                Err(e) => self.report_error(ClientError::Parse(e.to_string())),
            },
            EnvelopeKind::Connected => {
                self.complete_handshake(generation);
                self.emit_status(StatusKind::Connected, envelope.data);
            }
            EnvelopeKind::Typing => self.emit_status(StatusKind::Typing, envelope.data),
            EnvelopeKind::QueueUpdate => self.emit_status(StatusKind::QueueUpdate, envelope.data),
            EnvelopeKind::OrderUpdate => self.emit_status(StatusKind::OrderUpdate, envelope.data),
            EnvelopeKind::Error => {
                self.report_error(ClientError::Server(envelope.error_message()));
            }
        }
    }

    fn emit_status(&self, kind: StatusKind, data: Value) {
        self.status_handlers.emit(&StatusUpdate::new(kind, data));
    }

    /// Mark the current channel established, reset the reconnect budget and
    /// release the pending `connect()`.
    fn complete_handshake(&self, generation: u64) {
        let handshake = {
            let mut inner = lock(&self.inner);
            if inner.generation != generation || inner.established {
                return;
            }
            inner.established = true;
            inner.reconnect.reset();
            inner.handshake.take()
        };
        info!("Session {} connected", self.session_id);
        if let Some(handshake) = handshake {
            let _ = handshake.send(Ok(()));
        }
        self.events.emit(ClientEvent::Connected {
            session_id: self.session_id.clone(),
        });
    }

    fn on_transport_error(&self, generation: u64, message: String) {
        let handshake = {
            let mut inner = lock(&self.inner);
            if inner.generation != generation {
                return;
            }
            inner.handshake.take()
        };
        error!("WebSocket error: {message}");
        let err = ClientError::Connection(message);
        if let Some(handshake) = handshake {
            let _ = handshake.send(Err(err.clone()));
        }
        self.report_error(err);
    }

    fn on_close(self: &Arc<Self>, generation: u64, code: u16, reason: &str) {
        let (handshake, was_established) = {
            let mut inner = lock(&self.inner);
            if inner.generation != generation {
                return;
            }
            inner.channel = None;
            inner.state = ConnectionState::Closed;
            let was_established = std::mem::take(&mut inner.established);
            (inner.handshake.take(), was_established)
        };
        info!("WebSocket disconnected: {code} {reason}");

        self.status_handlers
            .emit(&StatusUpdate::disconnected(code, reason));

        if let Some(handshake) = handshake {
            let err = ClientError::Connection(format!(
                "channel closed before the handshake completed ({code} {reason})"
            ));
            let _ = handshake.send(Err(err.clone()));
            self.report_error(err);
        }

        if was_established {
            self.events.emit(ClientEvent::ConnectionLost {
                code,
                reason: reason.to_string(),
            });
            self.schedule_reconnect();
        }
    }

    fn schedule_reconnect(self: &Arc<Self>) {
        let policy = &self.options.reconnect;
        let exhausted = {
            let mut inner = lock(&self.inner);
            if inner.intentional_close {
                return;
            }
            if inner.reconnect.try_schedule(policy) {
                let task = tokio::spawn(Arc::clone(self).run_reconnect_cycle());
                inner.reconnect_task = Some(task);
                false
            } else {
                !inner.reconnect.scheduled && inner.reconnect.exhausted(policy)
            }
        };
        if exhausted {
            self.exhaust();
        }
    }

    /// Reopen with backoff until a handshake succeeds or the budget is spent.
    async fn run_reconnect_cycle(self: Arc<Self>) {
        let policy = &self.options.reconnect;
        loop {
            let (attempt, delay) = {
                let mut inner = lock(&self.inner);
                if inner.intentional_close {
                    inner.reconnect.scheduled = false;
                    return;
                }
                let attempt = inner.reconnect.next_attempt();
                (attempt, policy.jittered_delay_for(attempt, &mut rand::thread_rng()))
            };
            info!(
                "Attempting to reconnect in {delay:?} (attempt {attempt}/{})",
                policy.max_attempts
            );
            self.events.emit(ClientEvent::Reconnecting {
                attempt,
                max_attempts: policy.max_attempts,
                delay,
            });

            tokio::time::sleep(delay).await;

            let opened = {
                let mut inner = lock(&self.inner);
                if inner.intentional_close {
                    inner.reconnect.scheduled = false;
                    return;
                }
                self.open_channel(&mut inner)
            };
            let result = match opened {
                Ok((generation, handshake)) => {
                    self.events.emit(ClientEvent::Connecting { attempt });
                    self.await_handshake(generation, handshake).await
                }
                Err(e) => {
                    self.report_error(e.clone());
                    Err(e)
                }
            };

            match result {
                Ok(()) => return,
                Err(e) => warn!("Reconnect attempt {attempt} failed: {e}"),
            }

            let exhausted = {
                let mut inner = lock(&self.inner);
                if inner.intentional_close {
                    inner.reconnect.scheduled = false;
                    return;
                }
                if inner.reconnect.exhausted(policy) {
                    inner.reconnect.scheduled = false;
                    true
                } else {
                    false
                }
            };
            if exhausted {
                self.exhaust();
                return;
            }
        }
    }

    fn exhaust(&self) {
        let attempts = self.options.reconnect.max_attempts;
        error!("Max reconnection attempts reached ({attempts})");
        self.events.emit(ClientEvent::ReconnectExhausted { attempts });
        self.report_error(ClientError::ReconnectExhausted(attempts));
    }

    fn send_user_message(&self, content: &str, metadata: Option<Value>) {
        let frame = match Envelope::user_message(&self.session_id, content, metadata).to_frame() {
            Ok(frame) => frame,
            Err(e) => {
                self.report_error(ClientError::Send(e.to_string()));
                return;
            }
        };

        let sent = {
            let inner = lock(&self.inner);
            match (inner.state, inner.channel.as_ref()) {
                (ConnectionState::Open, Some(channel)) => Some(channel.send_text(frame)),
                _ => None,
            }
        };
        match sent {
            Some(Ok(())) => debug!("Sent message frame for {}", self.session_id),
            Some(Err(e)) => self.report_error(ClientError::Send(e.to_string())),
            None => {
                error!("WebSocket is not connected");
                self.report_error(ClientError::NotConnected);
            }
        }
    }

    fn disconnect(&self) {
        let (channel, handshake, task, previous) = {
            let mut inner = lock(&self.inner);
            inner.intentional_close = true;
            inner.reconnect.scheduled = false;
            inner.generation += 1;
            inner.established = false;
            let previous = std::mem::replace(&mut inner.state, ConnectionState::Disconnected);
            (
                inner.channel.take(),
                inner.handshake.take(),
                inner.reconnect_task.take(),
                previous,
            )
        };

        if let Some(task) = task {
            task.abort();
        }
        if let Some(handshake) = handshake {
            let _ = handshake.send(Err(ClientError::Connection(
                "disconnected before the handshake completed".to_string(),
            )));
        }
        if let Some(channel) = channel {
            info!("Disconnecting session {}", self.session_id);
            channel.close(NORMAL_CLOSURE, CLIENT_DISCONNECT_REASON);
            self.status_handlers.emit(&StatusUpdate::disconnected(
                NORMAL_CLOSURE,
                CLIENT_DISCONNECT_REASON,
            ));
        }
        if previous != ConnectionState::Disconnected {
            self.events.emit(ClientEvent::Disconnected);
        }
    }

    fn report_error(&self, err: ClientError) {
        self.error_handlers.emit(&err);
    }
}
