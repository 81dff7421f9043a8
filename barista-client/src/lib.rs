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

//! Realtime session client for the barista chat service.
//!
//! [`SessionClient`] keeps one WebSocket channel per chat session, dispatches
//! inbound envelopes to message, status and error handlers, sends user turns
//! and reconnects with exponential backoff when an established channel drops.
//!
//! The transport is pluggable through [`barista_transport::Transport`]; the
//! `native` feature (on by default) provides a tokio-tungstenite transport.
//!
//! Besides the handler callbacks, every client publishes [`ClientEvent`]s on a
//! broadcast [`EventBus`] for UIs that prefer a stream.

mod error;
mod event_bus;
mod events;
mod handlers;
pub mod notifications;
mod options;
mod reconnect;
mod session_client;

pub use error::ClientError;
pub use event_bus::EventBus;
pub use events::{ClientEvent, ConnectionState};
pub use handlers::Subscription;
pub use notifications::{attach_notifications, LogNotificationSink, Notification, NotificationSink};
pub use options::{ClientOptions, DEFAULT_HANDSHAKE_TIMEOUT, DEFAULT_PATH_PREFIX, DEFAULT_WS_URL};
pub use reconnect::{ReconnectPolicy, DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS};
pub use session_client::SessionClient;
