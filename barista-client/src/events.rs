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

//! Connection lifecycle events and states.
//!
//! These are published on the client's [`EventBus`](crate::EventBus) so that a
//! UI can follow the connection without registering status handlers.

use std::fmt;
use std::time::Duration;

use barista_types::SessionId;

/// Lifecycle of the client's channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No channel has been opened yet.
    #[default]
    Idle,
    /// A channel is opening.
    Connecting,
    /// The channel is open and frames can be sent.
    Open,
    /// The channel closed without being asked to; a reconnect may be pending.
    Closed,
    /// `disconnect()` was called.
    Disconnected,
}

impl ConnectionState {
    pub fn is_active(&self) -> bool {
        matches!(self, ConnectionState::Connecting | ConnectionState::Open)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Closed => "closed",
            ConnectionState::Disconnected => "disconnected",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// A channel is being opened. `attempt` is 0 for an explicit `connect()`.
    Connecting { attempt: u32 },

    /// The handshake completed.
    Connected { session_id: SessionId },

    /// An established channel closed unexpectedly.
    ConnectionLost { code: u16, reason: String },

    /// A reconnect attempt was scheduled.
    Reconnecting {
        attempt: u32,
        max_attempts: u32,
        delay: Duration,
    },

    /// The reconnect budget is spent.
    ReconnectExhausted { attempts: u32 },

    /// `disconnect()` closed the client.
    Disconnected,
}
