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

//! Errors surfaced by the session client.
//!
//! Only handshake failures are returned from [`connect`](crate::SessionClient::connect);
//! every kind is also delivered to the registered error handlers.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The open handshake failed, timed out, or the channel errored.
    #[error("connection error: {0}")]
    Connection(String),

    /// A send was attempted while the channel was not open.
    #[error("Not connected to server")]
    NotConnected,

    /// An inbound frame could not be parsed.
    #[error("Failed to parse server message: {0}")]
    Parse(String),

    /// The server sent an `error` envelope.
    #[error("{0}")]
    Server(String),

    /// The reconnection budget is spent; no further attempts are scheduled.
    #[error("Maximum reconnection attempts reached ({0})")]
    ReconnectExhausted(u32),

    /// The transport refused an outbound frame.
    #[error("Failed to send message: {0}")]
    Send(String),
}

impl ClientError {
    /// Whether the UI should treat this error as a lasting state rather than a
    /// dismissible notification.
    pub fn is_persistent(&self) -> bool {
        matches!(self, ClientError::ReconnectExhausted(_))
    }
}
