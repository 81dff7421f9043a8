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

//! Transport layer for the barista chat client.
//!
//! The session client only talks to the [`Transport`] and [`Channel`] traits,
//! which model a browser-style socket: `open` starts the handshake in the
//! background and every state change arrives as a [`TransportEvent`].
//!
//! # Features
//!
//! - **`native`**: WebSocket transport built on `tokio-tungstenite`

mod channel;

pub use channel::{Channel, Dialed, Transport, TransportError, TransportEvent};

// ── Native transports ─────────────────────────────────────────────────────────

#[cfg(feature = "native")]
pub mod native_websocket;

/// Close code reported when a close frame carried no status.
pub const NO_STATUS_RECEIVED: u16 = 1005;

/// Close code reported when the connection dropped without a close frame.
pub const ABNORMAL_CLOSURE: u16 = 1006;
