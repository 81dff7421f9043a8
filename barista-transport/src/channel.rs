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

use tokio::sync::mpsc;

/// Events reported by an opened channel, in the order they happen.
///
/// `Closed` is always the last event; the receiver ends after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The open handshake completed.
    Opened,
    /// A text frame arrived.
    Text(String),
    /// A transport-level error. Does not by itself end the channel.
    Error(String),
    /// The channel is closed, either by the peer, by us, or by failure.
    Closed { code: u16, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("channel is closed")]
    Closed,
    #[error("send failed: {0}")]
    Send(String),
}

/// The write half of a live (or still connecting) channel.
pub trait Channel: Send + Sync {
    /// Queue a text frame for transmission.
    fn send_text(&self, text: String) -> Result<(), TransportError>;

    /// Start a close with the given code and reason. Idempotent.
    fn close(&self, code: u16, reason: &str);
}

/// A channel whose handshake has been started.
pub struct Dialed {
    pub channel: Box<dyn Channel>,
    pub events: mpsc::UnboundedReceiver<TransportEvent>,
}

impl std::fmt::Debug for Dialed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dialed").finish_non_exhaustive()
    }
}

/// Something that can open channels to a URL.
///
/// `open` must not block: the handshake runs in the background and its
/// outcome is reported through [`Dialed::events`]. Implementations that
/// spawn tasks require a tokio runtime.
pub trait Transport: Send + Sync + 'static {
    fn open(&self, url: &str) -> Dialed;
}
