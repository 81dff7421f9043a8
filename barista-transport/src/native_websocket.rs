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

//! Native WebSocket transport using `tokio-tungstenite`.
//!
//! Each [`open`](NativeWebSocketTransport::open) spawns one task that owns the
//! socket for its whole life: it performs the handshake, forwards inbound
//! frames as [`TransportEvent`]s and writes the commands queued through the
//! returned [`Channel`].
//!
//! # Example
//!
//! ```no_run
//! use barista_transport::native_websocket::NativeWebSocketTransport;
//! use barista_transport::{Transport, TransportEvent};
//!
//! # async fn example() {
//! let mut dialed = NativeWebSocketTransport.open("ws://localhost:8000/ws/chat/session_1");
//! while let Some(event) = dialed.events.recv().await {
//!     match event {
//!         TransportEvent::Opened => dialed.channel.send_text("{}".to_string()).unwrap(),
//!         TransportEvent::Closed { code, .. } => println!("closed with {code}"),
//!         other => println!("{other:?}"),
//!     }
//! }
//! # }
//! ```

use futures::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;

use crate::{
    Channel, Dialed, Transport, TransportError, TransportEvent, ABNORMAL_CLOSURE,
    NO_STATUS_RECEIVED,
};

#[derive(Debug)]
enum Command {
    Text(String),
    Close { code: u16, reason: String },
}

/// Opens WebSocket channels on the current tokio runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeWebSocketTransport;

impl Transport for NativeWebSocketTransport {
    fn open(&self, url: &str) -> Dialed {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let closed = Arc::new(AtomicBool::new(false));

        let url = url.to_string();
        let closed_task = closed.clone();
        tokio::spawn(async move {
            run_channel(&url, command_rx, &event_tx).await;
            closed_task.store(true, Ordering::Release);
            debug!("WebSocket channel task ended for {url}");
        });

        Dialed {
            channel: Box::new(NativeWebSocketChannel {
                commands: command_tx,
                closed,
            }),
            events: event_rx,
        }
    }
}

/// Write half handed to the session client.
pub struct NativeWebSocketChannel {
    commands: mpsc::UnboundedSender<Command>,
    closed: Arc<AtomicBool>,
}

impl std::fmt::Debug for NativeWebSocketChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeWebSocketChannel")
            .field("closed", &self.closed.load(Ordering::Acquire))
            .finish()
    }
}

impl Channel for NativeWebSocketChannel {
    fn send_text(&self, text: String) -> Result<(), TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        self.commands
            .send(Command::Text(text))
            .map_err(|_| TransportError::Closed)
    }

    fn close(&self, code: u16, reason: &str) {
        if self
            .closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            let _ = self.commands.send(Command::Close {
                code,
                reason: reason.to_string(),
            });
        }
    }
}

async fn run_channel(
    url: &str,
    mut commands: mpsc::UnboundedReceiver<Command>,
    events: &mpsc::UnboundedSender<TransportEvent>,
) {
    info!("WebSocket connecting to {url}");

    let connecting = tokio_tungstenite::connect_async(url);
    tokio::pin!(connecting);

    let ws_stream = loop {
        tokio::select! {
            result = &mut connecting => match result {
                Ok((stream, response)) => {
                    info!("WebSocket connected to {url} (HTTP {})", response.status());
                    break stream;
                }
                Err(e) => {
                    error!("WebSocket connection to '{url}' failed: {e}");
                    let _ = events.send(TransportEvent::Error(format!(
                        "WebSocket connection to '{url}' failed: {e}"
                    )));
                    let _ = events.send(TransportEvent::Closed {
                        code: ABNORMAL_CLOSURE,
                        reason: e.to_string(),
                    });
                    return;
                }
            },
            command = commands.recv() => match command {
                Some(Command::Text(_)) => {
                    debug!("Dropping frame queued before the WebSocket opened");
                }
                Some(Command::Close { code, reason }) => {
                    info!("WebSocket close requested before open ({code})");
                    let _ = events.send(TransportEvent::Closed { code, reason });
                    return;
                }
                None => {
                    debug!("WebSocket channel handle dropped before open");
                    return;
                }
            },
        }
    };

    let _ = events.send(TransportEvent::Opened);
    let (mut writer, mut reader) = ws_stream.split();

    loop {
        tokio::select! {
            frame = reader.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    let _ = events.send(TransportEvent::Text(text));
                }
                Some(Ok(Message::Binary(data))) => match String::from_utf8(data) {
                    Ok(text) => {
                        let _ = events.send(TransportEvent::Text(text));
                    }
                    Err(_) => debug!("WebSocket non-UTF-8 binary frame ignored"),
                },
                Some(Ok(Message::Close(frame))) => {
                    let (code, reason) = frame
                        .map(|f| (u16::from(f.code), f.reason.into_owned()))
                        .unwrap_or((NO_STATUS_RECEIVED, String::new()));
                    info!("WebSocket received close frame ({code} {reason})");
                    let _ = events.send(TransportEvent::Closed { code, reason });
                    return;
                }
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {
                    debug!("WebSocket ping/pong");
                }
                Some(Ok(Message::Frame(_))) => {
                    debug!("WebSocket raw frame ignored");
                }
                Some(Err(e)) => {
                    error!("WebSocket read error: {e}");
                    let _ = events.send(TransportEvent::Error(format!("WebSocket read error: {e}")));
                    let _ = events.send(TransportEvent::Closed {
                        code: ABNORMAL_CLOSURE,
                        reason: e.to_string(),
                    });
                    return;
                }
                None => {
                    let _ = events.send(TransportEvent::Closed {
                        code: ABNORMAL_CLOSURE,
                        reason: "stream ended".to_string(),
                    });
                    return;
                }
            },
            command = commands.recv() => match command {
                Some(Command::Text(text)) => {
                    if let Err(e) = writer.send(Message::Text(text)).await {
                        warn!("WebSocket send error: {e}");
                        let _ = events.send(TransportEvent::Error(format!("WebSocket send error: {e}")));
                    }
                }
                Some(Command::Close { code, reason }) => {
                    let frame = CloseFrame {
                        code: CloseCode::from(code),
                        reason: reason.clone().into(),
                    };
                    if let Err(e) = writer.send(Message::Close(Some(frame))).await {
                        warn!("Error sending WebSocket close frame: {e}");
                    }
                    let _ = events.send(TransportEvent::Closed { code, reason });
                    return;
                }
                None => {
                    if let Err(e) = writer.send(Message::Close(None)).await {
                        debug!("Error sending WebSocket close frame: {e}");
                    }
                    return;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_close_before_open_reports_requested_code() {
        // Port 9 (discard) on a non-routable address keeps the handshake pending
        // long enough for the close command to win on most hosts; either way the
        // last event must be a close.
        let mut dialed = NativeWebSocketTransport.open("ws://10.255.255.1:9/ws/chat/s1");
        dialed.channel.close(1000, "Client disconnect");
        let mut last = None;
        while let Some(event) = dialed.events.recv().await {
            last = Some(event);
        }
        assert!(matches!(last, Some(TransportEvent::Closed { .. })));
    }

    #[tokio::test]
    async fn test_send_after_close_is_rejected() {
        let dialed = NativeWebSocketTransport.open("ws://127.0.0.1:1/ws/chat/s1");
        dialed.channel.close(1000, "bye");
        assert!(matches!(
            dialed.channel.send_text("late".to_string()),
            Err(TransportError::Closed)
        ));
    }
}
