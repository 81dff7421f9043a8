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

use std::env;
use std::str::FromStr;
use std::time::Duration;

use barista_types::{truthy, SessionId};
use log::warn;
use url::Url;

use crate::error::ClientError;
use crate::reconnect::ReconnectPolicy;

pub const DEFAULT_WS_URL: &str = "ws://localhost:8000";
pub const DEFAULT_PATH_PREFIX: &str = "ws/chat";
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Options for a [`SessionClient`](crate::SessionClient).
#[derive(Debug, Clone, PartialEq)]
pub struct ClientOptions {
    /// Scheme, host and optional base path of the realtime endpoint.
    pub ws_base_url: String,
    /// Path segments between the base URL and the session id.
    pub path_prefix: String,
    /// Upper bound for `connect()` to observe the handshake.
    pub handshake_timeout: Duration,
    pub reconnect: ReconnectPolicy,
    /// Resolve `connect()` on the server's `connected` frame rather than on
    /// transport open.
    pub await_server_ack: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            ws_base_url: DEFAULT_WS_URL.to_string(),
            path_prefix: DEFAULT_PATH_PREFIX.to_string(),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            reconnect: ReconnectPolicy::default(),
            await_server_ack: true,
        }
    }
}

impl ClientOptions {
    /// Defaults overridden by `BARISTA_*` environment variables. Unparseable
    /// values are logged and ignored.
    pub fn from_env() -> Self {
        let mut options = Self::default();
        if let Ok(url) = env::var("BARISTA_WS_URL") {
            options.ws_base_url = url;
        }
        if let Ok(path) = env::var("BARISTA_WS_PATH") {
            options.path_prefix = path;
        }
        if let Some(ms) = parse_var::<u64>("BARISTA_HANDSHAKE_TIMEOUT_MS") {
            options.handshake_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64>("BARISTA_RECONNECT_BASE_MS") {
            options.reconnect.base_delay = Duration::from_millis(ms);
        }
        if let Some(max) = parse_var::<u32>("BARISTA_RECONNECT_MAX_ATTEMPTS") {
            options.reconnect.max_attempts = max;
        }
        if let Some(ms) = parse_var::<u64>("BARISTA_RECONNECT_MAX_DELAY_MS") {
            options.reconnect.max_delay = Some(Duration::from_millis(ms));
        }
        if let Ok(ack) = env::var("BARISTA_AWAIT_SERVER_ACK") {
            options.await_server_ack = truthy(Some(&ack));
        }
        options
    }

    /// `<ws_base_url>/<path_prefix>/<session_id>`.
    pub fn channel_url(&self, session_id: &SessionId) -> Result<Url, ClientError> {
        let mut url = Url::parse(&self.ws_base_url).map_err(|e| {
            ClientError::Connection(format!("invalid WebSocket URL '{}': {e}", self.ws_base_url))
        })?;
        match url.scheme() {
            "ws" | "wss" => {}
            other => {
                return Err(ClientError::Connection(format!(
                    "unsupported WebSocket scheme '{other}'"
                )))
            }
        }
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                ClientError::Connection(format!(
                    "WebSocket URL '{}' cannot carry a path",
                    self.ws_base_url
                ))
            })?;
            segments.pop_if_empty();
            for segment in self.path_prefix.split('/').filter(|s| !s.is_empty()) {
                segments.push(segment);
            }
            segments.push(session_id.as_str());
        }
        Ok(url)
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {name}={raw}: not a valid value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_channel_url() {
        let options = ClientOptions::default();
        let url = options.channel_url(&SessionId::from("session_1_abc")).unwrap();
        assert_eq!(url.as_str(), "ws://localhost:8000/ws/chat/session_1_abc");
    }

    #[test]
    fn test_channel_url_keeps_base_path() {
        let options = ClientOptions {
            ws_base_url: "wss://cafe.example.com/realtime/".to_string(),
            path_prefix: "/ws/chat/".to_string(),
            ..Default::default()
        };
        let url = options.channel_url(&SessionId::from("s")).unwrap();
        assert_eq!(url.as_str(), "wss://cafe.example.com/realtime/ws/chat/s");
    }

    #[test]
    fn test_channel_url_rejects_http() {
        let options = ClientOptions {
            ws_base_url: "http://localhost:8000".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            options.channel_url(&SessionId::from("s")),
            Err(ClientError::Connection(_))
        ));
    }

    #[test]
    fn test_channel_url_rejects_garbage() {
        let options = ClientOptions {
            ws_base_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(options.channel_url(&SessionId::from("s")).is_err());
    }

    #[test]
    fn test_defaults() {
        let options = ClientOptions::default();
        assert_eq!(options.handshake_timeout, Duration::from_secs(10));
        assert_eq!(options.reconnect.max_attempts, 5);
        assert_eq!(options.reconnect.base_delay, Duration::from_secs(1));
        assert!(options.await_server_ack);
    }
}
