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

use std::time::Duration;

use barista_api_client::ApiConfig;
use barista_client::ClientOptions;
use clap::Parser;
use url::Url;

/// Chat with the barista from a terminal.
///
/// Flags override the `BARISTA_*` environment variables, which may also come
/// from a `.env` file in the working directory.
#[derive(Parser, Debug)]
#[clap(name = "barista-chat", version)]
pub struct Opt {
    /// Base URL of the realtime endpoint, e.g. ws://localhost:8000
    #[clap(long = "ws-url")]
    pub ws_url: Option<Url>,

    /// Base URL of the REST API, e.g. http://localhost:8000
    #[clap(long = "api-url")]
    pub api_url: Option<Url>,

    /// Resume an existing session instead of starting a new one.
    #[clap(long = "session-id")]
    pub session_id: Option<String>,

    /// Treat the channel as connected as soon as the socket opens instead of
    /// waiting for the server's `connected` frame.
    #[clap(long = "no-ack")]
    pub no_ack: bool,

    #[clap(long = "max-reconnect-attempts")]
    pub max_reconnect_attempts: Option<u32>,

    #[clap(long = "handshake-timeout-ms")]
    pub handshake_timeout_ms: Option<u64>,

    /// Show placeholder menu data when the API is unreachable.
    #[clap(long = "offline-fallback")]
    pub offline_fallback: bool,
}

impl Opt {
    pub fn client_options(&self) -> ClientOptions {
        let mut options = ClientOptions::from_env();
        if let Some(url) = &self.ws_url {
            options.ws_base_url = url.to_string();
        }
        if self.no_ack {
            options.await_server_ack = false;
        }
        if let Some(max) = self.max_reconnect_attempts {
            options.reconnect.max_attempts = max;
        }
        if let Some(ms) = self.handshake_timeout_ms {
            options.handshake_timeout = Duration::from_millis(ms);
        }
        options
    }

    pub fn api_config(&self) -> ApiConfig {
        let mut config = ApiConfig::from_env();
        if let Some(url) = &self.api_url {
            config.api_url = url.to_string();
        }
        if let Some(url) = &self.ws_url {
            config.ws_url = url.to_string();
        }
        config.offline_fallback |= self.offline_fallback;
        config
    }
}
