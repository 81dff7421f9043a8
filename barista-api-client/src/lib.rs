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

//! Typed REST client for the barista coffee-shop API.
//!
//! # Example
//!
//! ```no_run
//! use barista_api_client::{ApiConfig, BaristaApiClient};
//!
//! # async fn example() -> Result<(), barista_api_client::ApiError> {
//! let client = BaristaApiClient::new(ApiConfig::default());
//! let menu = client.get_menu().await?;
//! for item in menu.items_in_category("coffee") {
//!     println!("{} ${:.2}", item.name, item.price);
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod insights;
pub mod menu;
pub mod orders;
pub mod queue;

pub use barista_types::api;
pub use error::ApiError;

use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use barista_types::{truthy, SessionId};
use log::warn;
use reqwest::Client;
use serde::de::DeserializeOwned;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_WS_URL: &str = "ws://localhost:8000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub api_url: String,
    pub ws_url: String,
    /// Serve placeholder data for the menu and knowledge search when the API
    /// cannot be reached.
    pub offline_fallback: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            ws_url: DEFAULT_WS_URL.to_string(),
            offline_fallback: false,
        }
    }
}

impl ApiConfig {
    /// Defaults overridden by `BARISTA_API_URL`, `BARISTA_WS_URL` and
    /// `BARISTA_OFFLINE_FALLBACK`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_url: env::var("BARISTA_API_URL").unwrap_or(defaults.api_url),
            ws_url: env::var("BARISTA_WS_URL").unwrap_or(defaults.ws_url),
            offline_fallback: truthy(env::var("BARISTA_OFFLINE_FALLBACK").ok().as_deref()),
        }
    }
}

/// A typed REST client for the barista API.
///
/// Non-2xx responses map to [`ApiError`]. Cloning is cheap and clones share
/// the offline flag.
#[derive(Debug, Clone)]
pub struct BaristaApiClient {
    base_url: String,
    ws_url: String,
    offline_fallback: bool,
    offline: Arc<AtomicBool>,
    http: Client,
}

impl BaristaApiClient {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            ws_url: config.ws_url.trim_end_matches('/').to_string(),
            offline_fallback: config.offline_fallback,
            offline: Arc::new(AtomicBool::new(false)),
            http: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Realtime chat endpoint for `session_id`: `<ws_url>/ws/chat/<session_id>`.
    pub fn websocket_url(&self, session_id: &SessionId) -> String {
        format!("{}/ws/chat/{}", self.ws_url, session_id)
    }

    /// Whether a failed health check put the client in offline mode.
    pub fn is_offline(&self) -> bool {
        self.offline.load(Ordering::Acquire)
    }

    /// Calls `GET /health`.
    ///
    /// With offline fallback enabled, a failure switches the client to offline
    /// mode and a success switches it back.
    pub async fn health_check(&self) -> Result<api::HealthReport, ApiError> {
        let result: Result<api::HealthReport, ApiError> = async {
            let response = self.get("/health").send().await?;
            parse_json(response).await
        }
        .await;
        if self.offline_fallback {
            let offline = result.is_err();
            if offline && !self.is_offline() {
                warn!("Backend not available, running in offline mode");
            }
            self.offline.store(offline, Ordering::Release);
        }
        result
    }

    pub(crate) fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.http.get(self.url(path))
    }

    pub(crate) fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.http.post(self.url(path))
    }

    pub(crate) fn put(&self, path: &str) -> reqwest::RequestBuilder {
        self.http.put(self.url(path))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Serve `placeholder` instead of calling the API when offline, and
    /// instead of failing when the call fails. Without fallback the call's
    /// result is returned unchanged.
    pub(crate) async fn with_offline_fallback<T, F>(
        &self,
        placeholder: impl FnOnce() -> T,
        call: F,
    ) -> Result<T, ApiError>
    where
        F: std::future::Future<Output = Result<T, ApiError>>,
    {
        if !self.offline_fallback {
            return call.await;
        }
        if self.is_offline() {
            return Ok(placeholder());
        }
        match call.await {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!("API call failed, using offline data: {e}");
                Ok(placeholder())
            }
        }
    }
}

/// Decode a 2xx JSON body into `T`, or map the status to [`ApiError`].
pub(crate) async fn parse_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status().as_u16();
    let text = response.text().await?;
    match status {
        200..=299 => Ok(serde_json::from_str(&text)?),
        404 => Err(ApiError::NotFound(text)),
        _ => Err(ApiError::Status { status, body: text }),
    }
}
