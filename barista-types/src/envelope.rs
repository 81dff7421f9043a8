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

//! The kind-tagged JSON frame exchanged over the chat channel.
//!
//! ```text
//! { "type": "message", "data": { ... }, "session_id": "...", "timestamp": "2025-..Z" }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::chat::Role;
use crate::iso8601;
use crate::session::SessionId;

const DEFAULT_SERVER_ERROR: &str = "Server error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeKind {
    Message,
    Typing,
    Error,
    Connected,
    QueueUpdate,
    OrderUpdate,
}

impl EnvelopeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvelopeKind::Message => "message",
            EnvelopeKind::Typing => "typing",
            EnvelopeKind::Error => "error",
            EnvelopeKind::Connected => "connected",
            EnvelopeKind::QueueUpdate => "queue_update",
            EnvelopeKind::OrderUpdate => "order_update",
        }
    }
}

impl fmt::Display for EnvelopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnvelopeKind {
    type Err = EnvelopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "message" => Ok(EnvelopeKind::Message),
            "typing" => Ok(EnvelopeKind::Typing),
            "error" => Ok(EnvelopeKind::Error),
            "connected" => Ok(EnvelopeKind::Connected),
            "queue_update" => Ok(EnvelopeKind::QueueUpdate),
            "order_update" => Ok(EnvelopeKind::OrderUpdate),
            other => Err(EnvelopeError::UnknownKind(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// The frame is not JSON, or does not have the envelope shape.
    #[error("malformed frame: {0}")]
    Malformed(String),

    /// The frame is well-formed but carries a `type` this client does not know.
    #[error("unknown envelope kind '{0}'")]
    UnknownKind(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: EnvelopeKind,

    #[serde(default)]
    pub data: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,

    #[serde(
        default,
        with = "iso8601::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Envelope {
    /// Parse one inbound text frame.
    ///
    /// Unknown kinds are reported separately from malformed frames so the
    /// caller can drop the former silently.
    pub fn from_frame(frame: &str) -> Result<Self, EnvelopeError> {
        let value: Value =
            serde_json::from_str(frame).map_err(|e| EnvelopeError::Malformed(e.to_string()))?;
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| EnvelopeError::Malformed("missing 'type' field".to_string()))?;
        kind.parse::<EnvelopeKind>()?;
        serde_json::from_value(value).map_err(|e| EnvelopeError::Malformed(e.to_string()))
    }

    /// Build the outbound frame for a user chat turn.
    pub fn user_message(session_id: &SessionId, content: &str, metadata: Option<Value>) -> Self {
        let mut data = Map::new();
        data.insert("role".to_string(), json!(Role::User));
        data.insert("content".to_string(), Value::String(content.to_string()));
        if let Some(metadata) = metadata {
            data.insert("metadata".to_string(), metadata);
        }
        Self {
            kind: EnvelopeKind::Message,
            data: Value::Object(data),
            session_id: Some(session_id.clone()),
            timestamp: Some(Utc::now()),
        }
    }

    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Message carried by an `error` envelope, defaulting to a generic string.
    pub fn error_message(&self) -> String {
        self.data
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_SERVER_ERROR)
            .to_string()
    }
}
