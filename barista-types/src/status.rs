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

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Connected,
    Disconnected,
    Typing,
    QueueUpdate,
    OrderUpdate,
}

/// `{ type, data }` delivered to status handlers. `data` is the raw server
/// payload; the accessors cover the fields the chat UI reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    #[serde(rename = "type")]
    pub kind: StatusKind,
    pub data: Value,
}

impl StatusUpdate {
    pub fn new(kind: StatusKind, data: Value) -> Self {
        Self { kind, data }
    }

    pub fn disconnected(code: u16, reason: &str) -> Self {
        Self::new(
            StatusKind::Disconnected,
            json!({ "code": code, "reason": reason }),
        )
    }

    /// `data.typing` of a typing update; absent reads as `false`.
    pub fn is_typing(&self) -> bool {
        self.data
            .get("typing")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// `data.position` of a queue update.
    pub fn queue_position(&self) -> Option<u64> {
        self.data.get("position").and_then(Value::as_u64)
    }

    /// `data.status` of an order update.
    pub fn order_status(&self) -> Option<&str> {
        self.data.get("status").and_then(Value::as_str)
    }

    /// Close code of a disconnected update.
    pub fn close_code(&self) -> Option<u16> {
        self.data
            .get("code")
            .and_then(Value::as_u64)
            .and_then(|c| u16::try_from(c).ok())
    }

    pub fn close_reason(&self) -> Option<&str> {
        self.data.get("reason").and_then(Value::as_str)
    }
}
