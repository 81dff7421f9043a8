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

//! Conversation turns as the UI renders them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::envelope::Envelope;
use crate::iso8601;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Presentation hint attached to a turn. Unknown tags read as [`EntryType::Text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    Suggestion,
    Appointment,
    Order,
    EmotionalSupport,
    #[default]
    #[serde(other)]
    Text,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntryMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_position: Option<u32>,
}

/// One rendered conversation turn. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub id: String,
    pub role: Role,
    pub content: String,
    #[serde(with = "iso8601::required")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type", default)]
    pub entry_type: EntryType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<EntryMetadata>,
}

impl EntryMetadata {
    /// Keeps whichever fields convert and drops the rest.
    fn lenient(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        Some(Self {
            emotion: map.get("emotion").and_then(Value::as_str).map(String::from),
            confidence: map.get("confidence").and_then(loose_number),
            order_id: map.get("order_id").and_then(loose_string),
            queue_position: map
                .get("queue_position")
                .and_then(loose_number::<u64>)
                .and_then(|n| u32::try_from(n).ok()),
        })
    }
}

/// Inbound `message` payload before normalization. Only `content` is strict.
#[derive(Deserialize)]
struct MessagePayload {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    role: Value,
    content: String,
    #[serde(rename = "type", default)]
    entry_type: Value,
    #[serde(default)]
    metadata: Value,
}

fn loose_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn loose_number<T: std::str::FromStr>(value: &Value) -> Option<T> {
    match value {
        Value::Number(n) => n.to_string().parse().ok(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn generate_entry_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl ChatEntry {
    /// A turn typed locally by the user.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: generate_entry_id(),
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
            entry_type: EntryType::Text,
            metadata: None,
        }
    }

    /// Build a turn from the payload of a `message` envelope.
    ///
    /// Missing id, role and timestamp fall back to a generated id, the
    /// assistant role and the current time. Numeric ids are stringified and
    /// an unknown role reads as assistant. Metadata fields that do not
    /// convert are dropped. A payload without `content` is rejected.
    pub fn from_envelope(envelope: &Envelope) -> Result<Self, serde_json::Error> {
        let payload: MessagePayload = serde_json::from_value(envelope.data.clone())?;
        Ok(Self {
            id: loose_string(&payload.id).unwrap_or_else(generate_entry_id),
            role: serde_json::from_value(payload.role).unwrap_or(Role::Assistant),
            content: payload.content,
            timestamp: envelope.timestamp.unwrap_or_else(Utc::now),
            entry_type: serde_json::from_value(payload.entry_type).unwrap_or_default(),
            metadata: EntryMetadata::lenient(&payload.metadata),
        })
    }
}

/// Conversation history in arrival order.
///
/// Entries are never re-sorted by their `timestamp`; the order in which they
/// were pushed is the display order.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<ChatEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: ChatEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&ChatEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
