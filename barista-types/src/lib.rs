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

//! Shared types for the barista chat workspace.
//!
//! The realtime wire format ([`Envelope`]), the UI-level conversation turn
//! ([`ChatEntry`]), status updates, session identifiers and the REST payloads
//! consumed by `barista-api-client` all live here so that the client, the CLI
//! and any UI front-end agree on one definition.

pub mod api;
pub mod callback;
pub mod chat;
pub mod envelope;
pub mod iso8601;
pub mod session;
pub mod status;

pub use callback::Callback;
pub use chat::{ChatEntry, EntryMetadata, EntryType, Role, Transcript};
pub use envelope::{Envelope, EnvelopeError, EnvelopeKind};
pub use session::SessionId;
pub use status::{StatusKind, StatusUpdate};

/// Close code used for an intentional, client-initiated close.
pub const NORMAL_CLOSURE: u16 = 1000;

/// Close reason sent alongside [`NORMAL_CLOSURE`] by `disconnect()`.
pub const CLIENT_DISCONNECT_REASON: &str = "Client disconnect";

pub fn truthy(s: Option<&str>) -> bool {
    if let Some(s) = s {
        ["true".to_string(), "1".to_string()].contains(&s.to_lowercase())
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthy() {
        assert!(truthy(Some("true")));
        assert!(truthy(Some("TRUE")));
        assert!(truthy(Some("1")));
        assert!(!truthy(Some("0")));
        assert!(!truthy(Some("yes")));
        assert!(!truthy(None));
    }
}
