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

//! User-facing notifications derived from status updates and errors.

use std::sync::Arc;

use barista_types::{
    Callback, StatusKind, StatusUpdate, CLIENT_DISCONNECT_REASON, NORMAL_CLOSURE,
};
use log::{error, info};

use crate::error::ClientError;
use crate::handlers::Subscription;
use crate::session_client::SessionClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub severity: Severity,
    /// Stays visible until the user acts, instead of fading out.
    pub persistent: bool,
}

impl Notification {
    fn info(title: &str, description: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            description: description.into(),
            severity: Severity::Info,
            persistent: false,
        }
    }

    fn error(title: &str, description: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            description: description.into(),
            severity: Severity::Error,
            persistent: false,
        }
    }

    /// The notification shown for a status update, if any. Typing indicators
    /// produce none.
    pub fn for_status(status: &StatusUpdate) -> Option<Self> {
        match status.kind {
            StatusKind::Connected => Some(Self::info(
                "Connected",
                "Chat connection established successfully!",
            )),
            StatusKind::Disconnected => {
                let intentional = status.close_code() == Some(NORMAL_CLOSURE)
                    && status.close_reason() == Some(CLIENT_DISCONNECT_REASON);
                if intentional {
                    Some(Self::info("Disconnected", "Chat session closed."))
                } else {
                    Some(Self::error(
                        "Disconnected",
                        "Connection lost. Attempting to reconnect...",
                    ))
                }
            }
            StatusKind::QueueUpdate => {
                let position = status
                    .queue_position()
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                Some(Self::info("Queue Update", format!("Your position: {position}")))
            }
            StatusKind::OrderUpdate => Some(Self::info(
                "Order Update",
                format!("Order status: {}", status.order_status().unwrap_or("unknown")),
            )),
            StatusKind::Typing => None,
        }
    }

    pub fn for_error(err: &ClientError) -> Self {
        match err {
            ClientError::NotConnected => Self::error(
                "Not Connected",
                "Please wait for connection to be established.",
            ),
            ClientError::Send(_) => {
                Self::error("Send Failed", "Failed to send message. Please try again.")
            }
            ClientError::ReconnectExhausted(_) => Self {
                persistent: true,
                ..Self::error("Connection Error", err.to_string())
            },
            _ => Self::error("Connection Error", err.to_string()),
        }
    }
}

/// Where notifications end up: a toast layer, a terminal, a log.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications through the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotificationSink;

impl NotificationSink for LogNotificationSink {
    fn notify(&self, notification: Notification) {
        match notification.severity {
            Severity::Info => info!("{}: {}", notification.title, notification.description),
            Severity::Error => error!("{}: {}", notification.title, notification.description),
        }
    }
}

/// Register status and error handlers on `client` that forward to `sink`.
///
/// Unsubscribe the returned subscriptions to detach.
pub fn attach_notifications(
    client: &SessionClient,
    sink: Arc<dyn NotificationSink>,
) -> Vec<Subscription> {
    let notify = Callback::from(move |notification: Option<Notification>| {
        if let Some(notification) = notification {
            sink.notify(notification);
        }
    });
    let status =
        client.on_status(notify.reform(|status: StatusUpdate| Notification::for_status(&status)));
    let errors =
        client.on_error(notify.reform(|err: ClientError| Some(Notification::for_error(&err))));
    vec![status, errors]
}
