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

//! Rendering of chat turns, menus and notifications on stdout.

use barista_api_client::api::MenuResponse;
use barista_client::notifications::Severity;
use barista_client::{Notification, NotificationSink};
use barista_types::{ChatEntry, EntryType, Role, Transcript};

/// Prints notifications the way the web UI shows toasts.
#[derive(Debug, Default)]
pub struct TerminalSink;

impl NotificationSink for TerminalSink {
    fn notify(&self, notification: Notification) {
        println!("{}", format_notification(&notification));
    }
}

pub fn format_notification(notification: &Notification) -> String {
    let marker = match (notification.severity, notification.persistent) {
        (Severity::Error, true) => "!!",
        (Severity::Error, false) => "!",
        (Severity::Info, _) => "*",
    };
    format!(
        "{marker} {}: {}",
        notification.title, notification.description
    )
}

pub fn format_entry(entry: &ChatEntry) -> String {
    let speaker = match entry.role {
        Role::User => "you",
        Role::Assistant => "barista",
    };
    let tag = match entry.entry_type {
        EntryType::Text => "",
        EntryType::Suggestion => " [suggestion]",
        EntryType::Appointment => " [appointment]",
        EntryType::Order => " [order]",
        EntryType::EmotionalSupport => " [support]",
    };
    format!(
        "{} {speaker}{tag}> {}",
        entry.timestamp.format("%H:%M"),
        entry.content
    )
}

pub fn format_transcript(transcript: &Transcript) -> String {
    if transcript.is_empty() {
        return "(no messages yet)".to_string();
    }
    transcript
        .entries()
        .iter()
        .map(format_entry)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_menu(menu: &MenuResponse) -> String {
    let mut lines = Vec::new();
    for category in &menu.categories {
        let items: Vec<_> = menu.items_in_category(category).collect();
        if items.is_empty() {
            continue;
        }
        lines.push(format!("{category}:"));
        for item in items {
            let note = if item.availability.is_available {
                String::new()
            } else {
                " (sold out)".to_string()
            };
            lines.push(format!("  {:<24} ${:>5.2}{note}", item.name, item.price));
        }
    }
    lines.join("\n")
}
