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

mod cli_args;
mod terminal;

use std::sync::{Arc, Mutex};

use anyhow::Context;
use barista_api_client::BaristaApiClient;
use barista_client::{attach_notifications, SessionClient};
use barista_types::{ChatEntry, SessionId, StatusKind, StatusUpdate, Transcript};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::level_filters::LevelFilter;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli_args::Opt;
use crate::terminal::{format_entry, format_menu, format_transcript, TerminalSink};

const HELP: &str = "Type a message and press enter. Commands: /menu, /history, /quit";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let opt = Opt::parse();
    let session_id = opt
        .session_id
        .clone()
        .map(SessionId::from)
        .unwrap_or_else(SessionId::generate);
    let api = BaristaApiClient::new(opt.api_config());
    let client = SessionClient::native(opt.client_options(), session_id);

    if let Err(e) = api.health_check().await {
        warn!("Health check failed: {e}");
    }

    let transcript = Arc::new(Mutex::new(Transcript::new()));
    let _subscriptions = {
        let mut subs = attach_notifications(&client, Arc::new(TerminalSink));
        let incoming = Arc::clone(&transcript);
        subs.push(client.on_message(move |entry: ChatEntry| {
            println!("{}", format_entry(&entry));
            if let Ok(mut transcript) = incoming.lock() {
                transcript.push(entry);
            }
        }));
        subs.push(client.on_status(|status: StatusUpdate| {
            if status.kind == StatusKind::Typing && status.is_typing() {
                println!("... barista is typing");
            }
        }));
        subs
    };

    info!("Starting session {}", client.session_id());
    client
        .connect()
        .await
        .context("Unable to connect to chat service. Please try again.")?;
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else { break };
        let line = line.trim();
        match line {
            "" => continue,
            "/quit" => break,
            "/help" => println!("{HELP}"),
            "/history" => {
                let history = match transcript.lock() {
                    Ok(transcript) => format_transcript(&transcript),
                    Err(_) => continue,
                };
                println!("{history}");
            }
            "/menu" => match api.get_menu().await {
                Ok(menu) => println!("{}", format_menu(&menu)),
                Err(e) => warn!("Could not load the menu: {e}"),
            },
            text => {
                if client.is_connected() {
                    if let Ok(mut transcript) = transcript.lock() {
                        transcript.push(ChatEntry::user(text));
                    }
                }
                client.send_message(text);
            }
        }
    }

    client.disconnect();
    info!("Session {} closed", client.session_id());
    Ok(())
}
