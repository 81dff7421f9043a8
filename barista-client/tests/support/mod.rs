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

//! In-memory transport whose channels follow a per-open script.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use barista_client::{ClientError, ClientEvent};
use barista_transport::{Channel, Dialed, Transport, TransportError, TransportEvent};
use tokio::sync::mpsc;
use tokio::time::Instant;

pub const CONNECTED_FRAME: &str =
    r#"{"type":"connected","data":{"message":"Welcome to the cafe"},"session_id":"s-test"}"#;

/// What a freshly opened channel does on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    /// Opens, and sends the server `connected` frame when `ack` is set.
    Accept { ack: bool },
    /// Fails the handshake: error then abnormal close.
    Refuse,
    /// Never reports anything.
    Hang,
}

pub struct Probe {
    pub url: String,
    pub opened_at: Instant,
    events: mpsc::UnboundedSender<TransportEvent>,
    sent: Mutex<Vec<String>>,
    closed: Mutex<Option<(u16, String)>>,
}

impl Probe {
    pub fn push(&self, event: TransportEvent) {
        let _ = self.events.send(event);
    }

    pub fn push_text(&self, frame: &str) {
        self.push(TransportEvent::Text(frame.to_string()));
    }

    /// Simulate the server going away.
    pub fn drop_connection(&self, code: u16) {
        self.push(TransportEvent::Closed {
            code,
            reason: "server went away".to_string(),
        });
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn closed_with(&self) -> Option<(u16, String)> {
        self.closed.lock().unwrap().clone()
    }
}

struct ScriptedChannel {
    probe: Arc<Probe>,
}

impl Channel for ScriptedChannel {
    fn send_text(&self, text: String) -> Result<(), TransportError> {
        if self.probe.closed.lock().unwrap().is_some() {
            return Err(TransportError::Closed);
        }
        self.probe.sent.lock().unwrap().push(text);
        Ok(())
    }

    fn close(&self, code: u16, reason: &str) {
        let mut closed = self.probe.closed.lock().unwrap();
        if closed.is_none() {
            *closed = Some((code, reason.to_string()));
            self.probe.push(TransportEvent::Closed {
                code,
                reason: reason.to_string(),
            });
        }
    }
}

pub struct ScriptedTransport {
    plans: Mutex<VecDeque<Plan>>,
    fallback: Plan,
    probes: Mutex<Vec<Arc<Probe>>>,
}

impl ScriptedTransport {
    /// Channels follow `plans` in order, then `fallback` forever.
    pub fn new(plans: impl IntoIterator<Item = Plan>, fallback: Plan) -> Arc<Self> {
        Arc::new(Self {
            plans: Mutex::new(plans.into_iter().collect()),
            fallback,
            probes: Mutex::new(Vec::new()),
        })
    }

    pub fn always(plan: Plan) -> Arc<Self> {
        Self::new([], plan)
    }

    pub fn opens(&self) -> usize {
        self.probes.lock().unwrap().len()
    }

    pub fn probe(&self, index: usize) -> Arc<Probe> {
        Arc::clone(&self.probes.lock().unwrap()[index])
    }

    pub fn last(&self) -> Arc<Probe> {
        let probes = self.probes.lock().unwrap();
        Arc::clone(probes.last().expect("no channel opened yet"))
    }

    pub fn open_times(&self) -> Vec<Instant> {
        self.probes
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.opened_at)
            .collect()
    }
}

impl Transport for ScriptedTransport {
    fn open(&self, url: &str) -> Dialed {
        let plan = self
            .plans
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.fallback);
        let (tx, rx) = mpsc::unbounded_channel();
        let probe = Arc::new(Probe {
            url: url.to_string(),
            opened_at: Instant::now(),
            events: tx,
            sent: Mutex::new(Vec::new()),
            closed: Mutex::new(None),
        });

        match plan {
            Plan::Accept { ack } => {
                probe.push(TransportEvent::Opened);
                if ack {
                    probe.push_text(CONNECTED_FRAME);
                }
            }
            Plan::Refuse => {
                probe.push(TransportEvent::Error("connection refused".to_string()));
                probe.push(TransportEvent::Closed {
                    code: 1006,
                    reason: String::new(),
                });
            }
            Plan::Hang => {}
        }

        self.probes.lock().unwrap().push(Arc::clone(&probe));
        Dialed {
            channel: Box::new(ScriptedChannel { probe }),
            events: rx,
        }
    }
}

/// Shared sink for values delivered to a handler.
pub fn collector<T: Clone + Send + 'static>() -> (Arc<Mutex<Vec<T>>>, impl Fn(T) + Send + Sync) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    (seen, move |value: T| sink.lock().unwrap().push(value))
}

pub fn count_errors(errors: &Mutex<Vec<ClientError>>, pred: impl Fn(&ClientError) -> bool) -> usize {
    errors.lock().unwrap().iter().filter(|e| pred(e)).count()
}

/// Let spawned tasks drain their queues. Advances the paused clock slightly.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(5)).await;
}

/// Receive bus events until one matches.
pub async fn wait_for_event(
    rx: &mut async_broadcast::Receiver<ClientEvent>,
    pred: impl Fn(&ClientEvent) -> bool,
) -> ClientEvent {
    tokio::time::timeout(Duration::from_secs(600), async {
        loop {
            match rx.recv().await {
                Ok(event) if pred(&event) => return event,
                Ok(_) => continue,
                Err(async_broadcast::RecvError::Overflowed(_)) => continue,
                Err(async_broadcast::RecvError::Closed) => panic!("event bus closed"),
            }
        }
    })
    .await
    .expect("timed out waiting for client event")
}
