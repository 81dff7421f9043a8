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

//! Per-client broadcast bus for [`ClientEvent`]s.
//!
//! Every subscriber gets every event published after it subscribed. Slow
//! subscribers lose the oldest events rather than blocking the client.
//!
//! # Example
//!
//! ```ignore
//! let mut rx = client.subscribe_events();
//! tokio::spawn(async move {
//!     while let Ok(event) = rx.recv().await {
//!         if let ClientEvent::ReconnectExhausted { attempts } = event {
//!             eprintln!("gave up after {attempts} attempts");
//!         }
//!     }
//! });
//! ```

use async_broadcast::{broadcast, InactiveReceiver, Receiver, Sender};

use crate::events::ClientEvent;

const EVENT_BUS_CAPACITY: usize = 256;

#[derive(Debug)]
pub struct EventBus {
    sender: Sender<ClientEvent>,
    // Keeps the channel open while nobody is subscribed.
    _keepalive: InactiveReceiver<ClientEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (mut sender, receiver) = broadcast(EVENT_BUS_CAPACITY);
        sender.set_overflow(true);
        Self {
            sender,
            _keepalive: receiver.deactivate(),
        }
    }

    pub fn subscribe(&self) -> Receiver<ClientEvent> {
        self.sender.new_receiver()
    }

    /// Publish without waiting. Dropped when nobody is subscribed.
    pub fn emit(&self, event: ClientEvent) {
        if self.sender.receiver_count() == 0 {
            return;
        }
        let _ = self.sender.try_broadcast(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
