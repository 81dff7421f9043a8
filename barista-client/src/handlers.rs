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

//! Ordered handler registries and the [`Subscription`] handle that removes an
//! entry again.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use barista_types::Callback;
use log::error;

pub(crate) struct HandlerList<T> {
    label: &'static str,
    next_id: AtomicU64,
    entries: Mutex<Vec<(u64, Callback<T>)>>,
}

impl<T: Clone + 'static> HandlerList<T> {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            next_id: AtomicU64::new(0),
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Append a handler and return a subscription that removes it.
    pub fn register(self: &Arc<Self>, callback: Callback<T>) -> Subscription
    where
        T: Send,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.entries).push((id, callback));

        let list: Weak<Self> = Arc::downgrade(self);
        Subscription::new(move || {
            if let Some(list) = list.upgrade() {
                list.remove(id);
            }
        })
    }

    fn remove(&self, id: u64) {
        lock(&self.entries).retain(|(entry, _)| *entry != id);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    /// Invoke every handler registered at the time of the call, in order.
    ///
    /// The registry lock is released before any handler runs, so handlers may
    /// register, unsubscribe or call back into the client.
    pub fn emit(&self, value: &T) {
        let snapshot: Vec<Callback<T>> = lock(&self.entries)
            .iter()
            .map(|(_, cb)| cb.clone())
            .collect();
        for callback in snapshot {
            let arg = value.clone();
            if catch_unwind(AssertUnwindSafe(|| callback.emit(arg))).is_err() {
                error!("{} handler panicked; continuing with remaining handlers", self.label);
            }
        }
    }
}

pub(crate) fn lock<V>(mutex: &Mutex<V>) -> std::sync::MutexGuard<'_, V> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Handle returned by the `on_*` registration methods.
///
/// Dropping a subscription keeps the handler registered; call
/// [`unsubscribe`](Subscription::unsubscribe) to remove it.
#[must_use = "keep the subscription to be able to unsubscribe the handler"]
pub struct Subscription {
    unregister: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub(crate) fn new(unregister: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            unregister: Some(Box::new(unregister)),
        }
    }

    pub fn unsubscribe(mut self) {
        if let Some(unregister) = self.unregister.take() {
            unregister();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unregister.is_some())
            .finish()
    }
}
