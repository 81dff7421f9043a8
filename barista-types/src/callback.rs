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

//! Framework-agnostic callback type.
//!
//! Handlers are invoked from the session client's driver task, so the wrapped
//! function must be `Send + Sync`.

use std::fmt;
use std::sync::Arc;

/// Universal callback wrapper.
///
/// An `Arc` wrapper is used to make it cloneable across tasks.
pub struct Callback<IN, OUT = ()> {
    cb: Arc<dyn Fn(IN) -> OUT + Send + Sync>,
}

impl<IN, OUT, F: Fn(IN) -> OUT + Send + Sync + 'static> From<F> for Callback<IN, OUT> {
    fn from(func: F) -> Self {
        Callback { cb: Arc::new(func) }
    }
}

impl<IN, OUT> Clone for Callback<IN, OUT> {
    fn clone(&self) -> Self {
        Self {
            cb: self.cb.clone(),
        }
    }
}

#[allow(clippy::vtable_address_comparisons)]
impl<IN, OUT> PartialEq for Callback<IN, OUT> {
    fn eq(&self, other: &Callback<IN, OUT>) -> bool {
        Arc::ptr_eq(&self.cb, &other.cb)
    }
}

impl<IN, OUT> fmt::Debug for Callback<IN, OUT> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback<_>")
    }
}

impl<IN, OUT> Callback<IN, OUT> {
    /// Calls the callback's function.
    pub fn emit(&self, value: IN) -> OUT {
        (*self.cb)(value)
    }
}

impl<IN: 'static, OUT: 'static> Callback<IN, OUT> {
    /// Creates a new callback that maps its input through `func` before emitting to `self`.
    pub fn reform<F, T>(&self, func: F) -> Callback<T, OUT>
    where
        F: Fn(T) -> IN + Send + Sync + 'static,
    {
        let this = self.clone();
        Callback::from(move |input| this.emit(func(input)))
    }
}

#[cfg(test)]
mod test {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn test_callback_emit() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let cb = Callback::from(move |v: u32| sink.lock().unwrap().push(v));
        cb.emit(1);
        cb.emit(2);
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_reform() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let cb = Callback::from(move |v: bool| sink.lock().unwrap().push(v));
        let negated = cb.reform(|v: bool| !v);
        negated.emit(true);
        negated.emit(false);
        assert_eq!(*seen.lock().unwrap(), vec![false, true]);
    }

    #[test]
    fn test_clone_is_pointer_equal() {
        let cb: Callback<()> = Callback::from(|_| ());
        let other = cb.clone();
        assert_eq!(cb, other);
        assert_ne!(cb, Callback::from(|_| ()));
    }
}
