//! Panic guards for the `extern "C"` callbacks.
//!
//! Unwinding out of a callback aborts the host. Every callback in this module
//! tree runs its body through one of these helpers, which log the panic and
//! hand the host a safe fallback instead.

use std::any::Any;
use std::backtrace::Backtrace;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Human-readable message from a panic payload.
pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        return (*msg).to_string();
    }
    if let Some(msg) = payload.downcast_ref::<String>() {
        return msg.clone();
    }
    "non-string panic payload".to_string()
}

fn report(op: &'static str, payload: Box<dyn Any + Send>) {
    let msg = panic_message(payload);
    let backtrace = Backtrace::capture();
    tracing::error!(op, "Panic in CLAP callback `{}`: {}\n{}", op, msg, backtrace);
}

/// Runs a callback that returns nothing; a panic is logged and swallowed.
pub(crate) fn guard_void(op: &'static str, f: impl FnOnce()) {
    if let Err(payload) = catch_unwind(AssertUnwindSafe(f)) {
        report(op, payload);
    }
}

/// Runs a callback and returns `default` if it panics.
pub(crate) fn guard_with_default<T>(op: &'static str, default: T, f: impl FnOnce() -> T) -> T {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(payload) => {
            report(op, payload);
            default
        }
    }
}
