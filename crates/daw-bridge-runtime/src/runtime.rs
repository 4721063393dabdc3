//! The embedded-runtime trait.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::error::Result;
use crate::value::{Callable, RootId, Value};

/// The narrow surface an embedded runtime exposes to the bridge.
///
/// Implementations own their value representation and garbage collector.
/// The bridge only looks up named entry points, calls them, and keeps the
/// values it holds alive through the root set.
///
/// # Real-time obligation
///
/// `call` may be invoked from the host's audio thread (for the `process`
/// entry point). Nothing on this side can stop an implementation from
/// collecting, allocating or doing I/O inside that call; keeping it bounded is
/// the runtime's responsibility. A runtime that would have to wait on a lock
/// there should return [`RuntimeError::Busy`](crate::RuntimeError::Busy)
/// instead, and should offer [`liveness`](Self::liveness) flags so the bridge
/// can check handles without locking.
pub trait EmbeddedRuntime: Send + Sync {
    /// Human-readable runtime name, used in logs.
    fn name(&self) -> &str;

    /// Looks up a value registered under `name`.
    fn named_value(&self, name: &str) -> Option<Callable>;

    /// Synchronously calls `callable` with `args`, blocking until it returns.
    fn call(&self, callable: Callable, args: &[Value]) -> Result<Value>;

    /// Calls `callable` and roots a live handle result before anything can
    /// collect it.
    ///
    /// The root is `None` when the result is not a handle. A runtime that
    /// collects must not run a collection between the call and the rooting.
    fn call_rooted(&self, callable: Callable, args: &[Value]) -> Result<(Value, Option<RootId>)>;

    /// Adds `value` to the root set so the collector keeps it alive.
    fn register_root(&self, value: &Value) -> Result<RootId>;

    /// Removes a root. Returns `false` if it was not registered.
    fn remove_root(&self, root: RootId) -> bool;

    /// Whether `value` still refers to a live object.
    fn is_live(&self, value: &Value) -> bool;

    /// A flag that stays `true` while `value` is live and can be read without
    /// taking any lock. The runtime clears it when the object dies.
    ///
    /// `None` if this runtime only answers through [`is_live`](Self::is_live).
    fn liveness(&self, value: &Value) -> Option<Arc<AtomicBool>> {
        let _ = value;
        None
    }

    /// Number of registered roots.
    fn root_count(&self) -> usize;
}
