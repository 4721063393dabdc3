//! Runtime handles kept alive through the root set.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Result, RuntimeError};
use crate::runtime::EmbeddedRuntime;
use crate::value::{HandleId, RootId, Value};

/// A runtime handle registered as a root for as long as this value exists.
///
/// The root is removed exactly once, in `Drop`. Moving the handle moves the
/// responsibility with it.
///
/// When the runtime hands out a liveness flag, [`is_live`](Self::is_live) is a
/// single atomic load and safe to call from the audio thread.
pub struct PinnedHandle {
    runtime: Arc<dyn EmbeddedRuntime>,
    value: Value,
    id: HandleId,
    root: RootId,
    live: Option<Arc<AtomicBool>>,
}

impl PinnedHandle {
    /// Pins `value`. Fails for non-handle values and dead handles.
    pub fn pin(runtime: &Arc<dyn EmbeddedRuntime>, value: Value) -> Result<Self> {
        let id = value.as_handle().ok_or_else(|| {
            RuntimeError::bad_arguments("pin", format!("cannot pin a {}", value.kind()))
        })?;
        let root = runtime.register_root(&value)?;
        Ok(Self::adopt(runtime, value, id, root))
    }

    /// Takes ownership of a root the runtime already registered for `value`.
    pub(crate) fn adopt(
        runtime: &Arc<dyn EmbeddedRuntime>,
        value: Value,
        id: HandleId,
        root: RootId,
    ) -> Self {
        tracing::trace!(handle = %id, runtime = runtime.name(), "Pinned runtime handle");
        Self {
            runtime: Arc::clone(runtime),
            live: runtime.liveness(&value),
            value,
            id,
            root,
        }
    }

    pub fn id(&self) -> HandleId {
        self.id
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn is_live(&self) -> bool {
        match &self.live {
            Some(flag) => flag.load(Ordering::Acquire),
            None => self.runtime.is_live(&self.value),
        }
    }
}

impl fmt::Debug for PinnedHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinnedHandle")
            .field("id", &self.id)
            .field("root", &self.root)
            .finish()
    }
}

impl Drop for PinnedHandle {
    fn drop(&mut self) {
        if !self.runtime.remove_root(self.root) {
            tracing::warn!(handle = %self.id, "Runtime root was already removed");
        }
        tracing::trace!(handle = %self.id, "Unpinned runtime handle");
    }
}
