//! Marshaled calls into the embedded runtime.
//!
//! `RuntimeBridge` is the only code that builds [`Value`]s from native
//! arguments. Callers hand it native types and a [`PinnedHandle`]; it resolves
//! the entry point, confirms the handle is live, and performs the call.

use std::sync::Arc;

use crate::entry_points::{EntryPoint, EntryPointTable};
use crate::error::{Result, RuntimeError};
use crate::pinned::PinnedHandle;
use crate::runtime::EmbeddedRuntime;
use crate::value::{Callable, Value};

pub struct RuntimeBridge {
    runtime: Arc<dyn EmbeddedRuntime>,
    entry_points: EntryPointTable,
}

impl RuntimeBridge {
    pub fn new(runtime: Arc<dyn EmbeddedRuntime>) -> Self {
        Self {
            runtime,
            entry_points: EntryPointTable::new(),
        }
    }

    pub fn runtime(&self) -> &Arc<dyn EmbeddedRuntime> {
        &self.runtime
    }

    /// Whether `entry_point` currently resolves.
    pub fn has_entry_point(&self, entry_point: EntryPoint) -> bool {
        self.resolve(entry_point).is_ok()
    }

    fn resolve(&self, entry_point: EntryPoint) -> Result<Callable> {
        self.entry_points
            .resolve(self.runtime.as_ref(), entry_point)
            .ok_or(RuntimeError::Unresolved(entry_point))
    }

    fn call_with_handle(
        &self,
        entry_point: EntryPoint,
        handle: &PinnedHandle,
        args: &[Value],
    ) -> Result<Value> {
        let callable = self.resolve(entry_point)?;
        if !handle.is_live() {
            return Err(RuntimeError::DeadHandle(handle.id()));
        }
        self.runtime.call(callable, args)
    }

    /// Creates a runtime-side plugin value and pins it.
    ///
    /// The value is rooted in the same runtime step that creates it, so a
    /// collection triggered by another instance cannot free it first.
    pub fn init(&self) -> Result<PinnedHandle> {
        let callable = self.resolve(EntryPoint::Init)?;
        match self.runtime.call_rooted(callable, &[Value::Unit])? {
            (value, Some(root)) => match value.as_handle() {
                Some(id) => Ok(PinnedHandle::adopt(&self.runtime, value, id, root)),
                None => {
                    self.runtime.remove_root(root);
                    Err(RuntimeError::NoHandle {
                        entry_point: EntryPoint::Init,
                    })
                }
            },
            (_, None) => Err(RuntimeError::NoHandle {
                entry_point: EntryPoint::Init,
            }),
        }
    }

    /// Forwards the destroy notice, then unpins `handle`.
    ///
    /// The handle is unpinned on every path, including an unresolved entry
    /// point or an error raised by the runtime.
    pub fn destroy(&self, handle: PinnedHandle) -> Result<()> {
        let result = self
            .call_with_handle(EntryPoint::Destroy, &handle, &[*handle.value()])
            .map(|_| ());
        drop(handle);
        result
    }

    pub fn activate(
        &self,
        handle: &PinnedHandle,
        sample_rate: f64,
        max_frames: u32,
    ) -> Result<()> {
        let args = [*handle.value(), Value::from(sample_rate), Value::from(max_frames)];
        self.call_with_handle(EntryPoint::Activate, handle, &args)
            .map(|_| ())
    }

    pub fn deactivate(&self, handle: &PinnedHandle) -> Result<()> {
        self.call_with_handle(EntryPoint::Deactivate, handle, &[*handle.value()])
            .map(|_| ())
    }

    /// One processing tick. Called from the audio thread.
    pub fn process(&self, handle: &PinnedHandle) -> Result<()> {
        self.call_with_handle(EntryPoint::Process, handle, &[*handle.value()])
            .map(|_| ())
    }
}
