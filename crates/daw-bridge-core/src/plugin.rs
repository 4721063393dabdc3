//! Plugin instance contract and the bridged implementation.
//!
//! Threading follows the host protocol: `init`, `destroy`, `activate` and
//! `deactivate` arrive on the main thread; `start_processing`,
//! `stop_processing`, `reset` and `process` arrive on the audio thread. The
//! host serializes transitions per instance. On the audio thread this side
//! only uses atomics and `try_lock`: the lifecycle state is atomic, the handle
//! slot is never waited on, and the handle's liveness is checked lock-free
//! when the runtime offers a flag. Whatever the runtime does inside its
//! `process` call is bounded by the runtime (see `EmbeddedRuntime`).
//! A tick that would have to wait is skipped and counted instead.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use daw_bridge_runtime::{PinnedHandle, RuntimeBridge, RuntimeError};
use parking_lot::Mutex;

use crate::descriptor::PluginDescriptor;
use crate::error::{PluginError, Result};
use crate::lifecycle::{AtomicLifecycle, LifecycleState, Transition};

/// Non-owning back-reference to the hosting environment.
///
/// Used to query host services; never keeps the host alive.
pub trait HostHandle: Send + Sync {
    fn name(&self) -> Option<String> {
        None
    }
}

impl HostHandle for () {}

/// Arguments of the last successful activation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivationConfig {
    pub sample_rate: f64,
    pub min_frames: u32,
    pub max_frames: u32,
}

impl ActivationConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(PluginError::InvalidActivation(format!(
                "sample rate {} must be positive",
                self.sample_rate
            )));
        }
        if self.max_frames == 0 || self.min_frames > self.max_frames {
            return Err(PluginError::InvalidActivation(format!(
                "block size range {}..={} is empty",
                self.min_frames, self.max_frames
            )));
        }
        Ok(())
    }
}

/// Capability contract every plugin kind implements.
pub trait Plugin: Send + Sync {
    fn descriptor(&self) -> &PluginDescriptor;

    fn state(&self) -> LifecycleState;

    /// Binds the runtime-side plugin value. `Created` only.
    fn init(&self) -> Result<()>;

    /// Releases everything. Legal from any state; later calls do nothing.
    fn destroy(&self);

    fn activate(&self, sample_rate: f64, min_frames: u32, max_frames: u32) -> Result<()>;

    /// Best effort; a missing runtime entry point is not an error.
    fn deactivate(&self) -> Result<()>;

    fn start_processing(&self) -> Result<()>;

    fn stop_processing(&self) -> Result<()>;

    fn reset(&self) -> Result<()>;

    /// One processing tick. RT-safe.
    fn process(&self) -> Result<()>;

    /// Follow-up work requested from the audio thread via the host.
    fn on_main_thread(&self) {}
}

/// Plugin whose behavior lives in the embedded runtime.
pub struct BridgedPlugin<H: HostHandle> {
    descriptor: Arc<PluginDescriptor>,
    bridge: Arc<RuntimeBridge>,
    host: H,
    state: AtomicLifecycle,
    handle: Mutex<Option<PinnedHandle>>,
    activation: Mutex<Option<ActivationConfig>>,
    processed_blocks: AtomicU64,
    process_errors: AtomicU64,
    skipped_blocks: AtomicU64,
}

impl<H: HostHandle> BridgedPlugin<H> {
    pub fn new(descriptor: Arc<PluginDescriptor>, bridge: Arc<RuntimeBridge>, host: H) -> Self {
        Self {
            descriptor,
            bridge,
            host,
            state: AtomicLifecycle::new(LifecycleState::Created),
            handle: Mutex::new(None),
            activation: Mutex::new(None),
            processed_blocks: AtomicU64::new(0),
            process_errors: AtomicU64::new(0),
            skipped_blocks: AtomicU64::new(0),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn activation(&self) -> Option<ActivationConfig> {
        *self.activation.lock()
    }

    pub fn has_handle(&self) -> bool {
        self.handle.lock().is_some()
    }

    /// Ticks forwarded to the runtime.
    pub fn processed_blocks(&self) -> u64 {
        self.processed_blocks.load(Ordering::Relaxed)
    }

    /// Ticks the runtime failed.
    pub fn process_errors(&self) -> u64 {
        self.process_errors.load(Ordering::Relaxed)
    }

    /// Ticks dropped because the handle slot was busy.
    pub fn skipped_blocks(&self) -> u64 {
        self.skipped_blocks.load(Ordering::Relaxed)
    }

    fn check(&self, transition: Transition) -> Result<(LifecycleState, LifecycleState)> {
        let state = self.state.get();
        state
            .next(transition)
            .map(|next| (state, next))
            .ok_or(PluginError::InvalidTransition { transition, state })
    }

    fn release(&self) {
        let previous = self.state.swap(LifecycleState::Destroyed);
        if previous == LifecycleState::Destroyed {
            tracing::trace!(plugin = %self.descriptor.id, "Already destroyed");
            return;
        }

        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            let id = handle.id();
            match self.bridge.destroy(handle) {
                Ok(()) => {}
                Err(e) if e.is_unresolved() => tracing::debug!(
                    plugin = %self.descriptor.id,
                    handle = %id,
                    "No destroy entry point; handle unpinned"
                ),
                Err(e) => tracing::warn!(
                    plugin = %self.descriptor.id,
                    handle = %id,
                    "Runtime destroy failed: {}",
                    e
                ),
            }
        }
        tracing::debug!(plugin = %self.descriptor.id, from = %previous, "Plugin destroyed");
    }
}

impl<H: HostHandle> Plugin for BridgedPlugin<H> {
    fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    fn state(&self) -> LifecycleState {
        self.state.get()
    }

    fn init(&self) -> Result<()> {
        let (_, next) = self.check(Transition::Init)?;

        let mut slot = self.handle.lock();
        if slot.is_some() {
            return Err(PluginError::HandleAlreadyBound);
        }

        let handle = self.bridge.init().inspect_err(|e| {
            tracing::warn!(plugin = %self.descriptor.id, "Runtime init failed: {}", e);
        })?;
        tracing::info!(
            plugin = %self.descriptor.id,
            handle = %handle.id(),
            host = self.host.name().as_deref().unwrap_or("unknown"),
            runtime = self.bridge.runtime().name(),
            "Plugin initialized"
        );
        *slot = Some(handle);
        self.state.set(next);
        Ok(())
    }

    fn destroy(&self) {
        self.release();
    }

    fn activate(&self, sample_rate: f64, min_frames: u32, max_frames: u32) -> Result<()> {
        let (_, next) = self.check(Transition::Activate)?;
        let config = ActivationConfig {
            sample_rate,
            min_frames,
            max_frames,
        };
        config.validate()?;

        let slot = self.handle.lock();
        let handle = slot.as_ref().ok_or(PluginError::HandleNotBound)?;
        self.bridge
            .activate(handle, sample_rate, max_frames)
            .inspect_err(|e| {
                tracing::warn!(plugin = %self.descriptor.id, "Activation failed: {}", e)
            })?;

        *self.activation.lock() = Some(config);
        self.state.set(next);
        tracing::debug!(
            plugin = %self.descriptor.id,
            sample_rate,
            min_frames,
            max_frames,
            "Plugin activated"
        );
        Ok(())
    }

    fn deactivate(&self) -> Result<()> {
        let (_, next) = self.check(Transition::Deactivate)?;

        if let Some(handle) = self.handle.lock().as_ref() {
            match self.bridge.deactivate(handle) {
                Ok(()) => {}
                Err(e) if e.is_unresolved() => {
                    tracing::debug!(plugin = %self.descriptor.id, "No deactivate entry point")
                }
                Err(e) => tracing::warn!(
                    plugin = %self.descriptor.id,
                    "Runtime deactivate failed: {}",
                    e
                ),
            }
        }

        self.state.set(next);
        tracing::debug!(plugin = %self.descriptor.id, "Plugin deactivated");
        Ok(())
    }

    fn start_processing(&self) -> Result<()> {
        let (_, next) = self.check(Transition::StartProcessing)?;
        self.state.set(next);
        Ok(())
    }

    fn stop_processing(&self) -> Result<()> {
        let (_, next) = self.check(Transition::StopProcessing)?;
        self.state.set(next);
        Ok(())
    }

    fn reset(&self) -> Result<()> {
        self.check(Transition::Reset).map(|_| ())
    }

    fn process(&self) -> Result<()> {
        self.check(Transition::Process)?;

        let Some(slot) = self.handle.try_lock() else {
            self.skipped_blocks.fetch_add(1, Ordering::Relaxed);
            return Err(PluginError::Busy);
        };
        let handle = slot.as_ref().ok_or(PluginError::HandleNotBound)?;

        match self.bridge.process(handle) {
            Ok(()) => {
                self.processed_blocks.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(RuntimeError::Unresolved(_)) => Ok(()),
            Err(RuntimeError::Busy(_)) => {
                self.skipped_blocks.fetch_add(1, Ordering::Relaxed);
                Err(PluginError::Busy)
            }
            Err(e) => {
                self.process_errors.fetch_add(1, Ordering::Relaxed);
                Err(e.into())
            }
        }
    }
}

impl<H: HostHandle> Drop for BridgedPlugin<H> {
    fn drop(&mut self) {
        self.release();
    }
}
