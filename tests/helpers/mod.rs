//! Test helpers and fixtures for daw-bridge integration tests
//!
//! Control logic is a small program on the managed runtime that counts
//! process ticks per session, so tests can observe what reached the runtime.

#![allow(dead_code)]

use std::sync::Arc;

use daw_bridge::{ManagedRuntime, RuntimeError, Value};
use daw_bridge_core::{DescriptorRegistry, PluginDescriptor, PluginFactory};
use daw_bridge_runtime::RuntimeBridge;

/// Default test sample rate (matches common hardware)
pub const TEST_SAMPLE_RATE: f64 = 48000.0;

pub const TEST_MIN_FRAMES: u32 = 64;

pub const TEST_MAX_FRAMES: u32 = 512;

/// Runtime-side plugin state.
#[derive(Debug, Default)]
pub struct Session {
    pub sample_rate: f64,
    pub max_frames: i64,
    pub active: bool,
    pub ticks: u64,
}

fn session<'a>(
    heap: &'a mut daw_bridge::Heap,
    args: &[Value],
) -> Result<&'a mut Session, RuntimeError> {
    let target = args.first().copied().unwrap_or_default();
    heap.get_mut::<Session>(&target)
        .ok_or_else(|| RuntimeError::raised("argument is not a session"))
}

/// Registers all five entry points.
pub fn control_program(runtime: &ManagedRuntime) {
    runtime.register("daw_bridge_init", |heap, _| Ok(heap.alloc(Session::default())));
    runtime.register("daw_bridge_destroy", |heap, args| {
        let target = args.first().copied().unwrap_or_default();
        heap.free(&target);
        Ok(Value::Unit)
    });
    runtime.register("daw_bridge_activate", |heap, args| {
        let sample_rate = args.get(1).and_then(Value::as_float).unwrap_or_default();
        let max_frames = args.get(2).and_then(Value::as_int).unwrap_or_default();
        let session = session(heap, args)?;
        session.sample_rate = sample_rate;
        session.max_frames = max_frames;
        session.active = true;
        Ok(Value::Unit)
    });
    runtime.register("daw_bridge_deactivate", |heap, args| {
        session(heap, args)?.active = false;
        Ok(Value::Unit)
    });
    runtime.register("daw_bridge_process", |heap, args| {
        session(heap, args)?.ticks += 1;
        Ok(Value::Unit)
    });
}

pub fn test_runtime() -> Arc<ManagedRuntime> {
    Arc::new(ManagedRuntime::startup("daw-bridge-test", &[control_program]))
}

/// Factory over the default descriptor, backed by `runtime`.
pub fn test_factory(runtime: &Arc<ManagedRuntime>) -> PluginFactory {
    let registry = DescriptorRegistry::single(PluginDescriptor::default())
        .expect("default descriptor is valid");
    let bridge = RuntimeBridge::new(runtime.clone());
    PluginFactory::new(Arc::new(registry), Arc::new(bridge))
}

/// Snapshot of every session on the heap.
pub fn sessions(runtime: &ManagedRuntime) -> Vec<(f64, i64, bool, u64)> {
    runtime.with_heap(|heap| {
        (1..=64u64)
            .filter_map(|id| {
                let value = Value::Handle(daw_bridge_runtime::HandleId(id));
                heap.get::<Session>(&value)
                    .map(|s| (s.sample_rate, s.max_frames, s.active, s.ticks))
            })
            .collect()
    })
}
