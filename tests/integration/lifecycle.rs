//! Plugin lifecycle integration tests
//!
//! Drives instances from the factory through every transition and checks
//! what reached the runtime and how many handles stay rooted.

use daw_bridge::{EmbeddedRuntime, LifecycleState, PluginError};
use daw_bridge_core::{Transition, DEFAULT_PLUGIN_ID};
use proptest::prelude::*;

use crate::helpers::*;

#[test]
fn test_full_lifecycle() {
    let runtime = test_runtime();
    let factory = test_factory(&runtime);

    let plugin = factory.create((), DEFAULT_PLUGIN_ID).unwrap();
    assert_eq!(plugin.state(), LifecycleState::Created);
    assert_eq!(runtime.root_count(), 0);

    plugin.init().unwrap();
    assert_eq!(runtime.root_count(), 1);

    plugin.activate(TEST_SAMPLE_RATE, TEST_MIN_FRAMES, TEST_MAX_FRAMES).unwrap();
    plugin.start_processing().unwrap();
    for _ in 0..100 {
        plugin.process().unwrap();
    }
    plugin.stop_processing().unwrap();

    assert_eq!(sessions(&runtime), vec![(TEST_SAMPLE_RATE, TEST_MAX_FRAMES as i64, true, 100)]);

    plugin.deactivate().unwrap();
    assert!(!sessions(&runtime)[0].2);

    plugin.destroy();
    assert_eq!(plugin.state(), LifecycleState::Destroyed);
    assert_eq!(runtime.root_count(), 0);
    assert!(sessions(&runtime).is_empty());
}

#[test]
fn test_unknown_plugin_id() {
    let runtime = test_runtime();
    let factory = test_factory(&runtime);

    assert!(matches!(
        factory.create((), "com.example.unknown"),
        Err(PluginError::UnknownPlugin(_))
    ));
    assert_eq!(runtime.heap_len(), 0);
}

#[test]
fn test_descriptor_enumeration() {
    let runtime = test_runtime();
    let factory = test_factory(&runtime);

    assert_eq!(factory.plugin_count(), 1);
    assert_eq!(factory.descriptor_at(0).unwrap().id, DEFAULT_PLUGIN_ID);
    assert!(factory.descriptor_at(1).is_none());
}

#[test]
fn test_reactivation_with_new_rate() {
    let runtime = test_runtime();
    let factory = test_factory(&runtime);
    let plugin = factory.create((), DEFAULT_PLUGIN_ID).unwrap();
    plugin.init().unwrap();

    plugin.activate(44100.0, 32, 256).unwrap();
    assert!(matches!(
        plugin.activate(TEST_SAMPLE_RATE, TEST_MIN_FRAMES, TEST_MAX_FRAMES),
        Err(PluginError::InvalidTransition { .. })
    ));
    assert_eq!(sessions(&runtime)[0].0, 44100.0);

    plugin.deactivate().unwrap();
    plugin.activate(TEST_SAMPLE_RATE, TEST_MIN_FRAMES, TEST_MAX_FRAMES).unwrap();
    assert_eq!(sessions(&runtime)[0].0, TEST_SAMPLE_RATE);
    assert_eq!(runtime.root_count(), 1);
}

#[test]
fn test_double_destroy() {
    let runtime = test_runtime();
    let factory = test_factory(&runtime);
    let plugin = factory.create((), DEFAULT_PLUGIN_ID).unwrap();
    plugin.init().unwrap();

    plugin.destroy();
    plugin.destroy();
    assert_eq!(runtime.root_count(), 0);
    drop(plugin);
    assert_eq!(runtime.root_count(), 0);
}

#[test]
fn test_instances_do_not_share_sessions() {
    let runtime = test_runtime();
    let factory = test_factory(&runtime);
    let a = factory.create((), DEFAULT_PLUGIN_ID).unwrap();
    let b = factory.create((), DEFAULT_PLUGIN_ID).unwrap();

    for plugin in [&a, &b] {
        plugin.init().unwrap();
        plugin.activate(TEST_SAMPLE_RATE, TEST_MIN_FRAMES, TEST_MAX_FRAMES).unwrap();
        plugin.start_processing().unwrap();
    }
    for _ in 0..3 {
        a.process().unwrap();
    }
    b.process().unwrap();

    let mut ticks: Vec<u64> = sessions(&runtime).iter().map(|s| s.3).collect();
    ticks.sort_unstable();
    assert_eq!(ticks, [1, 3]);
    assert_eq!(runtime.root_count(), 2);
}

#[test]
fn test_unrooted_sessions_survive_collection() {
    let runtime = test_runtime();
    let factory = test_factory(&runtime);
    let plugin = factory.create((), DEFAULT_PLUGIN_ID).unwrap();
    plugin.init().unwrap();

    assert_eq!(runtime.collect(), 0);
    plugin.activate(TEST_SAMPLE_RATE, TEST_MIN_FRAMES, TEST_MAX_FRAMES).unwrap();
    assert_eq!(sessions(&runtime).len(), 1);
}

fn any_transition() -> impl Strategy<Value = Transition> {
    proptest::sample::select(Transition::ALL.to_vec())
}

proptest! {
    #[test]
    fn prop_roots_track_instance(
        transitions in proptest::collection::vec(any_transition(), 0..48)
    ) {
        let runtime = test_runtime();
        let factory = test_factory(&runtime);
        let plugin = factory.create((), DEFAULT_PLUGIN_ID).unwrap();

        for transition in transitions {
            let before = plugin.state();
            let result = match transition {
                Transition::Init => plugin.init(),
                Transition::Activate => {
                    plugin.activate(TEST_SAMPLE_RATE, TEST_MIN_FRAMES, TEST_MAX_FRAMES)
                }
                Transition::Deactivate => plugin.deactivate(),
                Transition::StartProcessing => plugin.start_processing(),
                Transition::StopProcessing => plugin.stop_processing(),
                Transition::Reset => plugin.reset(),
                Transition::Process => plugin.process(),
                Transition::Destroy => {
                    plugin.destroy();
                    Ok(())
                }
            };

            prop_assert_eq!(result.is_ok(), before.next(transition).is_some());
            if let Some(expected) = before.next(transition) {
                prop_assert_eq!(plugin.state(), expected);
            } else {
                prop_assert_eq!(plugin.state(), before);
            }

            prop_assert!(runtime.root_count() <= 1);
            if plugin.state() == LifecycleState::Destroyed {
                prop_assert_eq!(runtime.root_count(), 0);
            }
        }

        drop(plugin);
        prop_assert_eq!(runtime.root_count(), 0);
    }
}
