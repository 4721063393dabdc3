//! Named entry points and their lazily filled lookup cache.

use std::fmt;
use std::sync::OnceLock;

use crate::runtime::EmbeddedRuntime;
use crate::value::Callable;

/// The fixed set of entry points the control logic may export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryPoint {
    Init,
    Destroy,
    Activate,
    Deactivate,
    Process,
}

impl EntryPoint {
    pub const ALL: [EntryPoint; 5] = [
        EntryPoint::Init,
        EntryPoint::Destroy,
        EntryPoint::Activate,
        EntryPoint::Deactivate,
        EntryPoint::Process,
    ];

    /// Name the control logic registers the entry point under.
    pub fn name(self) -> &'static str {
        match self {
            EntryPoint::Init => "daw_bridge_init",
            EntryPoint::Destroy => "daw_bridge_destroy",
            EntryPoint::Activate => "daw_bridge_activate",
            EntryPoint::Deactivate => "daw_bridge_deactivate",
            EntryPoint::Process => "daw_bridge_process",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ep| ep.name() == name)
    }

    fn slot(self) -> usize {
        match self {
            EntryPoint::Init => 0,
            EntryPoint::Destroy => 1,
            EntryPoint::Activate => 2,
            EntryPoint::Deactivate => 3,
            EntryPoint::Process => 4,
        }
    }
}

impl fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolution cache for [`EntryPoint`]s.
///
/// A resolved callable is stored once and then read without locking. An
/// absent entry point is not cached: the next lookup asks the runtime again,
/// since control logic may register it later.
#[derive(Debug, Default)]
pub struct EntryPointTable {
    slots: [OnceLock<Callable>; 5],
}

impl EntryPointTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(
        &self,
        runtime: &dyn EmbeddedRuntime,
        entry_point: EntryPoint,
    ) -> Option<Callable> {
        let slot = &self.slots[entry_point.slot()];
        if let Some(callable) = slot.get() {
            return Some(*callable);
        }

        let found = runtime.named_value(entry_point.name())?;
        let callable = *slot.get_or_init(|| found);
        tracing::debug!(entry_point = %entry_point, "Resolved runtime entry point");
        Some(callable)
    }

    /// The cached callable, without asking the runtime.
    pub fn cached(&self, entry_point: EntryPoint) -> Option<Callable> {
        self.slots[entry_point.slot()].get().copied()
    }
}
