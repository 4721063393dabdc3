//! Plugin instance lifecycle.
//!
//! ```text
//! Created --init--> Initialized --activate--> Activated <--start/stop processing--> Processing
//!                                                 |
//!                   Deactivated <---deactivate----+
//!                        |
//!                        +--activate--> Activated
//!
//! any --destroy--> Destroyed
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum LifecycleState {
    #[default]
    Created = 0,
    Initialized = 1,
    Activated = 2,
    Processing = 3,
    Deactivated = 4,
    Destroyed = 5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    Init,
    Activate,
    Deactivate,
    StartProcessing,
    StopProcessing,
    Reset,
    Process,
    Destroy,
}

impl Transition {
    pub const ALL: [Transition; 8] = [
        Transition::Init,
        Transition::Activate,
        Transition::Deactivate,
        Transition::StartProcessing,
        Transition::StopProcessing,
        Transition::Reset,
        Transition::Process,
        Transition::Destroy,
    ];
}

impl LifecycleState {
    /// State after `transition`, or `None` if it is not legal from `self`.
    pub fn next(self, transition: Transition) -> Option<LifecycleState> {
        use LifecycleState::*;

        match (self, transition) {
            (_, Transition::Destroy) => Some(Destroyed),
            (Created, Transition::Init) => Some(Initialized),
            (Initialized | Deactivated, Transition::Activate) => Some(Activated),
            (Activated, Transition::Deactivate) => Some(Deactivated),
            (Activated, Transition::StartProcessing) => Some(Processing),
            (Processing, Transition::StopProcessing) => Some(Activated),
            (Processing, Transition::Process) => Some(Processing),
            (Activated | Processing, Transition::Reset) => Some(self),
            _ => None,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => LifecycleState::Created,
            1 => LifecycleState::Initialized,
            2 => LifecycleState::Activated,
            3 => LifecycleState::Processing,
            4 => LifecycleState::Deactivated,
            _ => LifecycleState::Destroyed,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Created => write!(f, "created"),
            LifecycleState::Initialized => write!(f, "initialized"),
            LifecycleState::Activated => write!(f, "activated"),
            LifecycleState::Processing => write!(f, "processing"),
            LifecycleState::Deactivated => write!(f, "deactivated"),
            LifecycleState::Destroyed => write!(f, "destroyed"),
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::Init => write!(f, "init"),
            Transition::Activate => write!(f, "activate"),
            Transition::Deactivate => write!(f, "deactivate"),
            Transition::StartProcessing => write!(f, "start processing"),
            Transition::StopProcessing => write!(f, "stop processing"),
            Transition::Reset => write!(f, "reset"),
            Transition::Process => write!(f, "process"),
            Transition::Destroy => write!(f, "destroy"),
        }
    }
}

/// Lifecycle state readable from any thread without locking.
#[derive(Debug, Default)]
pub struct AtomicLifecycle {
    value: AtomicU8,
}

impl AtomicLifecycle {
    pub fn new(state: LifecycleState) -> Self {
        Self {
            value: AtomicU8::new(state as u8),
        }
    }

    #[inline]
    pub fn get(&self) -> LifecycleState {
        LifecycleState::from_u8(self.value.load(Ordering::Acquire))
    }

    #[inline]
    pub fn set(&self, state: LifecycleState) {
        self.value.store(state as u8, Ordering::Release);
    }

    /// Stores `state` and returns the previous one.
    #[inline]
    pub fn swap(&self, state: LifecycleState) -> LifecycleState {
        LifecycleState::from_u8(self.value.swap(state as u8, Ordering::AcqRel))
    }
}
