//! Error types for plugin lifecycle and factory operations

use daw_bridge_runtime::RuntimeError;
use thiserror::Error;

use crate::lifecycle::{LifecycleState, Transition};

#[derive(Error, Debug)]
pub enum PluginError {
    #[error("Cannot {transition} while {state}")]
    InvalidTransition {
        transition: Transition,
        state: LifecycleState,
    },

    #[error("Unknown plugin id: {0}")]
    UnknownPlugin(String),

    #[error("Invalid descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("Runtime handle already bound to this instance")]
    HandleAlreadyBound,

    #[error("No runtime handle bound to this instance")]
    HandleNotBound,

    #[error("Invalid activation: {0}")]
    InvalidActivation(String),

    #[error("Instance busy on another thread")]
    Busy,

    #[error("Runtime: {0}")]
    Runtime(#[from] RuntimeError),
}

pub type Result<T> = std::result::Result<T, PluginError>;
