//! Error types for the runtime boundary

use std::path::PathBuf;
use thiserror::Error;

use crate::entry_points::EntryPoint;
use crate::value::{Callable, HandleId};

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Entry point `{0}` is not registered in the embedded runtime")]
    Unresolved(EntryPoint),

    #[error("Runtime handle {0} is not live")]
    DeadHandle(HandleId),

    #[error("Entry point `{entry_point}` returned no handle")]
    NoHandle { entry_point: EntryPoint },

    #[error("Runtime raised: {0}")]
    Raised(String),

    #[error("Bad arguments for `{name}`: {reason}")]
    BadArguments { name: String, reason: String },

    #[error("Unknown callable {0:?}")]
    UnknownCallable(Callable),

    #[error("Runtime busy, `{0}` skipped")]
    Busy(EntryPoint),

    #[error("Runtime startup failed: {0}")]
    Startup(String),

    #[error("Failed to load runtime library {path}\n  Reason: {reason}")]
    LibraryLoad { path: PathBuf, reason: String },
}

impl RuntimeError {
    /// Error raised by control logic inside the runtime.
    pub fn raised(message: impl Into<String>) -> Self {
        RuntimeError::Raised(message.into())
    }

    pub fn bad_arguments(name: impl Into<String>, reason: impl Into<String>) -> Self {
        RuntimeError::BadArguments {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Whether this only reports a missing entry point.
    pub fn is_unresolved(&self) -> bool {
        matches!(self, RuntimeError::Unresolved(_))
    }
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
