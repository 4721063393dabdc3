//! Centralized error type for the daw-bridge plugin crate.
//!
//! Wraps the runtime and plugin errors so `?` propagates across crate
//! boundaries. Nothing here crosses the C ABI; the CLAP shim maps every
//! result to a bool, a null pointer or a status code.

use std::ffi::NulError;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Plugin: {0}")]
    Plugin(#[from] daw_bridge_core::PluginError),

    #[error("Runtime: {0}")]
    Runtime(#[from] daw_bridge_runtime::RuntimeError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Config parse: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("String contains a NUL byte: {0}")]
    InvalidString(#[from] NulError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
