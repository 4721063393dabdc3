//! Integration test modules for daw-bridge

pub mod clap_abi;
pub mod lifecycle;
