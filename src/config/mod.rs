//! Configuration management module
//!
//! This module handles loading, validating and persisting the local
//! settings (secret backend, session identity, profile defaults) from
//! configuration files, environment variables and default values.

pub mod settings;

pub use settings::*;
