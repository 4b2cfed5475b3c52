//! onyxia-userconfigs - user configuration sync for Onyxia
//!
//! Mirrors a logged-in user's configuration values (git identity, tokens,
//! UI preferences) from a path-addressed secret store into memory, and
//! provides a headless dual-handle range slider.

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod secret;
pub mod ui;
pub mod userconfigs;
pub mod utils;

// Re-export commonly used types
pub use error::{Result, UserConfigsError};
pub use userconfigs::{
    get_config_key_path, UserConfig, UserConfigKey, UserConfigs, UserConfigsManager,
};
