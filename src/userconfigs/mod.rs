//! User configurations module
//!
//! This module holds the typed configuration record of a user, the
//! in-memory slice mirroring it, and the manager keeping that slice in sync
//! with the secret store.

pub mod keys;
pub mod manager;
pub mod state;

pub use keys::{get_config_key_path, ProfileDefaults, UserConfig, UserConfigKey, UserConfigs};
pub use manager::{InitializationReport, UserConfigsManager};
pub use state::{FieldState, SyncStatus, UserConfigsAction, UserConfigsSlice, UserConfigsState};
