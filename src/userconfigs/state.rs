//! In-memory state of the user configurations and its reducer

use serde::Serialize;

use super::keys::{UserConfig, UserConfigKey, UserConfigs};
use crate::error::{Result, UserConfigsError};

/// Sync status of one field relative to the secret store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum SyncStatus {
    Synced,
    Writing,
    Failed { error: String },
}

impl SyncStatus {
    /// True between issuing a write and receiving its outcome
    pub fn is_being_changed(&self) -> bool {
        matches!(self, SyncStatus::Writing)
    }
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncStatus::Synced => write!(f, "synced"),
            SyncStatus::Writing => write!(f, "writing"),
            SyncStatus::Failed { error } => write!(f, "failed: {}", error),
        }
    }
}

/// Value and status of a single field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldState {
    pub value: UserConfig,
    pub status: SyncStatus,
}

impl FieldState {
    pub fn is_being_changed(&self) -> bool {
        self.status.is_being_changed()
    }
}

/// Every field's value together with its sync status
#[derive(Debug, Clone, PartialEq)]
pub struct UserConfigsState {
    values: UserConfigs,
    statuses: [SyncStatus; UserConfigKey::COUNT],
}

impl UserConfigsState {
    fn synced(values: UserConfigs) -> Self {
        Self {
            values,
            statuses: std::array::from_fn(|_| SyncStatus::Synced),
        }
    }

    pub fn values(&self) -> &UserConfigs {
        &self.values
    }

    pub fn value(&self, key: UserConfigKey) -> UserConfig {
        self.values.get(key)
    }

    pub fn status(&self, key: UserConfigKey) -> &SyncStatus {
        &self.statuses[key.index()]
    }

    pub fn is_being_changed(&self, key: UserConfigKey) -> bool {
        self.status(key).is_being_changed()
    }

    pub fn field(&self, key: UserConfigKey) -> FieldState {
        FieldState {
            value: self.value(key),
            status: self.status(key).clone(),
        }
    }

    /// Keys with a write currently in flight
    pub fn keys_being_changed(&self) -> Vec<UserConfigKey> {
        UserConfigKey::ALL
            .into_iter()
            .filter(|key| self.is_being_changed(*key))
            .collect()
    }

    fn set_status(&mut self, key: UserConfigKey, status: SyncStatus) {
        self.statuses[key.index()] = status;
    }
}

/// Transitions of the configuration slice
#[derive(Debug, Clone, PartialEq)]
pub enum UserConfigsAction {
    InitializationCompleted { user_configs: UserConfigs },
    ChangeStarted { change: UserConfig },
    ChangeCompleted { key: UserConfigKey },
    ChangeFailed { key: UserConfigKey, error: String },
}

/// The configuration slice: unusable until initialization completes
#[derive(Debug, Clone, Default, PartialEq)]
pub enum UserConfigsSlice {
    #[default]
    Uninitialized,
    Ready(UserConfigsState),
}

impl UserConfigsSlice {
    pub fn is_initialized(&self) -> bool {
        matches!(self, UserConfigsSlice::Ready(_))
    }

    pub fn state(&self) -> Result<&UserConfigsState> {
        match self {
            UserConfigsSlice::Ready(state) => Ok(state),
            UserConfigsSlice::Uninitialized => Err(UserConfigsError::NotInitialized),
        }
    }

    fn state_mut(&mut self) -> Result<&mut UserConfigsState> {
        match self {
            UserConfigsSlice::Ready(state) => Ok(state),
            UserConfigsSlice::Uninitialized => Err(UserConfigsError::NotInitialized),
        }
    }

    /// Apply one action; the slice is left untouched when this returns an error
    pub fn reduce(&mut self, action: UserConfigsAction) -> Result<()> {
        match action {
            UserConfigsAction::InitializationCompleted { user_configs } => {
                *self = UserConfigsSlice::Ready(UserConfigsState::synced(user_configs));
            }
            UserConfigsAction::ChangeStarted { change } => {
                let state = self.state_mut()?;
                let key = change.key();
                state.values.set(change);
                state.set_status(key, SyncStatus::Writing);
            }
            UserConfigsAction::ChangeCompleted { key } => {
                self.state_mut()?.set_status(key, SyncStatus::Synced);
            }
            UserConfigsAction::ChangeFailed { key, error } => {
                self.state_mut()?
                    .set_status(key, SyncStatus::Failed { error });
            }
        }
        Ok(())
    }
}
