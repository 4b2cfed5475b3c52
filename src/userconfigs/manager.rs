//! User configuration synchronization
//!
//! `UserConfigsManager` owns the configuration slice of one session. It
//! loads every key from the secret store on initialization, repairing
//! missing or legacy entries with defaults, and applies changes optimistically
//! before writing them back.

use futures::future::try_join_all;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use super::keys::{get_config_key_path, ProfileDefaults, UserConfig, UserConfigKey, UserConfigs};
use super::state::{SyncStatus, UserConfigsAction, UserConfigsSlice, UserConfigsState};
use crate::auth::{SessionProvider, User};
use crate::error::{Result, UserConfigsError};
use crate::secret::{Secret, SecretStore};
use crate::utils::helpers::generate_random_password;

/// Outcome of a successful initialization
#[derive(Debug, Clone, PartialEq)]
pub struct InitializationReport {
    /// Keys whose remote entry was missing or legacy and got the default written
    pub repaired: Vec<UserConfigKey>,
}

/// Where the local value of a key came from during initialization
enum Resolution {
    Adopted(UserConfig),
    Repaired(UserConfig),
}

pub struct UserConfigsManager {
    secret_store: Arc<dyn SecretStore>,
    session: Arc<dyn SessionProvider>,
    profile_defaults: ProfileDefaults,
    slice: watch::Sender<UserConfigsSlice>,
    initializing: Mutex<()>,
}

impl UserConfigsManager {
    pub fn new(
        secret_store: Arc<dyn SecretStore>,
        session: Arc<dyn SessionProvider>,
        profile_defaults: ProfileDefaults,
    ) -> Self {
        let (slice, _) = watch::channel(UserConfigsSlice::Uninitialized);
        Self {
            secret_store,
            session,
            profile_defaults,
            slice,
            initializing: Mutex::new(()),
        }
    }

    /// Snapshot of the current state, or `NotInitialized`
    pub fn state(&self) -> Result<UserConfigsState> {
        self.slice.borrow().state().cloned()
    }

    /// Current plain values, or `NotInitialized`
    pub fn values(&self) -> Result<UserConfigs> {
        Ok(self.slice.borrow().state()?.values().clone())
    }

    pub fn is_initialized(&self) -> bool {
        self.slice.borrow().is_initialized()
    }

    /// Observe every transition of the slice
    pub fn subscribe(&self) -> watch::Receiver<UserConfigsSlice> {
        self.slice.subscribe()
    }

    /// Apply an action to the slice and notify subscribers when it succeeds
    pub fn dispatch(&self, action: UserConfigsAction) -> Result<()> {
        let mut outcome = Ok(());
        self.slice.send_if_modified(|slice| match slice.reduce(action) {
            Ok(()) => true,
            Err(e) => {
                outcome = Err(e);
                false
            }
        });
        outcome
    }

    fn current_user(&self) -> Result<User> {
        if !self.session.is_user_logged_in() {
            return Err(UserConfigsError::NotLoggedIn);
        }
        self.session.get_user()
    }

    /// Load every key from the secret store, writing defaults where needed
    pub async fn initialize(&self) -> Result<InitializationReport> {
        let user = self.current_user()?;

        // Held until the slice is committed; a concurrent call waits and then
        // sees the outcome of this one
        let _initializing = self.initializing.lock().await;
        if self.is_initialized() {
            return Err(UserConfigsError::AlreadyInitialized);
        }

        let mut user_configs = UserConfigs::defaults(&user, &self.profile_defaults);

        let resolutions = try_join_all(
            UserConfigKey::ALL
                .into_iter()
                .map(|key| self.resolve_key(&user.username, user_configs.get(key))),
        )
        .await?;

        let mut repaired = Vec::new();
        for resolution in resolutions {
            match resolution {
                Resolution::Adopted(value) => user_configs.set(value),
                Resolution::Repaired(value) => {
                    repaired.push(value.key());
                    user_configs.set(value);
                }
            }
        }

        info!(
            "Initialized user configurations for '{}' ({} repaired)",
            user.username,
            repaired.len()
        );
        self.dispatch(UserConfigsAction::InitializationCompleted { user_configs })?;

        Ok(InitializationReport { repaired })
    }

    async fn resolve_key(&self, username: &str, default: UserConfig) -> Result<Resolution> {
        let key = default.key();
        let path = get_config_key_path(username, key);

        let stored = match self.secret_store.get(&path).await {
            Ok(secret) => secret.map(|secret| secret.value),
            Err(e) => {
                debug!("Fetching '{}' failed, treating it as absent: {}", path, e);
                None
            }
        };

        if let Some(value) = stored {
            if key.is_legacy_value(&value) {
                debug!("Stored value of '{}' is legacy", key);
            } else {
                match UserConfig::from_json(key, value) {
                    Ok(config) => {
                        debug!("Adopted stored value of '{}'", key);
                        return Ok(Resolution::Adopted(config));
                    }
                    Err(e) => warn!("Discarding stored value of '{}': {}", key, e),
                }
            }
        }

        info!("Writing default value of '{}' to '{}'", key, path);
        self.secret_store
            .put(&path, Secret::new(default.to_json()))
            .await?;

        Ok(Resolution::Repaired(default))
    }

    /// Change one value locally, then persist it
    ///
    /// The local value stays in place when the write fails; the field is
    /// marked `Failed` and the error is returned. Requesting the value a field
    /// already holds does nothing unless its last write failed.
    pub async fn change_value(&self, change: UserConfig) -> Result<()> {
        let user = self.current_user()?;
        let key = change.key();

        {
            let slice = self.slice.borrow();
            let state = slice.state()?;
            let unchanged = state.value(key) == change;
            let failed = matches!(state.status(key), SyncStatus::Failed { .. });
            if unchanged && !failed {
                debug!("'{}' already holds the requested value", key);
                return Ok(());
            }
        }

        let secret = Secret::new(change.to_json());
        self.dispatch(UserConfigsAction::ChangeStarted { change })?;

        let path = get_config_key_path(&user.username, key);
        match self.secret_store.put(&path, secret).await {
            Ok(()) => {
                info!("Saved '{}'", key);
                self.dispatch(UserConfigsAction::ChangeCompleted { key })
            }
            Err(e) => {
                warn!("Saving '{}' failed: {}", key, e);
                self.dispatch(UserConfigsAction::ChangeFailed {
                    key,
                    error: e.to_string(),
                })?;
                Err(e)
            }
        }
    }

    /// Replace the service password with a freshly generated one
    pub async fn renew_user_service_password(&self) -> Result<()> {
        self.change_value(UserConfig::UserServicePassword(generate_random_password()))
            .await
    }

    /// Show the "my secrets" usage dialog again
    pub async fn restore_display_of_dialog(&self) -> Result<()> {
        self.change_value(UserConfig::DoDisplayMySecretsUseInServiceDialog(true))
            .await
    }
}
