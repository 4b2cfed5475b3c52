//! User configuration sync tests
//!
//! Exercises `UserConfigsManager` end to end against in-process secret
//! stores: initialization with repair, optimistic changes and the two
//! convenience operations.

use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio_test::assert_ok;

use onyxia_userconfigs::auth::{StaticSessionProvider, User};
use onyxia_userconfigs::secret::{InMemorySecretStore, Secret, SecretStore};
use onyxia_userconfigs::userconfigs::{ProfileDefaults, SyncStatus};
use onyxia_userconfigs::{
    get_config_key_path, Result, UserConfig, UserConfigKey, UserConfigsError, UserConfigsManager,
};

fn alice_session() -> Arc<StaticSessionProvider> {
    Arc::new(StaticSessionProvider::new(
        User::new("alice", "alice@example.com").unwrap(),
    ))
}

fn stored(store: &InMemorySecretStore, key: UserConfigKey) -> Option<serde_json::Value> {
    store
        .snapshot()
        .unwrap()
        .get(&get_config_key_path("alice", key))
        .map(|secret| secret.value.clone())
}

/// Wraps the in-memory store and counts writes
#[derive(Default)]
struct CountingStore {
    inner: InMemorySecretStore,
    puts: AtomicUsize,
}

#[async_trait]
impl SecretStore for CountingStore {
    async fn get(&self, path: &str) -> Result<Option<Secret>> {
        self.inner.get(path).await
    }

    async fn put(&self, path: &str, secret: Secret) -> Result<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.inner.put(path, secret).await
    }
}

/// Tracks how many reads are in flight at once and counts writes
#[derive(Default)]
struct SlowReadStore {
    inner: InMemorySecretStore,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    puts: AtomicUsize,
}

#[async_trait]
impl SecretStore for SlowReadStore {
    async fn get(&self, path: &str) -> Result<Option<Secret>> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.inner.get(path).await
    }

    async fn put(&self, path: &str, secret: Secret) -> Result<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.inner.put(path, secret).await
    }
}

/// Holds writes until released once `armed` is set
#[derive(Default)]
struct GatedStore {
    inner: InMemorySecretStore,
    armed: AtomicBool,
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl SecretStore for GatedStore {
    async fn get(&self, path: &str) -> Result<Option<Secret>> {
        self.inner.get(path).await
    }

    async fn put(&self, path: &str, secret: Secret) -> Result<()> {
        if self.armed.load(Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        self.inner.put(path, secret).await
    }
}

#[cfg(test)]
mod initialization_tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_store_gets_defaults() {
        let store = Arc::new(InMemorySecretStore::new());
        let manager =
            UserConfigsManager::new(store.clone(), alice_session(), ProfileDefaults::default());

        let report = assert_ok!(manager.initialize().await);
        assert_eq!(report.repaired.len(), UserConfigKey::COUNT);

        let values = manager.values().unwrap();
        assert_eq!(values.git_name, "alice");
        assert_eq!(values.git_email, "alice@example.com");
        assert_eq!(values.git_credential_cache_duration, 0);
        assert!(!values.is_beta_mode_enabled);
        assert!(values.do_display_my_secrets_use_in_service_dialog);
        assert_eq!(values.kaggle_api_token, None);
        assert_eq!(values.user_service_password.len(), 20);

        // Every default is persisted under the user's prefix
        assert_eq!(store.snapshot().unwrap().len(), UserConfigKey::COUNT);
        assert_eq!(stored(&store, UserConfigKey::GitName), Some(json!("alice")));
        assert_eq!(
            stored(&store, UserConfigKey::UserServicePassword),
            Some(json!(values.user_service_password))
        );
        assert_eq!(stored(&store, UserConfigKey::KaggleApiToken), Some(json!(null)));

        let state = manager.state().unwrap();
        assert!(state.keys_being_changed().is_empty());
    }

    #[tokio::test]
    async fn test_existing_values_are_adopted() {
        let store = Arc::new(InMemorySecretStore::with_secrets([
            (
                get_config_key_path("alice", UserConfigKey::GitName),
                Secret::new(json!("Alice Liddell")),
            ),
            (
                get_config_key_path("alice", UserConfigKey::IsBetaModeEnabled),
                Secret::new(json!(true)),
            ),
            (
                get_config_key_path("alice", UserConfigKey::GitCredentialCacheDuration),
                Secret::new(json!(900)),
            ),
        ]));
        let manager =
            UserConfigsManager::new(store.clone(), alice_session(), ProfileDefaults::default());

        let report = manager.initialize().await.unwrap();
        assert_eq!(report.repaired.len(), UserConfigKey::COUNT - 3);
        assert!(!report.repaired.contains(&UserConfigKey::GitName));

        let values = manager.values().unwrap();
        assert_eq!(values.git_name, "Alice Liddell");
        assert!(values.is_beta_mode_enabled);
        assert_eq!(values.git_credential_cache_duration, 900);
        assert_eq!(
            stored(&store, UserConfigKey::GitName),
            Some(json!("Alice Liddell"))
        );
    }

    #[tokio::test]
    async fn test_null_deployment_region_is_repaired() {
        let store = Arc::new(InMemorySecretStore::with_secrets([(
            get_config_key_path("alice", UserConfigKey::DeploymentRegionId),
            Secret::new(json!(null)),
        )]));
        let profile = ProfileDefaults::default().with_deployment_region_id(Some("paris".into()));
        let manager = UserConfigsManager::new(store.clone(), alice_session(), profile);

        let report = manager.initialize().await.unwrap();
        assert!(report.repaired.contains(&UserConfigKey::DeploymentRegionId));
        assert_eq!(
            manager.values().unwrap().deployment_region_id,
            Some("paris".to_string())
        );
        assert_eq!(
            stored(&store, UserConfigKey::DeploymentRegionId),
            Some(json!("paris"))
        );
    }

    #[tokio::test]
    async fn test_wrongly_typed_value_is_repaired() {
        let store = Arc::new(InMemorySecretStore::with_secrets([(
            get_config_key_path("alice", UserConfigKey::IsDarkModeEnabled),
            Secret::new(json!("yes please")),
        )]));
        let manager =
            UserConfigsManager::new(store.clone(), alice_session(), ProfileDefaults::new(|| true));

        let report = manager.initialize().await.unwrap();
        assert!(report.repaired.contains(&UserConfigKey::IsDarkModeEnabled));
        assert!(manager.values().unwrap().is_dark_mode_enabled);
        assert_eq!(
            stored(&store, UserConfigKey::IsDarkModeEnabled),
            Some(json!(true))
        );
    }

    #[tokio::test]
    async fn test_dark_mode_default_follows_profile_policy() {
        for preferred in [true, false] {
            let store = Arc::new(InMemorySecretStore::new());
            let manager = UserConfigsManager::new(
                store.clone(),
                alice_session(),
                ProfileDefaults::new(move || preferred),
            );

            manager.initialize().await.unwrap();
            assert_eq!(manager.values().unwrap().is_dark_mode_enabled, preferred);
        }
    }

    #[tokio::test]
    async fn test_keys_are_fetched_concurrently() {
        let store = Arc::new(SlowReadStore::default());
        let manager =
            UserConfigsManager::new(store.clone(), alice_session(), ProfileDefaults::default());

        manager.initialize().await.unwrap();

        assert_eq!(
            store.max_in_flight.load(Ordering::SeqCst),
            UserConfigKey::COUNT
        );
    }

    #[tokio::test]
    async fn test_overlapping_initializations_run_once() {
        let store = Arc::new(SlowReadStore::default());
        let manager =
            UserConfigsManager::new(store.clone(), alice_session(), ProfileDefaults::default());

        let (first, second) = tokio::join!(manager.initialize(), manager.initialize());

        let reports: Vec<_> = [first, second].into_iter().filter_map(|r| r.ok()).collect();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].repaired.len(), UserConfigKey::COUNT);
        assert_eq!(store.puts.load(Ordering::SeqCst), UserConfigKey::COUNT);

        // The password kept locally is the one that was stored
        let password = manager.values().unwrap().user_service_password;
        assert_eq!(
            stored(&store.inner, UserConfigKey::UserServicePassword),
            Some(json!(password))
        );
    }

    #[tokio::test]
    async fn test_second_initialization_is_rejected_after_overlap() {
        let store = Arc::new(SlowReadStore::default());
        let manager =
            UserConfigsManager::new(store.clone(), alice_session(), ProfileDefaults::default());

        let (first, second) = tokio::join!(manager.initialize(), manager.initialize());
        let rejected = [first, second]
            .into_iter()
            .filter(|r| matches!(r, Err(UserConfigsError::AlreadyInitialized)))
            .count();
        assert_eq!(rejected, 1);
    }

    #[tokio::test]
    async fn test_logged_out_session_is_rejected() {
        let store = Arc::new(InMemorySecretStore::new());
        let manager = UserConfigsManager::new(
            store.clone(),
            Arc::new(StaticSessionProvider::logged_out()),
            ProfileDefaults::default(),
        );

        assert!(matches!(
            manager.initialize().await,
            Err(UserConfigsError::NotLoggedIn)
        ));
        assert!(store.snapshot().unwrap().is_empty());
    }
}

#[cfg(test)]
mod change_tests {
    use super::*;

    #[tokio::test]
    async fn test_change_is_persisted() {
        let store = Arc::new(InMemorySecretStore::new());
        let manager =
            UserConfigsManager::new(store.clone(), alice_session(), ProfileDefaults::default());
        manager.initialize().await.unwrap();

        manager
            .change_value(UserConfig::KaggleApiToken(Some("kgl-123".into())))
            .await
            .unwrap();

        let state = manager.state().unwrap();
        assert_eq!(
            state.value(UserConfigKey::KaggleApiToken),
            UserConfig::KaggleApiToken(Some("kgl-123".into()))
        );
        assert_eq!(state.status(UserConfigKey::KaggleApiToken), &SyncStatus::Synced);
        assert_eq!(
            stored(&store, UserConfigKey::KaggleApiToken),
            Some(json!("kgl-123"))
        );
    }

    #[tokio::test]
    async fn test_same_value_does_not_write() {
        let store = Arc::new(CountingStore::default());
        let manager =
            UserConfigsManager::new(store.clone(), alice_session(), ProfileDefaults::default());
        manager.initialize().await.unwrap();
        let writes_after_init = store.puts.load(Ordering::SeqCst);

        manager
            .change_value(UserConfig::GitEmail("alice@example.com".into()))
            .await
            .unwrap();

        assert_eq!(store.puts.load(Ordering::SeqCst), writes_after_init);
    }

    #[tokio::test]
    async fn test_field_is_marked_while_writing() {
        let store = Arc::new(GatedStore::default());
        let manager = Arc::new(UserConfigsManager::new(
            store.clone(),
            alice_session(),
            ProfileDefaults::default(),
        ));
        manager.initialize().await.unwrap();
        store.armed.store(true, Ordering::SeqCst);

        let task = {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move {
                manager
                    .change_value(UserConfig::IsBetaModeEnabled(true))
                    .await
            })
        };

        store.entered.notified().await;
        let state = manager.state().unwrap();
        assert!(state.is_being_changed(UserConfigKey::IsBetaModeEnabled));
        assert_eq!(
            state.value(UserConfigKey::IsBetaModeEnabled),
            UserConfig::IsBetaModeEnabled(true)
        );
        assert_eq!(
            state.keys_being_changed(),
            vec![UserConfigKey::IsBetaModeEnabled]
        );

        store.release.notify_one();
        assert_ok!(task.await.unwrap());

        let state = manager.state().unwrap();
        assert!(!state.is_being_changed(UserConfigKey::IsBetaModeEnabled));
        assert_eq!(
            stored(&store.inner, UserConfigKey::IsBetaModeEnabled),
            Some(json!(true))
        );
    }

    #[tokio::test]
    async fn test_renew_user_service_password() {
        let store = Arc::new(InMemorySecretStore::new());
        let manager =
            UserConfigsManager::new(store.clone(), alice_session(), ProfileDefaults::default());
        manager.initialize().await.unwrap();
        let before = manager.values().unwrap().user_service_password;

        manager.renew_user_service_password().await.unwrap();

        let after = manager.values().unwrap().user_service_password;
        assert_ne!(after, before);
        assert_eq!(after.len(), 20);
        assert!(after
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        assert_eq!(
            stored(&store, UserConfigKey::UserServicePassword),
            Some(json!(after))
        );
    }

    #[tokio::test]
    async fn test_restore_display_of_dialog() {
        let store = Arc::new(InMemorySecretStore::new());
        let manager =
            UserConfigsManager::new(store.clone(), alice_session(), ProfileDefaults::default());
        manager.initialize().await.unwrap();

        manager
            .change_value(UserConfig::DoDisplayMySecretsUseInServiceDialog(false))
            .await
            .unwrap();
        assert!(!manager.values().unwrap().do_display_my_secrets_use_in_service_dialog);

        manager.restore_display_of_dialog().await.unwrap();

        assert!(manager.values().unwrap().do_display_my_secrets_use_in_service_dialog);
        assert_eq!(
            stored(&store, UserConfigKey::DoDisplayMySecretsUseInServiceDialog),
            Some(json!(true))
        );
    }
}

#[cfg(test)]
mod path_tests {
    use super::*;

    #[test]
    fn test_config_key_path() {
        assert_eq!(
            get_config_key_path("alice", UserConfigKey::GitName),
            "alice/.onyxia/gitName"
        );
        assert_eq!(
            get_config_key_path("bob", UserConfigKey::DoDisplayMySecretsUseInServiceDialog),
            "bob/.onyxia/doDisplayMySecretsUseInServiceDialog"
        );
    }
}
