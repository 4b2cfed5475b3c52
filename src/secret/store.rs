//! Secret store trait and in-memory implementation

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::models::Secret;
use crate::error::{Result, UserConfigsError};

/// Trait for path-addressed secret stores
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Read the secret at `path`; `Ok(None)` when nothing is stored there
    async fn get(&self, path: &str) -> Result<Option<Secret>>;

    /// Create or overwrite the secret at `path`
    async fn put(&self, path: &str, secret: Secret) -> Result<()>;
}

/// Secret store kept in process memory
#[derive(Debug, Default)]
pub struct InMemorySecretStore {
    secrets: Mutex<HashMap<String, Secret>>,
}

impl InMemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `(path, secret)` entries
    pub fn with_secrets<I, P>(entries: I) -> Self
    where
        I: IntoIterator<Item = (P, Secret)>,
        P: Into<String>,
    {
        let secrets = entries
            .into_iter()
            .map(|(path, secret)| (path.into(), secret))
            .collect();
        Self {
            secrets: Mutex::new(secrets),
        }
    }

    /// Copy of everything currently stored
    pub fn snapshot(&self) -> Result<HashMap<String, Secret>> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Secret>>> {
        self.secrets
            .lock()
            .map_err(|_| UserConfigsError::secret_store("<memory>", "store lock poisoned"))
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn get(&self, path: &str) -> Result<Option<Secret>> {
        Ok(self.lock()?.get(path).cloned())
    }

    async fn put(&self, path: &str, secret: Secret) -> Result<()> {
        self.lock()?.insert(path.to_string(), secret);
        Ok(())
    }
}
