//! Local file secret store
//!
//! Keeps every secret in a single JSON document mapping paths to
//! `{ "value": ... }` records. Intended for offline use and demos.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

use super::models::Secret;
use super::store::SecretStore;
use crate::error::Result;

pub struct FileSecretStore {
    path: PathBuf,
    // Held for every file access so readers never see a half-written file
    lock: Mutex<()>,
}

impl FileSecretStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<BTreeMap<String, Secret>> {
        if !tokio::fs::try_exists(&self.path).await? {
            return Ok(BTreeMap::new());
        }

        let contents = tokio::fs::read_to_string(&self.path).await?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }
}

#[async_trait]
impl SecretStore for FileSecretStore {
    async fn get(&self, path: &str) -> Result<Option<Secret>> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all().await?.remove(path))
    }

    async fn put(&self, path: &str, secret: Secret) -> Result<()> {
        let _guard = self.lock.lock().await;

        let mut secrets = self.read_all().await?;
        secrets.insert(path.to_string(), secret);

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_string_pretty(&secrets)?;
        tokio::fs::write(&self.path, contents).await?;

        debug!("Saved secret '{}' to {}", path, self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_reads_as_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSecretStore::new(temp_dir.path().join("secrets.json"));

        assert_eq!(store.get("alice/.onyxia/gitName").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_persists_across_instances() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("secrets.json");

        let store = FileSecretStore::new(&path);
        store
            .put("alice/.onyxia/gitCredentialCacheDuration", Secret::new(json!(600)))
            .await
            .unwrap();

        let reopened = FileSecretStore::new(&path);
        assert_eq!(
            reopened
                .get("alice/.onyxia/gitCredentialCacheDuration")
                .await
                .unwrap(),
            Some(Secret::new(json!(600)))
        );
    }

    #[tokio::test]
    async fn test_concurrent_puts_are_all_kept() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(FileSecretStore::new(temp_dir.path().join("secrets.json")));

        let writes = (0..8).map(|i| {
            let store = Arc::clone(&store);
            async move {
                store
                    .put(&format!("alice/.onyxia/key{}", i), Secret::new(json!(i)))
                    .await
            }
        });
        for result in futures::future::join_all(writes).await {
            result.unwrap();
        }

        for i in 0..8 {
            assert_eq!(
                store.get(&format!("alice/.onyxia/key{}", i)).await.unwrap(),
                Some(Secret::new(json!(i)))
            );
        }
    }
}
