//! HashiCorp Vault KV v2 secret store
//!
//! Secrets are read with `GET {address}/v1/{mount}/data/{path}` and written
//! with `POST` to the same URL, authenticated with the `X-Vault-Token` header.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;
use url::Url;
use zeroize::Zeroizing;

use super::models::{KvReadResponse, KvWriteRequest, Secret};
use super::store::SecretStore;
use crate::config::Config;
use crate::error::{Result, UserConfigsError};
use crate::utils::network::{classify_network_error, create_http_client, NetworkConfig};

const VAULT_TOKEN_HEADER: &str = "X-Vault-Token";
const VAULT_NAMESPACE_HEADER: &str = "X-Vault-Namespace";

/// Secret store backed by a Vault KV v2 secrets engine
pub struct VaultSecretStore {
    client: Client,
    address: Url,
    mount: String,
    namespace: Option<String>,
    token: Zeroizing<String>,
}

impl VaultSecretStore {
    pub fn new(
        client: Client,
        address: &str,
        mount: &str,
        token: String,
        namespace: Option<String>,
    ) -> Result<Self> {
        let address = Url::parse(address)?;
        if address.cannot_be_a_base() {
            return Err(UserConfigsError::config(format!(
                "Vault address '{}' is not a hierarchical URL",
                address
            )));
        }

        let mount = mount.trim_matches('/').to_string();
        if mount.is_empty() {
            return Err(UserConfigsError::config("Vault mount cannot be empty"));
        }

        Ok(Self {
            client,
            address,
            mount,
            namespace,
            token: Zeroizing::new(token),
        })
    }

    /// Build the store described by the `vault` section of the settings
    pub fn from_config(config: &Config) -> Result<Self> {
        let client =
            create_http_client(&NetworkConfig::with_request_timeout(config.request_timeout()))?;
        Self::new(
            client,
            &config.vault.address,
            &config.vault.mount,
            config.vault.token.clone(),
            config.vault.namespace.clone(),
        )
    }

    /// URL of the KV v2 data endpoint for `path`
    pub fn secret_url(&self, path: &str) -> Result<Url> {
        let path = path.trim_matches('/');
        if path.is_empty() {
            return Err(UserConfigsError::invalid_argument("Secret path cannot be empty"));
        }

        // Segments are percent-encoded so '#' or '?' in a name stay in the path
        let mut url = self.address.clone();
        url.path_segments_mut()
            .map_err(|_| UserConfigsError::config("Vault address is not a hierarchical URL"))?
            .pop_if_empty()
            .push("v1")
            .extend(self.mount.split('/'))
            .push("data")
            .extend(path.split('/'));
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header(VAULT_TOKEN_HEADER, self.token.as_str());

        match &self.namespace {
            Some(namespace) => builder.header(VAULT_NAMESPACE_HEADER, namespace),
            None => builder,
        }
    }
}

#[async_trait]
impl SecretStore for VaultSecretStore {
    async fn get(&self, path: &str) -> Result<Option<Secret>> {
        let url = self.secret_url(path)?;
        debug!("Reading secret from {}", url);

        let response = self
            .request(reqwest::Method::GET, url.clone())
            .send()
            .await
            .map_err(|e| classify_network_error(&e, url.as_str()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(UserConfigsError::secret_store(
                path,
                format!("read failed with HTTP {}", status),
            ));
        }

        let body = response.text().await?;
        parse_read_response(path, &body).map(Some)
    }

    async fn put(&self, path: &str, secret: Secret) -> Result<()> {
        let url = self.secret_url(path)?;
        debug!("Writing secret to {}", url);

        let response = self
            .request(reqwest::Method::POST, url.clone())
            .json(&KvWriteRequest { data: &secret })
            .send()
            .await
            .map_err(|e| classify_network_error(&e, url.as_str()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UserConfigsError::secret_store(
                path,
                format!("write failed with HTTP {}", status),
            ));
        }

        Ok(())
    }
}

fn parse_read_response(path: &str, body: &str) -> Result<Secret> {
    let response: KvReadResponse = serde_json::from_str(body).map_err(|e| {
        UserConfigsError::secret_store(path, format!("unexpected response body: {}", e))
    })?;
    Ok(response.data.data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store(address: &str, mount: &str) -> VaultSecretStore {
        VaultSecretStore::new(Client::new(), address, mount, "s.token".to_string(), None).unwrap()
    }

    #[test]
    fn test_secret_url() {
        let vault = store("https://vault.example.com", "onyxia-kv");
        assert_eq!(
            vault.secret_url("alice/.onyxia/gitEmail").unwrap().as_str(),
            "https://vault.example.com/v1/onyxia-kv/data/alice/.onyxia/gitEmail"
        );

        let vault = store("https://example.com/vault", "/kv/");
        assert_eq!(
            vault.secret_url("/alice/.onyxia/gitName").unwrap().as_str(),
            "https://example.com/vault/v1/kv/data/alice/.onyxia/gitName"
        );

        assert!(vault.secret_url("").is_err());
    }

    #[test]
    fn test_secret_url_encodes_segments() {
        let vault = store("https://vault.example.com", "onyxia-kv");
        let url = vault.secret_url("a#b?c/.onyxia/gitName").unwrap();

        assert_eq!(url.fragment(), None);
        assert_eq!(url.query(), None);
        assert_eq!(
            url.as_str(),
            "https://vault.example.com/v1/onyxia-kv/data/a%23b%3Fc/.onyxia/gitName"
        );

        // Two users differing only after a reserved character get distinct paths
        let other = vault.secret_url("a#x?c/.onyxia/gitName").unwrap();
        assert_ne!(url, other);
    }

    #[test]
    fn test_new_rejects_bad_input() {
        assert!(VaultSecretStore::new(Client::new(), "::", "kv", String::new(), None).is_err());
        assert!(
            VaultSecretStore::new(Client::new(), "http://localhost", "/", String::new(), None)
                .is_err()
        );
        assert!(
            VaultSecretStore::new(Client::new(), "mailto:vault@example.com", "kv", String::new(), None)
                .is_err()
        );
    }

    #[test]
    fn test_parse_read_response() {
        let body = json!({
            "request_id": "8c1a",
            "data": {
                "data": { "value": "alice@example.com" },
                "metadata": { "version": 3 }
            }
        })
        .to_string();

        let secret = parse_read_response("alice/.onyxia/gitEmail", &body).unwrap();
        assert_eq!(secret.value, json!("alice@example.com"));

        let secret = parse_read_response(
            "alice/.onyxia/deploymentRegionId",
            r#"{"data": {"data": {"value": null}}}"#,
        )
        .unwrap();
        assert!(secret.value.is_null());

        assert!(parse_read_response("p", r#"{"errors": []}"#).is_err());
    }

    #[test]
    fn test_write_body() {
        let secret = Secret::new(json!(3600));
        let body = serde_json::to_value(KvWriteRequest { data: &secret }).unwrap();
        assert_eq!(body, json!({ "data": { "value": 3600 } }));
    }
}
