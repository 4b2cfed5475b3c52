//! Configuration settings management
//!
//! This module handles loading configuration from multiple sources,
//! validation, and persistence.

use crate::error::{Result, UserConfigsError};
use crate::utils::format::FormattableOutput;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tabled::Tabled;

/// Which secret store backs the user configurations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretBackend {
    Vault,
    File,
}

impl std::fmt::Display for SecretBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecretBackend::Vault => write!(f, "vault"),
            SecretBackend::File => write!(f, "file"),
        }
    }
}

impl FromStr for SecretBackend {
    type Err = UserConfigsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "vault" => Ok(SecretBackend::Vault),
            "file" => Ok(SecretBackend::File),
            other => Err(UserConfigsError::config(format!(
                "Unsupported secret backend: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    pub address: String,
    /// Read from settings or `VAULT_TOKEN`, never written back out
    #[serde(skip_serializing)]
    pub token: String,
    pub mount: String,
    pub namespace: Option<String>,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            token: String::new(),
            mount: "onyxia-kv".to_string(),
            namespace: None,
        }
    }
}

fn display_backend(backend: &SecretBackend) -> String {
    backend.to_string()
}

fn display_optional(option: &Option<String>) -> String {
    option.clone().unwrap_or_default()
}

#[derive(Debug, Clone, Serialize, Deserialize, Tabled)]
#[serde(default)]
pub struct Config {
    #[tabled(rename = "Backend", display_with = "display_backend")]
    pub secret_backend: SecretBackend,
    #[tabled(skip)]
    pub vault: VaultConfig,
    #[tabled(skip)]
    pub secrets_file: Option<PathBuf>,
    #[tabled(rename = "Username")]
    pub username: String,
    #[tabled(rename = "Email")]
    pub email: String,
    #[tabled(rename = "Dark Mode Default")]
    pub default_dark_mode: bool,
    #[tabled(rename = "Default Region", display_with = "display_optional")]
    pub default_deployment_region_id: Option<String>,
    #[tabled(skip)]
    pub request_timeout_secs: u64,
    #[tabled(rename = "No Color")]
    pub no_color: bool,
}

impl FormattableOutput for Config {}

impl Default for Config {
    fn default() -> Self {
        Self {
            secret_backend: SecretBackend::Vault,
            vault: VaultConfig::default(),
            secrets_file: None,
            username: String::new(),
            email: String::new(),
            default_dark_mode: false,
            default_deployment_region_id: None,
            request_timeout_secs: 30,
            no_color: false,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        match self.secret_backend {
            SecretBackend::Vault => {
                if self.vault.address.is_empty() {
                    return Err(UserConfigsError::config(
                        "Vault address is required (set VAULT_ADDR or vault.address)",
                    ));
                }
                url::Url::parse(&self.vault.address).map_err(|e| {
                    UserConfigsError::config(format!(
                        "Invalid Vault address '{}': {}",
                        self.vault.address, e
                    ))
                })?;
                if self.vault.token.is_empty() {
                    return Err(UserConfigsError::config(
                        "Vault token is required (set VAULT_TOKEN or vault.token)",
                    ));
                }
                if self.vault.mount.trim_matches('/').is_empty() {
                    return Err(UserConfigsError::config("Vault mount cannot be empty"));
                }
            }
            SecretBackend::File => {
                self.secrets_file_path()?;
            }
        }

        if self.request_timeout_secs == 0 {
            return Err(UserConfigsError::config(
                "Request timeout must be at least one second",
            ));
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("userconfigs.toml"))
    }

    /// Location of the local secrets file used by the `file` backend
    pub fn secrets_file_path(&self) -> Result<PathBuf> {
        match &self.secrets_file {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::config_dir()?.join("secrets.json")),
        }
    }

    fn config_dir() -> Result<PathBuf> {
        // Use XDG Base Directory specification on Linux and macOS
        #[cfg(any(target_os = "linux", target_os = "macos"))]
        {
            use std::env;
            let config_dir = if let Ok(xdg_config_home) = env::var("XDG_CONFIG_HOME") {
                PathBuf::from(xdg_config_home)
            } else {
                let home_dir = env::var("HOME")
                    .map_err(|_| UserConfigsError::config("HOME environment variable not set"))?;
                PathBuf::from(home_dir).join(".config")
            };
            Ok(config_dir.join("onyxia"))
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos")))]
        {
            let config_dir = dirs::config_dir()
                .ok_or_else(|| UserConfigsError::config("Unable to determine config directory"))?;
            Ok(config_dir.join("onyxia"))
        }
    }
}

/// Load configuration from multiple sources with priority order:
/// 1. Command-line flags (handled by clap)
/// 2. Environment variables
/// 3. Configuration file
/// 4. Default values
pub async fn load_config() -> Result<Config> {
    let config = load_config_no_validation().await?;

    config.validate()?;

    Ok(config)
}

/// Load configuration without validation (for config commands)
pub async fn load_config_no_validation() -> Result<Config> {
    let mut config = Config::default();

    let config_path = Config::get_config_path()?;
    if config_path.exists() {
        config = load_from_file(&config_path).await?;
    }

    apply_env_overrides(&mut config, |name| std::env::var(name).ok());

    Ok(config)
}

pub async fn load_from_file(path: &Path) -> Result<Config> {
    let contents = tokio::fs::read_to_string(path).await?;

    // Try to parse as TOML first, then JSON as fallback
    if let Ok(config) = toml::from_str::<Config>(&contents) {
        return Ok(config);
    }

    let config = serde_json::from_str::<Config>(&contents)?;
    Ok(config)
}

fn parse_flag(value: &str) -> bool {
    value.to_lowercase() == "true" || value == "1"
}

/// Override settings with environment variables read through `lookup`
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup("ONYXIA_SECRET_BACKEND") {
        match value.parse::<SecretBackend>() {
            Ok(backend) => config.secret_backend = backend,
            Err(e) => tracing::warn!("Ignoring ONYXIA_SECRET_BACKEND: {}", e),
        }
    }

    if let Some(value) = lookup("VAULT_ADDR") {
        config.vault.address = value;
    }

    if let Some(value) = lookup("VAULT_TOKEN") {
        config.vault.token = value;
    }

    if let Some(value) = lookup("VAULT_MOUNT") {
        config.vault.mount = value;
    }

    if let Some(value) = lookup("VAULT_NAMESPACE") {
        config.vault.namespace = Some(value).filter(|v| !v.is_empty());
    }

    if let Some(value) = lookup("ONYXIA_SECRETS_FILE") {
        config.secrets_file = Some(PathBuf::from(value));
    }

    if let Some(value) = lookup("ONYXIA_USERNAME") {
        config.username = value;
    }

    if let Some(value) = lookup("ONYXIA_EMAIL") {
        config.email = value;
    }

    if let Some(value) = lookup("ONYXIA_DARK_MODE") {
        config.default_dark_mode = parse_flag(&value);
    }

    if let Some(value) = lookup("ONYXIA_DEFAULT_REGION") {
        config.default_deployment_region_id = Some(value).filter(|v| !v.is_empty());
    }

    if let Some(value) = lookup("ONYXIA_REQUEST_TIMEOUT") {
        if let Ok(seconds) = value.parse::<u64>() {
            config.request_timeout_secs = seconds;
        }
    }

    if lookup("NO_COLOR").is_some() {
        config.no_color = true;
    }
}

pub async fn save_config(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let contents = toml::to_string_pretty(config)
        .map_err(|e| UserConfigsError::serialization(e.to_string()))?;

    tokio::fs::write(path, contents).await?;

    Ok(())
}

/// Write a default settings file unless one already exists
pub async fn init_default_config() -> Result<PathBuf> {
    let config_path = Config::get_config_path()?;

    if !config_path.exists() {
        save_config(&Config::default(), &config_path).await?;
    }

    Ok(config_path)
}
