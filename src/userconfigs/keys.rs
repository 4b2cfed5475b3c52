//! Configuration keys, typed values and the per-user configuration record

use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

use crate::auth::User;
use crate::error::{Result, UserConfigsError};
use crate::utils::helpers::generate_random_password;

/// The closed set of configuration keys persisted for every user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum UserConfigKey {
    UserServicePassword,
    KaggleApiToken,
    GitName,
    GitEmail,
    GitCredentialCacheDuration,
    IsBetaModeEnabled,
    IsDarkModeEnabled,
    DeploymentRegionId,
    GithubPersonalAccessToken,
    DoDisplayMySecretsUseInServiceDialog,
    BookmarkedServiceConfigurationStr,
}

impl UserConfigKey {
    pub const COUNT: usize = 11;

    pub const ALL: [UserConfigKey; Self::COUNT] = [
        UserConfigKey::UserServicePassword,
        UserConfigKey::KaggleApiToken,
        UserConfigKey::GitName,
        UserConfigKey::GitEmail,
        UserConfigKey::GitCredentialCacheDuration,
        UserConfigKey::IsBetaModeEnabled,
        UserConfigKey::IsDarkModeEnabled,
        UserConfigKey::DeploymentRegionId,
        UserConfigKey::GithubPersonalAccessToken,
        UserConfigKey::DoDisplayMySecretsUseInServiceDialog,
        UserConfigKey::BookmarkedServiceConfigurationStr,
    ];

    /// Name used as the last segment of the secret path
    pub fn as_str(&self) -> &'static str {
        match self {
            UserConfigKey::UserServicePassword => "userServicePassword",
            UserConfigKey::KaggleApiToken => "kaggleApiToken",
            UserConfigKey::GitName => "gitName",
            UserConfigKey::GitEmail => "gitEmail",
            UserConfigKey::GitCredentialCacheDuration => "gitCredentialCacheDuration",
            UserConfigKey::IsBetaModeEnabled => "isBetaModeEnabled",
            UserConfigKey::IsDarkModeEnabled => "isDarkModeEnabled",
            UserConfigKey::DeploymentRegionId => "deploymentRegionId",
            UserConfigKey::GithubPersonalAccessToken => "githubPersonalAccessToken",
            UserConfigKey::DoDisplayMySecretsUseInServiceDialog => {
                "doDisplayMySecretsUseInServiceDialog"
            }
            UserConfigKey::BookmarkedServiceConfigurationStr => {
                "bookmarkedServiceConfigurationStr"
            }
        }
    }

    /// Position of the key in [`UserConfigKey::ALL`]
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Keys holding credentials, masked in listings
    pub fn is_sensitive(&self) -> bool {
        matches!(
            self,
            UserConfigKey::UserServicePassword
                | UserConfigKey::KaggleApiToken
                | UserConfigKey::GithubPersonalAccessToken
        )
    }

    pub fn is_nullable(&self) -> bool {
        matches!(
            self,
            UserConfigKey::KaggleApiToken
                | UserConfigKey::DeploymentRegionId
                | UserConfigKey::GithubPersonalAccessToken
                | UserConfigKey::BookmarkedServiceConfigurationStr
        )
    }

    /// Whether a stored value is outdated and must be replaced by the default
    pub fn is_legacy_value(&self, value: &Value) -> bool {
        match self {
            UserConfigKey::DeploymentRegionId => value.is_null(),
            _ => false,
        }
    }
}

impl fmt::Display for UserConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn normalize_key_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

impl FromStr for UserConfigKey {
    type Err = UserConfigsError;

    /// Accepts the camelCase name or any case/separator variant of it
    /// (`git-email`, `GIT_EMAIL`)
    fn from_str(s: &str) -> Result<Self> {
        let wanted = normalize_key_name(s);
        UserConfigKey::ALL
            .into_iter()
            .find(|key| normalize_key_name(key.as_str()) == wanted)
            .ok_or_else(|| UserConfigsError::unknown_key(s))
    }
}

/// One configuration value, typed by its key
#[derive(Debug, Clone, PartialEq)]
pub enum UserConfig {
    UserServicePassword(String),
    KaggleApiToken(Option<String>),
    GitName(String),
    GitEmail(String),
    GitCredentialCacheDuration(u64),
    IsBetaModeEnabled(bool),
    IsDarkModeEnabled(bool),
    DeploymentRegionId(Option<String>),
    GithubPersonalAccessToken(Option<String>),
    DoDisplayMySecretsUseInServiceDialog(bool),
    BookmarkedServiceConfigurationStr(Option<String>),
}

impl UserConfig {
    pub fn key(&self) -> UserConfigKey {
        match self {
            UserConfig::UserServicePassword(_) => UserConfigKey::UserServicePassword,
            UserConfig::KaggleApiToken(_) => UserConfigKey::KaggleApiToken,
            UserConfig::GitName(_) => UserConfigKey::GitName,
            UserConfig::GitEmail(_) => UserConfigKey::GitEmail,
            UserConfig::GitCredentialCacheDuration(_) => UserConfigKey::GitCredentialCacheDuration,
            UserConfig::IsBetaModeEnabled(_) => UserConfigKey::IsBetaModeEnabled,
            UserConfig::IsDarkModeEnabled(_) => UserConfigKey::IsDarkModeEnabled,
            UserConfig::DeploymentRegionId(_) => UserConfigKey::DeploymentRegionId,
            UserConfig::GithubPersonalAccessToken(_) => UserConfigKey::GithubPersonalAccessToken,
            UserConfig::DoDisplayMySecretsUseInServiceDialog(_) => {
                UserConfigKey::DoDisplayMySecretsUseInServiceDialog
            }
            UserConfig::BookmarkedServiceConfigurationStr(_) => {
                UserConfigKey::BookmarkedServiceConfigurationStr
            }
        }
    }

    /// JSON value persisted in the secret store
    pub fn to_json(&self) -> Value {
        match self {
            UserConfig::UserServicePassword(v) | UserConfig::GitName(v) | UserConfig::GitEmail(v) => {
                json!(v)
            }
            UserConfig::KaggleApiToken(v)
            | UserConfig::DeploymentRegionId(v)
            | UserConfig::GithubPersonalAccessToken(v)
            | UserConfig::BookmarkedServiceConfigurationStr(v) => json!(v),
            UserConfig::GitCredentialCacheDuration(v) => json!(v),
            UserConfig::IsBetaModeEnabled(v)
            | UserConfig::IsDarkModeEnabled(v)
            | UserConfig::DoDisplayMySecretsUseInServiceDialog(v) => json!(v),
        }
    }

    /// Decode a stored JSON value, rejecting values of the wrong type
    pub fn from_json(key: UserConfigKey, value: Value) -> Result<Self> {
        let mismatch = |expected: &str, value: &Value| {
            UserConfigsError::invalid_value(key.as_str(), format!("expected {expected}, got {value}"))
        };

        let string = |value: Value| match value {
            Value::String(s) => Ok(s),
            other => Err(mismatch("a string", &other)),
        };
        let nullable_string = |value: Value| match value {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            other => Err(mismatch("a string or null", &other)),
        };
        let boolean = |value: Value| match value {
            Value::Bool(b) => Ok(b),
            other => Err(mismatch("a boolean", &other)),
        };

        Ok(match key {
            UserConfigKey::UserServicePassword => UserConfig::UserServicePassword(string(value)?),
            UserConfigKey::KaggleApiToken => UserConfig::KaggleApiToken(nullable_string(value)?),
            UserConfigKey::GitName => UserConfig::GitName(string(value)?),
            UserConfigKey::GitEmail => UserConfig::GitEmail(string(value)?),
            UserConfigKey::GitCredentialCacheDuration => match value.as_u64() {
                Some(seconds) => UserConfig::GitCredentialCacheDuration(seconds),
                None => return Err(mismatch("a non-negative integer", &value)),
            },
            UserConfigKey::IsBetaModeEnabled => UserConfig::IsBetaModeEnabled(boolean(value)?),
            UserConfigKey::IsDarkModeEnabled => UserConfig::IsDarkModeEnabled(boolean(value)?),
            UserConfigKey::DeploymentRegionId => {
                UserConfig::DeploymentRegionId(nullable_string(value)?)
            }
            UserConfigKey::GithubPersonalAccessToken => {
                UserConfig::GithubPersonalAccessToken(nullable_string(value)?)
            }
            UserConfigKey::DoDisplayMySecretsUseInServiceDialog => {
                UserConfig::DoDisplayMySecretsUseInServiceDialog(boolean(value)?)
            }
            UserConfigKey::BookmarkedServiceConfigurationStr => {
                UserConfig::BookmarkedServiceConfigurationStr(nullable_string(value)?)
            }
        })
    }

    /// Parse a value typed on the command line
    ///
    /// For nullable keys, `null` and the empty string clear the value.
    pub fn parse(key: UserConfigKey, text: &str) -> Result<Self> {
        let value = if key.is_nullable() && (text.is_empty() || text == "null") {
            Value::Null
        } else {
            match key {
                UserConfigKey::GitCredentialCacheDuration => {
                    let seconds = text.trim().parse::<u64>().map_err(|_| {
                        UserConfigsError::invalid_value(
                            key.as_str(),
                            format!("'{text}' is not a number of seconds"),
                        )
                    })?;
                    json!(seconds)
                }
                UserConfigKey::IsBetaModeEnabled
                | UserConfigKey::IsDarkModeEnabled
                | UserConfigKey::DoDisplayMySecretsUseInServiceDialog => {
                    match text.trim().to_lowercase().as_str() {
                        "true" | "1" | "yes" | "on" => json!(true),
                        "false" | "0" | "no" | "off" => json!(false),
                        _ => {
                            return Err(UserConfigsError::invalid_value(
                                key.as_str(),
                                format!("'{text}' is not a boolean"),
                            ))
                        }
                    }
                }
                _ => json!(text),
            }
        };

        Self::from_json(key, value)
    }

    /// Human readable rendering of the value
    pub fn display_value(&self) -> String {
        match self.to_json() {
            Value::Null => "null".to_string(),
            Value::String(s) => s,
            other => other.to_string(),
        }
    }
}

/// Everything needed to compute a brand new profile besides the session
#[derive(Clone)]
pub struct ProfileDefaults {
    is_dark_mode_enabled: std::sync::Arc<dyn Fn() -> bool + Send + Sync>,
    pub deployment_region_id: Option<String>,
}

impl ProfileDefaults {
    /// `is_dark_mode_enabled` is evaluated each time defaults are computed
    pub fn new<F>(is_dark_mode_enabled: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        Self {
            is_dark_mode_enabled: std::sync::Arc::new(is_dark_mode_enabled),
            deployment_region_id: None,
        }
    }

    pub fn with_deployment_region_id(mut self, region: Option<String>) -> Self {
        self.deployment_region_id = region;
        self
    }

    pub fn is_dark_mode_enabled(&self) -> bool {
        (self.is_dark_mode_enabled)()
    }
}

impl Default for ProfileDefaults {
    fn default() -> Self {
        Self::new(|| false)
    }
}

impl fmt::Debug for ProfileDefaults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProfileDefaults")
            .field("deployment_region_id", &self.deployment_region_id)
            .finish_non_exhaustive()
    }
}

/// The full configuration record of one user
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserConfigs {
    pub user_service_password: String,
    pub kaggle_api_token: Option<String>,
    pub git_name: String,
    pub git_email: String,
    pub git_credential_cache_duration: u64,
    pub is_beta_mode_enabled: bool,
    pub is_dark_mode_enabled: bool,
    pub deployment_region_id: Option<String>,
    pub github_personal_access_token: Option<String>,
    pub do_display_my_secrets_use_in_service_dialog: bool,
    pub bookmarked_service_configuration_str: Option<String>,
}

impl UserConfigs {
    /// Values written for a user who has nothing stored yet
    pub fn defaults(user: &User, profile: &ProfileDefaults) -> Self {
        Self {
            user_service_password: generate_random_password(),
            kaggle_api_token: None,
            git_name: user.username.clone(),
            git_email: user.email.clone(),
            git_credential_cache_duration: 0,
            is_beta_mode_enabled: false,
            is_dark_mode_enabled: profile.is_dark_mode_enabled(),
            deployment_region_id: profile.deployment_region_id.clone(),
            github_personal_access_token: None,
            do_display_my_secrets_use_in_service_dialog: true,
            bookmarked_service_configuration_str: None,
        }
    }

    pub fn get(&self, key: UserConfigKey) -> UserConfig {
        match key {
            UserConfigKey::UserServicePassword => {
                UserConfig::UserServicePassword(self.user_service_password.clone())
            }
            UserConfigKey::KaggleApiToken => UserConfig::KaggleApiToken(self.kaggle_api_token.clone()),
            UserConfigKey::GitName => UserConfig::GitName(self.git_name.clone()),
            UserConfigKey::GitEmail => UserConfig::GitEmail(self.git_email.clone()),
            UserConfigKey::GitCredentialCacheDuration => {
                UserConfig::GitCredentialCacheDuration(self.git_credential_cache_duration)
            }
            UserConfigKey::IsBetaModeEnabled => UserConfig::IsBetaModeEnabled(self.is_beta_mode_enabled),
            UserConfigKey::IsDarkModeEnabled => UserConfig::IsDarkModeEnabled(self.is_dark_mode_enabled),
            UserConfigKey::DeploymentRegionId => {
                UserConfig::DeploymentRegionId(self.deployment_region_id.clone())
            }
            UserConfigKey::GithubPersonalAccessToken => {
                UserConfig::GithubPersonalAccessToken(self.github_personal_access_token.clone())
            }
            UserConfigKey::DoDisplayMySecretsUseInServiceDialog => {
                UserConfig::DoDisplayMySecretsUseInServiceDialog(
                    self.do_display_my_secrets_use_in_service_dialog,
                )
            }
            UserConfigKey::BookmarkedServiceConfigurationStr => {
                UserConfig::BookmarkedServiceConfigurationStr(
                    self.bookmarked_service_configuration_str.clone(),
                )
            }
        }
    }

    pub fn set(&mut self, value: UserConfig) {
        match value {
            UserConfig::UserServicePassword(v) => self.user_service_password = v,
            UserConfig::KaggleApiToken(v) => self.kaggle_api_token = v,
            UserConfig::GitName(v) => self.git_name = v,
            UserConfig::GitEmail(v) => self.git_email = v,
            UserConfig::GitCredentialCacheDuration(v) => self.git_credential_cache_duration = v,
            UserConfig::IsBetaModeEnabled(v) => self.is_beta_mode_enabled = v,
            UserConfig::IsDarkModeEnabled(v) => self.is_dark_mode_enabled = v,
            UserConfig::DeploymentRegionId(v) => self.deployment_region_id = v,
            UserConfig::GithubPersonalAccessToken(v) => self.github_personal_access_token = v,
            UserConfig::DoDisplayMySecretsUseInServiceDialog(v) => {
                self.do_display_my_secrets_use_in_service_dialog = v
            }
            UserConfig::BookmarkedServiceConfigurationStr(v) => {
                self.bookmarked_service_configuration_str = v
            }
        }
    }
}

/// Secret path of `key` for `username`: `{username}/.onyxia/{key}`
pub fn get_config_key_path(username: &str, key: UserConfigKey) -> String {
    format!("{}/.onyxia/{}", username, key.as_str())
}
