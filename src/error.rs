use thiserror::Error;

/// Main error type for onyxia-userconfigs operations
#[derive(Debug, Error)]
pub enum UserConfigsError {
    #[error("No user is logged in")]
    NotLoggedIn,

    #[error("User configurations are not initialized yet")]
    NotInitialized,

    #[error("User configurations are already initialized for this session")]
    AlreadyInitialized,

    #[error("Invalid username: {username}")]
    InvalidUsername { username: String },

    #[error("Unknown configuration key: {name}")]
    UnknownKey { name: String },

    #[error("Invalid value for '{key}': {details}")]
    InvalidValue { key: String, details: String },

    #[error("Invalid range: low boundary {low} is greater than high boundary {high}")]
    InvalidRange { low: f64, high: f64 },

    #[error("Secret store error at '{path}': {details}")]
    SecretStoreError { path: String, details: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Connection timeout: {0}")]
    ConnectionTimeout(String),

    #[error("Connection refused: {0}")]
    ConnectionRefused(String),

    #[error("DNS resolution failed for '{host}': {details}")]
    DnsResolutionError { host: String, details: String },

    #[error("SSL/TLS error: {0}")]
    SslError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl UserConfigsError {
    pub fn invalid_username<S: Into<String>>(username: S) -> Self {
        Self::InvalidUsername {
            username: username.into(),
        }
    }

    pub fn unknown_key<S: Into<String>>(name: S) -> Self {
        Self::UnknownKey { name: name.into() }
    }

    pub fn invalid_value<K: Into<String>, S: Into<String>>(key: K, details: S) -> Self {
        Self::InvalidValue {
            key: key.into(),
            details: details.into(),
        }
    }

    pub fn secret_store<P: Into<String>, S: Into<String>>(path: P, details: S) -> Self {
        Self::SecretStoreError {
            path: path.into(),
            details: details.into(),
        }
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn network<S: Into<String>>(msg: S) -> Self {
        Self::NetworkError(msg.into())
    }

    pub fn connection_timeout<S: Into<String>>(msg: S) -> Self {
        Self::ConnectionTimeout(msg.into())
    }

    pub fn connection_refused<S: Into<String>>(msg: S) -> Self {
        Self::ConnectionRefused(msg.into())
    }

    pub fn dns_resolution<S: Into<String>>(host: S, details: S) -> Self {
        Self::DnsResolutionError {
            host: host.into(),
            details: details.into(),
        }
    }

    pub fn ssl_error<S: Into<String>>(msg: S) -> Self {
        Self::SslError(msg.into())
    }

    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        Self::SerializationError(msg.into())
    }

    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

/// Result type alias for onyxia-userconfigs operations
pub type Result<T> = std::result::Result<T, UserConfigsError>;
