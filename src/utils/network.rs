use crate::error::{Result, UserConfigsError};
use reqwest::Client;
use std::time::Duration;

/// Configuration for HTTP client with proper timeouts
pub struct NetworkConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            user_agent: format!("onyxia-userconfigs/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl NetworkConfig {
    pub fn with_request_timeout(request_timeout: Duration) -> Self {
        Self {
            request_timeout,
            ..Self::default()
        }
    }
}

/// Create a properly configured HTTP client with timeouts
pub fn create_http_client(config: &NetworkConfig) -> Result<Client> {
    Client::builder()
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .user_agent(&config.user_agent)
        .build()
        .map_err(|e| UserConfigsError::network(format!("Failed to create HTTP client: {}", e)))
}

/// Turn a transport error into a message that names the unreachable host
pub fn classify_network_error(error: &reqwest::Error, url: &str) -> UserConfigsError {
    let host = extract_host_from_url(url);

    if error.is_timeout() {
        return UserConfigsError::connection_timeout(format!(
            "Connection to secret store '{}' timed out",
            host
        ));
    }

    if error.is_connect() {
        if is_dns_resolution_error(error) {
            return UserConfigsError::dns_resolution(
                host.clone(),
                format!("Unable to resolve hostname '{}'", host),
            );
        }

        if error
            .to_string()
            .to_lowercase()
            .contains("connection refused")
        {
            return UserConfigsError::connection_refused(format!(
                "Connection to secret store '{}' was refused",
                host
            ));
        }

        return UserConfigsError::network(format!(
            "Failed to connect to secret store '{}'. Check your network connection and the store address.",
            host
        ));
    }

    let message = error.to_string().to_lowercase();
    if message.contains("ssl") || message.contains("tls") || message.contains("certificate") {
        return UserConfigsError::ssl_error(format!(
            "SSL/TLS error when accessing secret store '{}'",
            host
        ));
    }

    UserConfigsError::network(format!(
        "Network error when accessing secret store '{}': {}",
        host, error
    ))
}

fn is_dns_resolution_error(error: &reqwest::Error) -> bool {
    let error_msg = error.to_string().to_lowercase();
    let dns_indicators = [
        "dns",
        "name resolution",
        "failed to lookup address",
        "name or service not known",
        "nodename nor servname provided",
        "no such host",
        "could not resolve host",
    ];

    dns_indicators
        .iter()
        .any(|&indicator| error_msg.contains(indicator))
}

fn extract_host_from_url(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(|host| host.to_string()))
        .unwrap_or_else(|| "unknown-host".to_string())
}
