//! Session provider trait and implementations
//!
//! This module defines the session provider trait through which the
//! configuration slice learns who is logged in, and a static implementation
//! backed by local settings.

#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Result, UserConfigsError};

/// Identity of the logged-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub email: String,
}

impl User {
    /// Create a user, rejecting usernames that cannot be a single path segment
    pub fn new<U: Into<String>, E: Into<String>>(username: U, email: E) -> Result<Self> {
        let username = username.into();
        validate_username(&username)?;

        Ok(Self {
            username,
            email: email.into(),
        })
    }
}

/// The username becomes the first segment of every secret path
fn validate_username(username: &str) -> Result<()> {
    if username.trim().is_empty() || username.contains('/') || username.starts_with('.') {
        return Err(UserConfigsError::invalid_username(username));
    }
    Ok(())
}

/// Trait for identity/session providers
#[cfg_attr(test, automock)]
pub trait SessionProvider: Send + Sync {
    /// Whether a user session is currently active
    fn is_user_logged_in(&self) -> bool;

    /// Get the current user, or `NotLoggedIn`
    fn get_user(&self) -> Result<User>;
}

/// Session provider with a fixed identity, resolved once at startup
#[derive(Debug, Clone, Default)]
pub struct StaticSessionProvider {
    user: Option<User>,
}

impl StaticSessionProvider {
    pub fn new(user: User) -> Self {
        Self { user: Some(user) }
    }

    pub fn logged_out() -> Self {
        Self { user: None }
    }

    /// Build a session from settings; an empty username means logged out
    pub fn from_config(config: &Config) -> Result<Self> {
        if config.username.is_empty() {
            return Ok(Self::logged_out());
        }

        Ok(Self::new(User::new(
            config.username.clone(),
            config.email.clone(),
        )?))
    }
}

impl SessionProvider for StaticSessionProvider {
    fn is_user_logged_in(&self) -> bool {
        self.user.is_some()
    }

    fn get_user(&self) -> Result<User> {
        self.user.clone().ok_or(UserConfigsError::NotLoggedIn)
    }
}
