//! Secret store module
//!
//! This module provides the path-addressed secret store abstraction the
//! user configurations are persisted in, together with a HashiCorp Vault
//! KV v2 backend, a local file backend and an in-memory backend.

pub mod file;
pub mod models;
pub mod store;
pub mod vault;

pub use file::FileSecretStore;
pub use models::Secret;
pub use store::{InMemorySecretStore, SecretStore};
pub use vault::VaultSecretStore;
