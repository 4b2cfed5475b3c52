//! Secret data structures

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single secret record: one JSON value stored under one path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Secret {
    pub value: Value,
}

impl Secret {
    pub fn new(value: Value) -> Self {
        Self { value }
    }
}

/// Vault KV v2 read response envelope
#[derive(Debug, Deserialize)]
pub(crate) struct KvReadResponse {
    pub data: KvReadData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct KvReadData {
    pub data: Secret,
}

/// Vault KV v2 write request body
#[derive(Debug, Serialize)]
pub(crate) struct KvWriteRequest<'a> {
    pub data: &'a Secret,
}
