//! Registry wire types and error definitions.

use serde::Deserialize;
use thiserror::Error;

/// Opaque catalog version cursor used for blocking queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RegistryIndex(pub u64);

impl From<u64> for RegistryIndex {
    fn from(index: u64) -> Self {
        Self(index)
    }
}

impl From<RegistryIndex> for u64 {
    fn from(index: RegistryIndex) -> Self {
        index.0
    }
}

impl std::fmt::Display for RegistryIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One entry of a JSON KV read. `Value` is base64 and may be null.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KvEntry {
    #[serde(default)]
    pub create_index: u64,
    #[serde(default)]
    pub modify_index: u64,
    pub key: String,
    #[serde(default)]
    pub flags: u64,
    pub value: Option<String>,
}

/// One instance from `/v1/catalog/service/{name}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CatalogServiceEntry {
    pub node: String,
    pub address: String,
    #[serde(rename = "ServiceID", default)]
    pub service_id: String,
    #[serde(default)]
    pub service_name: String,
    #[serde(default)]
    pub service_tags: Option<Vec<String>>,
    #[serde(default)]
    pub service_address: String,
    pub service_port: u16,
}

/// A discovered backend instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoint {
    pub node: String,
    pub address: String,
    pub port: u16,
}

impl From<CatalogServiceEntry> for ServiceEndpoint {
    fn from(entry: CatalogServiceEntry) -> Self {
        Self {
            node: entry.node,
            address: entry.address,
            port: entry.service_port,
        }
    }
}

/// Errors that can occur while talking to the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Connection refused, reset, or timed out.
    #[error("registry request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// Registry answered with an unexpected status.
    #[error("registry returned {status} for {url}")]
    Status { url: String, status: u16 },

    /// Response body could not be decoded.
    #[error("malformed registry response from {url}: {message}")]
    Decode { url: String, message: String },

    /// Registry base URL cannot be used to build request URLs.
    #[error("invalid registry URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    /// Blocking query response carried no usable index header.
    #[error("missing or invalid X-Consul-Index header from {0}")]
    MissingIndex(String),
}

impl RegistryError {
    /// True for transport failures, false for malformed responses.
    pub fn is_network(&self) -> bool {
        matches!(self, RegistryError::Network(_) | RegistryError::Status { .. })
    }
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
