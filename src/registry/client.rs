//! The registry capability consumed by the assembler and the watcher.

use std::collections::BTreeMap;
use async_trait::async_trait;

use crate::registry::types::{RegistryIndex, RegistryResult, ServiceEndpoint};

/// Read-only access to a service-discovery registry.
///
/// KV keys are given without a leading slash (e.g., `apps/haproxy/global`).
#[async_trait]
pub trait Registry: Send + Sync + 'static {
    /// Block until the catalog index moves past `index` or the server-side
    /// wait elapses. Returns the index the registry reported.
    async fn wait_for_change(&self, index: RegistryIndex) -> RegistryResult<RegistryIndex>;

    /// All catalog services with their tags.
    async fn services(&self) -> RegistryResult<BTreeMap<String, Vec<String>>>;

    /// Live instances of one catalog service, in registry order.
    async fn service_endpoints(&self, name: &str) -> RegistryResult<Vec<ServiceEndpoint>>;

    /// Base64-decoded value of a KV entry, `None` if absent.
    async fn value(&self, key: &str) -> RegistryResult<Option<Vec<u8>>>;

    /// Raw bytes of a KV entry, `None` if absent.
    async fn raw_value(&self, key: &str) -> RegistryResult<Option<Vec<u8>>>;

    /// Immediate child keys under `prefix`, as full key paths.
    async fn child_keys(&self, prefix: &str) -> RegistryResult<Vec<String>>;
}
