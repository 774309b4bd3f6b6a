//! In-memory registry snapshot for unit tests.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Mutex;
use async_trait::async_trait;

use crate::registry::client::Registry;
use crate::registry::types::{RegistryError, RegistryIndex, RegistryResult, ServiceEndpoint};

#[derive(Default)]
pub struct MemoryRegistry {
    values: HashMap<String, Vec<u8>>,
    raw: HashMap<String, Vec<u8>>,
    children: HashMap<String, Vec<String>>,
    endpoints: HashMap<String, Vec<ServiceEndpoint>>,
    /// Indices handed out by successive `wait_for_change` calls; `None` fails.
    polls: Mutex<VecDeque<Option<u64>>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.as_bytes().to_vec());
        self
    }

    pub fn with_raw(mut self, key: &str, value: &str) -> Self {
        self.raw.insert(key.to_string(), value.as_bytes().to_vec());
        self
    }

    pub fn with_children(mut self, prefix: &str, keys: &[&str]) -> Self {
        self.children.insert(
            prefix.trim_end_matches('/').to_string(),
            keys.iter().map(|k| k.to_string()).collect(),
        );
        self
    }

    pub fn with_endpoints(mut self, service: &str, endpoints: &[(&str, &str, u16)]) -> Self {
        self.endpoints.insert(
            service.to_string(),
            endpoints
                .iter()
                .map(|(node, address, port)| ServiceEndpoint {
                    node: node.to_string(),
                    address: address.to_string(),
                    port: *port,
                })
                .collect(),
        );
        self
    }

    pub fn with_polls(self, polls: &[Option<u64>]) -> Self {
        *self.polls.lock().unwrap() = polls.iter().copied().collect();
        self
    }
}

#[async_trait]
impl Registry for MemoryRegistry {
    async fn wait_for_change(&self, index: RegistryIndex) -> RegistryResult<RegistryIndex> {
        let next = self.polls.lock().unwrap().pop_front();
        match next {
            Some(Some(i)) => Ok(RegistryIndex(i)),
            Some(None) => Err(RegistryError::MissingIndex("memory".into())),
            None => {
                // Script exhausted: behave like an idle registry.
                tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                Ok(index)
            }
        }
    }

    async fn services(&self) -> RegistryResult<BTreeMap<String, Vec<String>>> {
        Ok(self.endpoints.keys().map(|k| (k.clone(), Vec::new())).collect())
    }

    async fn service_endpoints(&self, name: &str) -> RegistryResult<Vec<ServiceEndpoint>> {
        Ok(self.endpoints.get(name).cloned().unwrap_or_default())
    }

    async fn value(&self, key: &str) -> RegistryResult<Option<Vec<u8>>> {
        Ok(self.values.get(key).cloned())
    }

    async fn raw_value(&self, key: &str) -> RegistryResult<Option<Vec<u8>>> {
        Ok(self.raw.get(key).cloned())
    }

    async fn child_keys(&self, prefix: &str) -> RegistryResult<Vec<String>> {
        Ok(self
            .children
            .get(prefix.trim_end_matches('/'))
            .cloned()
            .unwrap_or_default())
    }
}
