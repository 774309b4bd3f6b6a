//! HTTP registry client with timeout and error handling.
//!
//! # Responsibilities
//! - Issue blocking catalog queries keyed by the index parameter
//! - Read KV entries (JSON + base64, or `?raw`) and key listings
//! - Map 404s on KV reads to "absent" rather than an error

use std::collections::BTreeMap;
use std::time::Duration;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::{Client, Response, StatusCode};
use url::Url;

use crate::config::BuilderConfig;
use crate::registry::client::Registry;
use crate::registry::types::{
    CatalogServiceEntry, KvEntry, RegistryError, RegistryIndex, RegistryResult, ServiceEndpoint,
};

/// Header carrying the catalog index on blocking query responses.
pub const INDEX_HEADER: &str = "X-Consul-Index";

/// Extra time granted to a blocking query beyond the server-side wait.
const BLOCKING_GRACE: Duration = Duration::from_secs(15);

/// Registry client speaking the Consul-style HTTP API.
#[derive(Clone)]
pub struct HttpRegistry {
    client: Client,
    base_url: Url,
    wait: Duration,
    request_timeout: Duration,
}

impl HttpRegistry {
    /// Create a new client for `base_url` (scheme included, no trailing slash).
    pub fn new(
        base_url: impl Into<String>,
        wait: Duration,
        request_timeout: Duration,
    ) -> RegistryResult<Self> {
        let base_url = base_url.into();
        let parsed = Url::parse(&base_url).map_err(|e| RegistryError::InvalidUrl {
            url: base_url.clone(),
            message: e.to_string(),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(RegistryError::InvalidUrl {
                url: base_url,
                message: "not a base URL".to_string(),
            });
        }

        let client = Client::builder()
            .pool_max_idle_per_host(0)
            .build()?;

        Ok(Self {
            client,
            base_url: parsed,
            wait,
            request_timeout,
        })
    }

    /// Build a client from the loaded configuration.
    pub fn from_config(config: &BuilderConfig) -> RegistryResult<Self> {
        Self::new(
            config.registry_base(),
            Duration::from_secs(config.watch.wait_secs),
            Duration::from_secs(config.watch.request_timeout_secs),
        )
    }

    /// Base URL plus percent-encoded path `segments` and a literal query.
    fn url<'a>(&self, segments: impl IntoIterator<Item = &'a str>, query: Option<&str>) -> String {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url.set_query(query);
        url.into()
    }

    async fn get(&self, url: &str) -> RegistryResult<Response> {
        let res = self
            .client
            .get(url)
            .timeout(self.request_timeout)
            .send()
            .await?;
        Ok(res)
    }

    /// GET a KV path; `None` on 404, error on any other non-success status.
    async fn get_kv(&self, url: &str) -> RegistryResult<Option<Response>> {
        let res = self.get(url).await?;
        if res.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(ensure_success(url, res)?))
    }
}

/// `/v1/kv/<key>` with each level of the key as its own path segment.
fn kv_segments(key: &str) -> impl Iterator<Item = &str> {
    ["v1", "kv"].into_iter().chain(key.split('/'))
}

fn ensure_success(url: &str, res: Response) -> RegistryResult<Response> {
    if res.status().is_success() {
        Ok(res)
    } else {
        Err(RegistryError::Status {
            url: url.to_string(),
            status: res.status().as_u16(),
        })
    }
}

fn decode_json<T: serde::de::DeserializeOwned>(url: &str, body: &[u8]) -> RegistryResult<T> {
    serde_json::from_slice(body).map_err(|e| RegistryError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })
}

#[async_trait]
impl Registry for HttpRegistry {
    async fn wait_for_change(&self, index: RegistryIndex) -> RegistryResult<RegistryIndex> {
        let query = format!("index={}&wait={}s", index.0, self.wait.as_secs());
        let url = self.url(["v1", "catalog", "services"], Some(&query));
        tracing::debug!(index = index.0, "Issuing blocking catalog query");

        let res = self
            .client
            .get(&url)
            .timeout(self.wait + BLOCKING_GRACE)
            .send()
            .await?;
        let res = ensure_success(&url, res)?;

        let new_index = res
            .headers()
            .get(INDEX_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .ok_or_else(|| RegistryError::MissingIndex(url.clone()))?;

        tracing::debug!(index = new_index, "Catalog query returned");
        Ok(RegistryIndex(new_index))
    }

    async fn services(&self) -> RegistryResult<BTreeMap<String, Vec<String>>> {
        let url = self.url(["v1", "catalog", "services"], None);
        let res = ensure_success(&url, self.get(&url).await?)?;
        let body = res.bytes().await?;
        let raw: BTreeMap<String, Option<Vec<String>>> = decode_json(&url, &body)?;
        Ok(raw.into_iter().map(|(k, v)| (k, v.unwrap_or_default())).collect())
    }

    async fn service_endpoints(&self, name: &str) -> RegistryResult<Vec<ServiceEndpoint>> {
        let url = self.url(["v1", "catalog", "service", name], None);
        let res = ensure_success(&url, self.get(&url).await?)?;
        let body = res.bytes().await?;
        let entries: Vec<CatalogServiceEntry> = decode_json(&url, &body)?;
        Ok(entries.into_iter().map(ServiceEndpoint::from).collect())
    }

    async fn value(&self, key: &str) -> RegistryResult<Option<Vec<u8>>> {
        let url = self.url(kv_segments(key), None);
        let Some(res) = self.get_kv(&url).await? else {
            return Ok(None);
        };
        let body = res.bytes().await?;
        let entries: Vec<KvEntry> = decode_json(&url, &body)?;

        let Some(encoded) = entries.into_iter().next().and_then(|e| e.value) else {
            return Ok(None);
        };
        let decoded = STANDARD.decode(encoded.trim()).map_err(|e| RegistryError::Decode {
            url: url.clone(),
            message: format!("invalid base64 value: {}", e),
        })?;
        Ok(Some(decoded))
    }

    async fn raw_value(&self, key: &str) -> RegistryResult<Option<Vec<u8>>> {
        let url = self.url(kv_segments(key), Some("raw"));
        match self.get_kv(&url).await? {
            Some(res) => Ok(Some(res.bytes().await?.to_vec())),
            None => Ok(None),
        }
    }

    async fn child_keys(&self, prefix: &str) -> RegistryResult<Vec<String>> {
        let segments = kv_segments(prefix.trim_end_matches('/')).chain([""]);
        let url = self.url(segments, Some("keys&separator=/"));
        match self.get_kv(&url).await? {
            Some(res) => {
                let body = res.bytes().await?;
                decode_json(&url, &body)
            }
            None => Ok(Vec::new()),
        }
    }
}
