//! Builds one configuration document from the current registry state.

use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;

use crate::assembler::document::ConfigDocument;
use crate::assembler::spec::{Backend, ConfigType, Frontend, VipSpec};
use crate::config::BuilderConfig;
use crate::registry::{Registry, RegistryError};

/// Errors that abort a build. No partial document is ever returned.
#[derive(Debug, Error)]
pub enum AssembleError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A mandatory key is absent or empty.
    #[error("required key '{0}' is missing")]
    MissingKey(String),

    /// A value is not valid UTF-8 text.
    #[error("value of '{key}' is not valid UTF-8")]
    InvalidText { key: String },
}

impl AssembleError {
    /// True when the cause is a malformed registry payload.
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            AssembleError::InvalidText { .. }
                | AssembleError::Registry(RegistryError::Decode { .. })
                | AssembleError::Registry(RegistryError::MissingIndex(_))
        )
    }
}

/// Turns registry state into a proxy configuration document.
pub struct ConfigAssembler<R> {
    registry: Arc<R>,
    prefix: String,
    allowlist: BTreeSet<String>,
}

impl<R: Registry> ConfigAssembler<R> {
    /// Create an assembler reading specs under `prefix`.
    pub fn new(registry: Arc<R>, prefix: &str, allowlist: impl IntoIterator<Item = String>) -> Self {
        Self {
            registry,
            prefix: prefix.trim_matches('/').to_string(),
            allowlist: allowlist.into_iter().collect(),
        }
    }

    pub fn from_config(registry: Arc<R>, config: &BuilderConfig) -> Self {
        Self::new(registry, &config.normalized_prefix(), config.vips.iter().cloned())
    }

    fn key(&self, rest: &str) -> String {
        if self.prefix.is_empty() {
            rest.to_string()
        } else {
            format!("{}/{}", self.prefix, rest)
        }
    }

    /// Fetch everything and render the document.
    pub async fn build(&self) -> Result<ConfigDocument, AssembleError> {
        let mut doc = ConfigDocument::new();

        let global = self.section("global").await?;
        let defaults = self.section("defaults").await?;
        doc.push_section("global", &global);
        doc.push_section("defaults", &defaults);

        let vips = self.vip_names().await?;
        tracing::debug!(count = vips.len(), "Allowed VIPs discovered");

        for name in vips {
            let vip = VipSpec {
                frontend: self.frontend(&name).await?,
                backend: self.backend(&name).await?,
                name,
            };

            if vip.frontend.is_empty() {
                tracing::debug!(vip = %vip.name, "Frontend spec empty, skipping block");
            } else {
                doc.push_frontend(&vip);
            }

            if vip.backend.is_empty() {
                tracing::debug!(vip = %vip.name, "Backend spec empty, skipping block");
                continue;
            }

            let endpoints = match vip.backend.kind() {
                ConfigType::Dynamic => {
                    let mapping = vip.backend.catalog_mapping.trim();
                    if mapping.is_empty() {
                        return Err(AssembleError::MissingKey(
                            self.key(&format!("backend/{}/catalogMapping", vip.name)),
                        ));
                    }
                    self.registry.service_endpoints(mapping).await?
                }
                ConfigType::Static => Vec::new(),
            };
            tracing::debug!(vip = %vip.name, endpoints = endpoints.len(), "Rendering backend");
            doc.push_backend(&vip, &endpoints);
        }

        Ok(doc)
    }

    /// A mandatory base64 section (`global`, `defaults`).
    async fn section(&self, name: &str) -> Result<String, AssembleError> {
        let key = self.key(name);
        let bytes = self
            .registry
            .value(&key)
            .await?
            .ok_or_else(|| AssembleError::MissingKey(key.clone()))?;
        let text = String::from_utf8(bytes).map_err(|_| AssembleError::InvalidText { key: key.clone() })?;
        if text.trim().is_empty() {
            return Err(AssembleError::MissingKey(key));
        }
        Ok(text)
    }

    /// Allowed VIP names from the backend listing, sorted and deduplicated.
    pub async fn vip_names(&self) -> Result<Vec<String>, AssembleError> {
        let listing = self.key("backend");
        let keys = self.registry.child_keys(&listing).await?;

        let names: BTreeSet<String> = keys
            .iter()
            .filter_map(|key| {
                let rest = key.trim_start_matches('/').strip_prefix(listing.as_str())?;
                let name = rest.trim_matches('/');
                (!name.is_empty() && !name.contains('/')).then(|| name.to_string())
            })
            .filter(|name| {
                let allowed = self.allowlist.contains(name);
                if !allowed {
                    tracing::trace!(vip = %name, "VIP not in allowlist, ignoring");
                }
                allowed
            })
            .collect();

        Ok(names.into_iter().collect())
    }

    async fn text(&self, key: String) -> Result<String, AssembleError> {
        match self.registry.raw_value(&key).await? {
            Some(bytes) => String::from_utf8(bytes).map_err(|_| AssembleError::InvalidText { key }),
            None => Ok(String::new()),
        }
    }

    pub async fn frontend(&self, vip: &str) -> Result<Frontend, AssembleError> {
        let [bind_options, listen_port, mode, static_conf] = Frontend::FIELDS;
        let field = |f: &str| self.key(&format!("frontend/{}/{}", vip, f));
        Ok(Frontend {
            bind_options: self.text(field(bind_options)).await?,
            listen_port: self.text(field(listen_port)).await?,
            mode: self.text(field(mode)).await?,
            static_conf: self.text(field(static_conf)).await?,
        })
    }

    pub async fn backend(&self, vip: &str) -> Result<Backend, AssembleError> {
        let [balance, catalog_mapping, mode, static_conf, config_type] = Backend::FIELDS;
        let field = |f: &str| self.key(&format!("backend/{}/{}", vip, f));
        Ok(Backend {
            balance: self.text(field(balance)).await?,
            catalog_mapping: self.text(field(catalog_mapping)).await?,
            mode: self.text(field(mode)).await?,
            static_conf: self.text(field(static_conf)).await?,
            config_type: self.text(field(config_type)).await?,
        })
    }
}
