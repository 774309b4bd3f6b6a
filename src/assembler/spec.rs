//! VIP specification types.

/// How a backend's server list is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigType {
    /// Servers come only from the static fragment.
    Static,
    /// Servers are expanded from the catalog mapping.
    Dynamic,
}

impl ConfigType {
    /// Interpret the raw `type` field. Anything but `dynamic` is static.
    pub fn from_field(raw: &str) -> Self {
        if raw.trim() == "dynamic" {
            ConfigType::Dynamic
        } else {
            ConfigType::Static
        }
    }
}

/// Listener side of a VIP.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frontend {
    pub bind_options: String,
    pub listen_port: String,
    pub mode: String,
    pub static_conf: String,
}

impl Frontend {
    /// Field names under `<prefix>/frontend/<vip>/`.
    pub const FIELDS: [&'static str; 4] = ["bindOptions", "listenPort", "mode", "staticConf"];

    pub fn is_empty(&self) -> bool {
        self.bind_options.is_empty()
            && self.listen_port.is_empty()
            && self.mode.is_empty()
            && self.static_conf.is_empty()
    }
}

/// Pool side of a VIP.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Backend {
    pub balance: String,
    pub catalog_mapping: String,
    pub mode: String,
    pub static_conf: String,
    pub config_type: String,
}

impl Backend {
    /// Field names under `<prefix>/backend/<vip>/`.
    pub const FIELDS: [&'static str; 5] = ["balance", "catalogMapping", "mode", "staticConf", "type"];

    pub fn is_empty(&self) -> bool {
        self.balance.is_empty()
            && self.catalog_mapping.is_empty()
            && self.mode.is_empty()
            && self.static_conf.is_empty()
            && self.config_type.is_empty()
    }

    pub fn kind(&self) -> ConfigType {
        ConfigType::from_field(&self.config_type)
    }
}

/// A named logical service: one frontend and one backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VipSpec {
    pub name: String,
    pub frontend: Frontend,
    pub backend: Backend,
}

impl VipSpec {
    /// Name of the backend block the frontend points at.
    pub fn backend_name(&self) -> String {
        format!("{}-backend", self.name)
    }
}
