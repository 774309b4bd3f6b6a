//! Rendered configuration document.
//!
//! A `ConfigDocument` is created empty by each build and handed out by value;
//! nothing keeps it between cycles.

use crate::assembler::spec::{Backend, ConfigType, Frontend, VipSpec};
use crate::registry::ServiceEndpoint;

/// Proxy configuration text in render order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDocument {
    text: String,
}

impl ConfigDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Append `field` verbatim, then a newline unless it already ends in one.
    pub fn push_field(&mut self, field: &str) {
        self.text.push_str(field);
        if !field.ends_with('\n') {
            self.text.push('\n');
        }
    }

    /// Append a line that is always newline-terminated as written.
    pub fn push_line(&mut self, line: &str) {
        self.text.push_str(line);
        self.text.push('\n');
    }

    /// `<name>` header, the section body, then a blank line.
    pub fn push_section(&mut self, name: &str, body: &str) {
        self.push_line(name);
        self.push_field(body);
        self.text.push('\n');
    }

    pub fn push_frontend(&mut self, vip: &VipSpec) {
        let Frontend { bind_options, listen_port, mode, static_conf } = &vip.frontend;

        self.push_line(&format!("frontend {}", vip.name));
        self.push_field(&format!("mode {}", mode));
        self.push_field(&format!("bind 0.0.0.0:{} {}", listen_port, bind_options));
        self.push_field(static_conf);
        self.push_line(&format!("default_backend {}", vip.backend_name()));
        self.text.push('\n');
    }

    /// Backend block; `endpoints` are rendered only for dynamic backends.
    pub fn push_backend(&mut self, vip: &VipSpec, endpoints: &[ServiceEndpoint]) {
        let Backend { balance, mode, static_conf, .. } = &vip.backend;

        self.push_line(&format!("backend {}", vip.backend_name()));
        self.push_field(&format!("mode {}", mode));
        self.push_field(&format!("balance {}", balance));
        self.push_field(static_conf);
        if vip.backend.kind() == ConfigType::Dynamic {
            for endpoint in endpoints {
                self.push_line(&format!(
                    "server {} {}:{} check",
                    endpoint.node, endpoint.address, endpoint.port
                ));
            }
        }
        self.text.push_str("\n\n");
    }
}

impl std::fmt::Display for ConfigDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}
