//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (wait > 0, delays ordered)
//! - Reject a registry URL the HTTP client cannot use
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BuilderConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use crate::config::schema::BuilderConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self { field, message: message.into() }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &BuilderConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.reload_cmd.split_whitespace().next().is_none() {
        errors.push(ValidationError::new("reload_cmd", "must not be empty"));
    }

    if config.vips.is_empty() {
        errors.push(ValidationError::new("vips", "allowlist must name at least one VIP"));
    } else if config.vips.iter().any(|v| v.trim().is_empty() || v.contains('/')) {
        errors.push(ValidationError::new("vips", "VIP names must be non-empty and contain no '/'"));
    }

    match url::Url::parse(&config.registry_base()) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError::new(
            "registry_url",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new("registry_url", e.to_string())),
    }

    if config.config_file.trim().is_empty() {
        errors.push(ValidationError::new("config_file", "must not be empty"));
    }
    if config.staging_file.trim().is_empty() {
        errors.push(ValidationError::new("staging_file", "must not be empty"));
    }
    if !config.config_file.is_empty() && config.config_file == config.staging_file {
        errors.push(ValidationError::new("staging_file", "must differ from config_file"));
    }

    if config.diff_cmd.trim().is_empty() {
        errors.push(ValidationError::new("diff_cmd", "must not be empty"));
    }

    if config.watch.wait_secs == 0 {
        errors.push(ValidationError::new("watch.wait_secs", "must be greater than zero"));
    }
    if config.watch.request_timeout_secs == 0 {
        errors.push(ValidationError::new("watch.request_timeout_secs", "must be greater than zero"));
    }

    if config.retry.base_delay_ms == 0 {
        errors.push(ValidationError::new("retry.base_delay_ms", "must be greater than zero"));
    }
    if config.retry.max_delay_ms < config.retry.base_delay_ms {
        errors.push(ValidationError::new("retry.max_delay_ms", "must be >= base_delay_ms"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> BuilderConfig {
        BuilderConfig {
            vips: vec!["test".into()],
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate_config(&valid()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = valid();
        config.reload_cmd = "   ".into();
        config.staging_file = config.config_file.clone();
        config.retry.max_delay_ms = 10;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["reload_cmd", "staging_file", "retry.max_delay_ms"]);
    }

    #[test]
    fn test_rejects_bad_scheme() {
        let mut config = valid();
        config.registry_url = "ftp://consul:8500".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "registry_url");
    }
}
