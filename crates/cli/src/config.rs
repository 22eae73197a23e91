//! CLI runtime configuration.
//!
//! Resolved once at startup from the environment (after `.env` is loaded) and then passed to
//! every command. Nothing reads the environment after this point.

use fhir::{Format, ParseMode};
use messaging::DEFAULT_SOURCE;
use vrx_types::NonEmptyText;

/// Errors raised while resolving the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("VRX_FORMAT must be json or yaml, got {0:?}")]
    Format(String),

    #[error("VRX_STRICT must be true or false, got {0:?}")]
    Strict(String),

    #[error("{0} cannot be blank")]
    BlankEndpoint(&'static str),
}

/// Configuration resolved at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CliConfig {
    format: Format,
    mode: ParseMode,
    source: String,
    destination: Option<String>,
}

impl CliConfig {
    /// Reads the `VRX_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::resolve(|name| std::env::var(name).ok())
    }

    /// Resolves the configuration from any variable lookup.
    pub fn resolve(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let format = match lookup("VRX_FORMAT") {
            Some(name) => Format::from_name(&name).ok_or(ConfigError::Format(name))?,
            None => Format::Json,
        };

        let mode = match lookup("VRX_STRICT").map(|v| v.trim().to_ascii_lowercase()) {
            None => ParseMode::Permissive,
            Some(v) if matches!(v.as_str(), "1" | "true" | "yes") => ParseMode::Strict,
            Some(v) if matches!(v.as_str(), "0" | "false" | "no") => ParseMode::Permissive,
            Some(v) => return Err(ConfigError::Strict(v)),
        };

        let endpoint = |name: &'static str| -> Result<Option<String>, ConfigError> {
            lookup(name)
                .map(|value| {
                    NonEmptyText::new(value)
                        .map(NonEmptyText::into_string)
                        .map_err(|_| ConfigError::BlankEndpoint(name))
                })
                .transpose()
        };
        let source = endpoint("VRX_SOURCE_ENDPOINT")?.unwrap_or_else(|| DEFAULT_SOURCE.into());
        let destination = endpoint("VRX_DESTINATION_ENDPOINT")?;

        Ok(Self {
            format,
            mode,
            source,
            destination,
        })
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn mode(&self) -> ParseMode {
        self.mode
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// The configured destination; `None` means the default for the record kind.
    pub fn destination(&self) -> Option<&str> {
        self.destination.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn resolve(vars: &[(&str, &str)]) -> Result<CliConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CliConfig::resolve(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = resolve(&[]).expect("defaults");
        assert_eq!(config.format(), Format::Json);
        assert_eq!(config.mode(), ParseMode::Permissive);
        assert_eq!(config.source(), DEFAULT_SOURCE);
        assert_eq!(config.destination(), None);
    }

    #[test]
    fn variables_override_defaults() {
        let config = resolve(&[
            ("VRX_FORMAT", "YAML"),
            ("VRX_STRICT", "true"),
            ("VRX_SOURCE_ENDPOINT", " http://example.org/ma "),
            ("VRX_DESTINATION_ENDPOINT", "http://example.org/nchs"),
        ])
        .expect("valid");
        assert_eq!(config.format(), Format::Yaml);
        assert_eq!(config.mode(), ParseMode::Strict);
        assert_eq!(config.source(), "http://example.org/ma");
        assert_eq!(config.destination(), Some("http://example.org/nchs"));
    }

    #[test]
    fn invalid_values_are_named() {
        let err = resolve(&[("VRX_FORMAT", "xml")]).expect_err("xml");
        assert!(matches!(err, ConfigError::Format(ref v) if v == "xml"));

        let err = resolve(&[("VRX_STRICT", "maybe")]).expect_err("not a bool");
        assert!(matches!(err, ConfigError::Strict(_)));

        let err = resolve(&[("VRX_SOURCE_ENDPOINT", "  ")]).expect_err("blank");
        assert!(matches!(err, ConfigError::BlankEndpoint("VRX_SOURCE_ENDPOINT")));
    }
}
