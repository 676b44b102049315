//! Configuration loading via `ortho-config`.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

/// Default per-request timeout applied by the REST transport.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// OpenStack connection settings derived from environment variables,
/// configuration files, and CLI flags.
///
/// Endpoints are optional: a namespace whose endpoint is not configured is
/// simply not wired into the provider.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "OS",
    discovery(
        app_name = "stratum",
        env_var = "STRATUM_CONFIG_PATH",
        config_file_name = "stratum.toml",
        dotfile_name = ".stratum.toml",
        project_file_name = "stratum.toml"
    )
)]
pub struct OpenStackConfig {
    /// Pre-issued identity token sent with every request. Required.
    pub auth_token: String,
    /// Base URL of the compute (nova) API, including the version segment.
    pub compute_endpoint: Option<String>,
    /// Base URL of the block-storage (cinder) API, including the project.
    pub block_storage_endpoint: Option<String>,
    /// Base URL of the object-storage (swift) account.
    pub object_storage_endpoint: Option<String>,
    /// Base URL of the identity (keystone) v3 API.
    pub identity_endpoint: Option<String>,
    /// Per-request timeout in seconds.
    #[ortho_config(default = 30)]
    pub request_timeout_secs: u64,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }

    fn missing(&self) -> ConfigError {
        ConfigError::MissingField(format!(
            "missing {}: set {} or add {} to stratum.toml",
            self.description, self.env_var, self.toml_key
        ))
    }
}

const ENDPOINTS: [FieldMetadata; 4] = [
    FieldMetadata::new("compute endpoint", "OS_COMPUTE_ENDPOINT", "compute_endpoint"),
    FieldMetadata::new(
        "block storage endpoint",
        "OS_BLOCK_STORAGE_ENDPOINT",
        "block_storage_endpoint",
    ),
    FieldMetadata::new(
        "object storage endpoint",
        "OS_OBJECT_STORAGE_ENDPOINT",
        "object_storage_endpoint",
    ),
    FieldMetadata::new("identity endpoint", "OS_IDENTITY_ENDPOINT", "identity_endpoint"),
];

impl OpenStackConfig {
    /// Builds a configuration holding only a token; every endpoint is unset.
    #[must_use]
    pub fn with_token(auth_token: impl Into<String>) -> Self {
        Self {
            auth_token: auth_token.into(),
            compute_endpoint: None,
            block_storage_endpoint: None,
            object_storage_endpoint: None,
            identity_endpoint: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }

    fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(metadata.missing());
        }
        Ok(())
    }

    /// Loads configuration using the `ortho-config` derive. Values merge
    /// defaults, configuration files, environment variables, and CLI flags in
    /// that order of precedence.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the loader fails to merge sources.
    pub fn load_from_sources() -> Result<Self, ConfigError> {
        Self::load().map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Loads configuration without attempting to parse CLI arguments. Values
    /// still merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("stratum")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Configured endpoints in compute, block storage, object storage,
    /// identity order.
    fn endpoints(&self) -> [Option<&str>; 4] {
        [
            self.compute_endpoint.as_deref(),
            self.block_storage_endpoint.as_deref(),
            self.object_storage_endpoint.as_deref(),
            self.identity_endpoint.as_deref(),
        ]
    }

    /// Per-request timeout as a [`Duration`].
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Performs semantic validation. Error messages include guidance on how
    /// to provide missing values via environment variables or configuration
    /// files.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when the token is empty or a
    /// configured endpoint is blank, and [`ConfigError::Parse`] for a zero
    /// timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_field(
            &self.auth_token,
            &FieldMetadata::new("OpenStack auth token", "OS_AUTH_TOKEN", "auth_token"),
        )?;
        for (endpoint, metadata) in self.endpoints().into_iter().zip(ENDPOINTS.iter()) {
            if let Some(value) = endpoint {
                Self::require_field(value, metadata)?;
            }
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Parse(String::from(
                "request_timeout_secs must be greater than zero",
            )));
        }
        Ok(())
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn config() -> OpenStackConfig {
        OpenStackConfig {
            compute_endpoint: Some(String::from("https://nova.example/v2.1")),
            ..OpenStackConfig::with_token("token")
        }
    }

    #[rstest]
    fn accepts_token_with_endpoint(config: OpenStackConfig) {
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn blank_token_names_env_var(config: OpenStackConfig, #[case] token: &str) {
        let cfg = OpenStackConfig {
            auth_token: token.to_owned(),
            ..config
        };
        let Err(ConfigError::MissingField(message)) = cfg.validate() else {
            panic!("blank token should fail");
        };
        assert!(message.contains("OS_AUTH_TOKEN"), "{message}");
        assert!(message.contains("stratum.toml"), "{message}");
    }

    #[rstest]
    fn blank_endpoint_is_rejected(config: OpenStackConfig) {
        let cfg = OpenStackConfig {
            object_storage_endpoint: Some(String::from(" ")),
            ..config
        };
        let Err(ConfigError::MissingField(message)) = cfg.validate() else {
            panic!("blank endpoint should fail");
        };
        assert!(message.contains("OS_OBJECT_STORAGE_ENDPOINT"), "{message}");
    }

    #[rstest]
    fn zero_timeout_is_rejected(config: OpenStackConfig) {
        let cfg = OpenStackConfig {
            request_timeout_secs: 0,
            ..config
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::Parse(_))));
    }
}
