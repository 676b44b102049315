//! Unit tests for OpenStack configuration loading and validation.

use rstest::*;
use stratum::config::{ConfigError, DEFAULT_REQUEST_TIMEOUT_SECS};
use stratum::test_support::EnvGuard;
use stratum::{CloudError, OpenStackConfig, openstack};

const ENDPOINT_VARS: [&str; 4] = [
    "OS_COMPUTE_ENDPOINT",
    "OS_BLOCK_STORAGE_ENDPOINT",
    "OS_OBJECT_STORAGE_ENDPOINT",
    "OS_IDENTITY_ENDPOINT",
];

#[fixture]
fn valid_config() -> OpenStackConfig {
    OpenStackConfig {
        auth_token: String::from("gAAAAABexampletoken"),
        compute_endpoint: Some(String::from("https://nova.example/v2.1")),
        block_storage_endpoint: Some(String::from("https://cinder.example/v3/project")),
        object_storage_endpoint: Some(String::from("https://swift.example/v1/AUTH_project")),
        identity_endpoint: Some(String::from("https://keystone.example/v3")),
        request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
    }
}

#[rstest]
fn config_validation_rejects_missing_token_with_actionable_error(valid_config: OpenStackConfig) {
    let cfg = OpenStackConfig {
        auth_token: String::new(),
        ..valid_config
    };

    let error = cfg.validate().expect_err("token is required");
    let ConfigError::MissingField(ref message) = error else {
        panic!("expected MissingField error");
    };
    assert!(
        message.contains("OS_AUTH_TOKEN"),
        "error should mention env var: {message}"
    );
    assert!(
        message.contains("stratum.toml"),
        "error should mention config file: {message}"
    );
    assert!(
        message.contains("auth_token"),
        "error should mention TOML key: {message}"
    );
    assert_eq!(
        message,
        "missing OpenStack auth token: set OS_AUTH_TOKEN or add auth_token to stratum.toml"
    );
}

/// Verifies that a blank endpoint produces an actionable error naming both
/// the environment variable and the TOML key.
#[rstest]
#[case::compute(
    |cfg: &mut OpenStackConfig| cfg.compute_endpoint = Some(String::new()),
    "OS_COMPUTE_ENDPOINT",
    "compute_endpoint"
)]
#[case::block_storage(
    |cfg: &mut OpenStackConfig| cfg.block_storage_endpoint = Some(String::from("  ")),
    "OS_BLOCK_STORAGE_ENDPOINT",
    "block_storage_endpoint"
)]
#[case::identity(
    |cfg: &mut OpenStackConfig| cfg.identity_endpoint = Some(String::new()),
    "OS_IDENTITY_ENDPOINT",
    "identity_endpoint"
)]
fn config_validation_produces_actionable_endpoint_errors(
    valid_config: OpenStackConfig,
    #[case] mutate: fn(&mut OpenStackConfig),
    #[case] env_var: &str,
    #[case] toml_key: &str,
) {
    let mut cfg = valid_config;
    mutate(&mut cfg);
    let message = cfg.validate().expect_err("validation should fail").to_string();
    assert!(
        message.contains(env_var),
        "error should mention env var {env_var}: {message}"
    );
    assert!(
        message.contains(toml_key),
        "error should mention TOML key {toml_key}: {message}"
    );
}

#[rstest]
fn unset_endpoints_are_valid() {
    assert_eq!(OpenStackConfig::with_token("token").validate(), Ok(()));
}

#[rstest]
fn connect_surfaces_config_errors(valid_config: OpenStackConfig) {
    let cfg = OpenStackConfig {
        auth_token: String::from(" "),
        ..valid_config
    };
    let Err(CloudError::Config(message)) = openstack::connect(&cfg) else {
        panic!("blank token should fail to connect");
    };
    assert!(message.contains("OS_AUTH_TOKEN"), "{message}");
}

#[tokio::test]
async fn config_loads_from_environment() {
    let _guard = EnvGuard::set_vars(
        &[
            ("OS_AUTH_TOKEN", "env-token"),
            ("OS_COMPUTE_ENDPOINT", "https://nova.example/v2.1"),
            ("OS_REQUEST_TIMEOUT_SECS", "45"),
        ],
        &ENDPOINT_VARS[1..],
    )
    .await;

    let cfg = OpenStackConfig::load_without_cli_args()
        .unwrap_or_else(|err| panic!("config should load from env: {err}"));

    assert_eq!(cfg.auth_token, "env-token");
    assert_eq!(
        cfg.compute_endpoint.as_deref(),
        Some("https://nova.example/v2.1")
    );
    assert_eq!(cfg.block_storage_endpoint, None);
    assert_eq!(cfg.request_timeout_secs, 45);
}

#[tokio::test]
async fn request_timeout_defaults_when_omitted() {
    let _guard = EnvGuard::set_vars(
        &[("OS_AUTH_TOKEN", "env-token")],
        &[
            "OS_REQUEST_TIMEOUT_SECS",
            "OS_COMPUTE_ENDPOINT",
            "OS_BLOCK_STORAGE_ENDPOINT",
            "OS_OBJECT_STORAGE_ENDPOINT",
            "OS_IDENTITY_ENDPOINT",
        ],
    )
    .await;

    let cfg = OpenStackConfig::load_without_cli_args()
        .unwrap_or_else(|err| panic!("config should load with defaults: {err}"));

    assert_eq!(cfg.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    assert_eq!(cfg.validate(), Ok(()));
}
