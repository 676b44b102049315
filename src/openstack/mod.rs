//! REST transport implementing the backend traits against OpenStack APIs.
//!
//! Each configured endpoint yields one client. Requests carry the configured
//! token in `X-Auth-Token` and are bounded by the configured timeout; there
//! are no retries. HTTP 404 surfaces as the family's not-found error so the
//! services can report absence.

mod block_storage;
mod compute;
mod http;
mod identity;
mod object_storage;

use std::sync::Arc;

use tracing::info;

use crate::config::OpenStackConfig;
use crate::error::CloudError;
use crate::provider::CloudProvider;

pub use block_storage::BlockStorageClient;
pub use compute::ComputeClient;
pub use identity::IdentityClient;
pub use object_storage::ObjectStorageClient;

use http::RestClient;

fn rest_client(config: &OpenStackConfig, endpoint: &str) -> Result<RestClient, CloudError> {
    RestClient::new(endpoint, &config.auth_token, config.request_timeout())
        .map_err(|err| CloudError::Config(err.to_string()))
}

/// Builds a provider wired with a client for every configured endpoint.
///
/// # Errors
///
/// Returns [`CloudError::Config`] when the configuration fails validation or
/// an endpoint is not an absolute URL.
pub fn connect(config: &OpenStackConfig) -> Result<CloudProvider, CloudError> {
    config.validate()?;
    let mut builder = CloudProvider::builder();
    if let Some(endpoint) = &config.compute_endpoint {
        builder = builder.compute(Arc::new(ComputeClient::new(rest_client(config, endpoint)?)));
    }
    if let Some(endpoint) = &config.block_storage_endpoint {
        builder = builder.block_storage(Arc::new(BlockStorageClient::new(rest_client(
            config, endpoint,
        )?)));
    }
    if let Some(endpoint) = &config.object_storage_endpoint {
        builder = builder.object_storage(Arc::new(ObjectStorageClient::new(rest_client(
            config, endpoint,
        )?)));
    }
    if let Some(endpoint) = &config.identity_endpoint {
        builder = builder.catalog(Arc::new(IdentityClient::new(rest_client(config, endpoint)?)));
    }
    info!(
        compute = config.compute_endpoint.is_some(),
        block_storage = config.block_storage_endpoint.is_some(),
        object_storage = config.object_storage_endpoint.is_some(),
        identity = config.identity_endpoint.is_some(),
        "connected OpenStack provider"
    );
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn connect_wires_only_configured_endpoints() {
        let config = OpenStackConfig {
            compute_endpoint: Some(String::from("https://nova.example/v2.1")),
            identity_endpoint: Some(String::from("https://keystone.example/v3")),
            ..OpenStackConfig::with_token("token")
        };
        let provider = connect(&config).expect("connect");
        assert!(provider.has_service("compute.regions"));
        assert!(provider.has_service("security.key_pairs"));
        assert!(!provider.has_service("block_store"));
        assert!(!provider.has_service("object_store"));
    }

    #[rstest]
    fn connect_rejects_relative_endpoint() {
        let config = OpenStackConfig {
            object_storage_endpoint: Some(String::from("swift/v1")),
            ..OpenStackConfig::with_token("token")
        };
        assert!(matches!(connect(&config), Err(CloudError::Config(_))));
    }

    #[rstest]
    fn connect_requires_token() {
        let config = OpenStackConfig::with_token("");
        let err = connect(&config).expect_err("blank token");
        assert!(err.to_string().contains("OS_AUTH_TOKEN"), "{err}");
    }
}
