//! Errors surfaced by the service layer.

use thiserror::Error;
use tracing::debug;

use crate::backend::{BlockStorageError, CatalogError, ComputeError, NotFound, ObjectStorageError};
use crate::config::ConfigError;
use crate::launch::LaunchConfigError;

/// Errors returned by provider services.
///
/// Absence is never reported here: `get` operations return `Ok(None)` for a
/// missing resource. Backend failures are carried unchanged in the
/// family-specific variants.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum CloudError {
    /// Raised when an operation makes no sense for this provider.
    #[error("{operation} not implemented by this provider")]
    Unsupported {
        /// Operation that was requested (for example `find_volume`).
        operation: String,
    },
    /// Raised when an argument is missing or out of range.
    #[error("invalid argument: {0}")]
    Validation(String),
    /// Raised when a launch configuration is inconsistent.
    #[error("invalid launch configuration: {0}")]
    InvalidLaunchConfig(#[from] LaunchConfigError),
    /// Raised when an instance type name matches nothing in the catalog.
    #[error("instance type '{name}' not found")]
    InstanceTypeNotFound {
        /// Name or identifier passed by the caller.
        name: String,
    },
    /// Raised when the provider configuration is incomplete.
    #[error("configuration error: {0}")]
    Config(String),
    /// Failure reported by the compute backend.
    #[error(transparent)]
    Compute(#[from] ComputeError),
    /// Failure reported by the block-storage backend.
    #[error(transparent)]
    BlockStorage(#[from] BlockStorageError),
    /// Failure reported by the object-storage backend.
    #[error(transparent)]
    ObjectStorage(#[from] ObjectStorageError),
    /// Failure reported by the identity catalog backend.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl CloudError {
    pub(crate) fn unsupported(operation: &str) -> Self {
        Self::Unsupported {
            operation: operation.to_owned(),
        }
    }
}

impl From<ConfigError> for CloudError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value.to_string())
    }
}

/// Converts a backend's not-found signal into absence.
pub(crate) trait OrAbsent<T> {
    /// Maps `Err(not found)` to `Ok(None)` and every other error into
    /// [`CloudError`].
    fn or_absent(self) -> Result<Option<T>, CloudError>;
}

impl<T, E> OrAbsent<T> for Result<T, E>
where
    E: NotFound + Into<CloudError> + std::fmt::Display,
{
    fn or_absent(self) -> Result<Option<T>, CloudError> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_not_found() => {
                debug!(error = %err, "backend reported not found");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Reports a delete as successful whether or not the resource still existed.
pub(crate) fn idempotent_delete<E>(result: Result<(), E>) -> Result<bool, CloudError>
where
    E: NotFound + Into<CloudError> + std::fmt::Display,
{
    result.or_absent().map(|_| true)
}

/// Rejects a zero volume size.
pub(crate) fn check_volume_size(size: u64) -> Result<u64, CloudError> {
    if size == 0 {
        return Err(CloudError::Validation(String::from(
            "volume size must be greater than zero",
        )));
    }
    Ok(size)
}

/// Rejects a zero page size.
pub(crate) fn check_limit(limit: Option<usize>) -> Result<Option<usize>, CloudError> {
    match limit {
        Some(0) => Err(CloudError::Validation(String::from(
            "limit must be a positive integer",
        ))),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn not_found_becomes_absence() {
        let result: Result<u8, ComputeError> = Err(ComputeError::NotFound {
            resource: String::from("server"),
            id: String::from("i-1"),
        });
        assert_eq!(result.or_absent(), Ok(None));
    }

    #[rstest]
    fn other_failures_propagate_unchanged() {
        let failure = BlockStorageError::Provider {
            message: String::from("quota exceeded"),
        };
        let result: Result<u8, BlockStorageError> = Err(failure.clone());
        assert_eq!(result.or_absent(), Err(CloudError::BlockStorage(failure)));
    }

    #[rstest]
    #[case(None, true)]
    #[case(Some(1), true)]
    #[case(Some(0), false)]
    fn check_limit_rejects_zero(#[case] limit: Option<usize>, #[case] accepted: bool) {
        assert_eq!(check_limit(limit).is_ok(), accepted);
    }

    #[rstest]
    fn unsupported_is_distinct_from_absence() {
        let err = CloudError::unsupported("find_volume");
        assert_eq!(err.to_string(), "find_volume not implemented by this provider");
    }
}
