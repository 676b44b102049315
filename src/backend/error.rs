//! Error kinds raised by the backend client families.
//!
//! Each family owns its own not-found signal so that the service layer can
//! convert it to absence without confusing, say, a missing flavour with a
//! missing volume.

use thiserror::Error;

/// Errors raised by a compute backend.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ComputeError {
    /// Raised when the requested compute resource does not exist.
    #[error("{resource} {id} not found")]
    NotFound {
        /// Kind of resource that was looked up (for example `server`).
        resource: String,
        /// Identifier or name used for the lookup.
        id: String,
    },
    /// Wrapper for any other provider level failure.
    #[error("compute provider error: {message}")]
    Provider {
        /// Message returned by the provider.
        message: String,
    },
}

/// Errors raised by a block-storage backend.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum BlockStorageError {
    /// Raised when the requested volume or snapshot does not exist.
    #[error("{resource} {id} not found")]
    NotFound {
        /// Kind of resource that was looked up (for example `volume`).
        resource: String,
        /// Identifier used for the lookup.
        id: String,
    },
    /// Wrapper for any other provider level failure.
    #[error("block storage provider error: {message}")]
    Provider {
        /// Message returned by the provider.
        message: String,
    },
}

/// Errors raised by an object-storage backend.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ObjectStorageError {
    /// Raised when the container or object does not exist.
    #[error("{resource} {id} not found")]
    NotFound {
        /// Kind of resource that was looked up (for example `container`).
        resource: String,
        /// Name used for the lookup.
        id: String,
    },
    /// Wrapper for any other provider level failure.
    #[error("object storage provider error: {message}")]
    Provider {
        /// Message returned by the provider.
        message: String,
    },
}

/// Errors raised by an identity catalog backend.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum CatalogError {
    /// Wrapper for provider level failures.
    #[error("identity provider error: {message}")]
    Provider {
        /// Message returned by the provider.
        message: String,
    },
}

/// Distinguishes a backend's not-found signal from every other failure.
pub trait NotFound {
    /// Returns `true` when the error reports a missing resource.
    fn is_not_found(&self) -> bool;
}

impl NotFound for ComputeError {
    fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl NotFound for BlockStorageError {
    fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl NotFound for ObjectStorageError {
    fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
