//! Error types for VM lifecycle operations.
//!
//! Nothing in this crate retries a failed remote call: transport and
//! application failures surface to the caller verbatim, and only the
//! *absence* of a target lifecycle state is retried (via [`crate::poll`]).
//! The variants below encode that taxonomy so callers can tell a
//! pre-flight validation failure from a remote one.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while driving a VM through its lifecycle.
#[derive(Debug, Error)]
pub enum Error {
    /// A declared value failed pre-flight validation. Raised before any
    /// remote call is attempted, never retried.
    #[error("validation error: {message}")]
    Validation {
        /// What was malformed and why
        message: String,
    },

    /// A remote call failed. Propagated verbatim; retry policy, if any,
    /// belongs to the transport layer.
    #[error("remote call {method} failed: {message}")]
    Remote {
        /// The remote method that failed (e.g. `one.vm.info`)
        method: String,
        /// Detailed error message from the transport
        message: String,
    },

    /// The provider's XML response could not be decoded.
    #[error("XML decode error: {0}")]
    Decode(#[from] quick_xml::DeError),

    /// The target lifecycle state was not reached within the poll bound.
    /// Fatal to the enclosing create or delete.
    #[error("timed out after {waited:?} waiting for state {target}")]
    Timeout {
        /// The lifecycle state that was being waited for
        target: String,
        /// Total time spent polling
        waited: Duration,
    },

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation {
            message: message.into(),
        }
    }

    /// Create a remote-call error.
    pub fn remote(method: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Remote {
            method: method.into(),
            message: message.into(),
        }
    }

    /// Whether this error is a poll timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }

    /// Whether this error was raised before any remote call.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation { .. })
    }
}

/// Result type for VM lifecycle operations.
pub type Result<T> = std::result::Result<T, Error>;
