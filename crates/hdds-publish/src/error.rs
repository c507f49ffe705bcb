// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error taxonomy for the publish path.
//!
//! Every failure surfaced by a [`Publisher`](crate::Publisher) falls into one
//! of a few kinds, see [`ErrorKind`]. Transient transport conditions (a send
//! racing a context shutdown) never reach the caller and have no variant here.

use thiserror::Error;

/// Operation label used when a typed message send fails.
pub const PUBLISH_MESSAGE: &str = "failed to publish message";
/// Operation label used when a serialized message send fails.
pub const PUBLISH_SERIALIZED_MESSAGE: &str = "failed to publish serialized message";

/// Errors emitted by the publish path.
#[derive(Debug, Error)]
pub enum Error {
    /// The message handle is null or the buffer is empty.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    /// The requested publish path is not available for this publisher.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
    /// The intra-process registry was torn down before the publisher.
    #[error("cannot publish after registry teardown")]
    RegistryUnavailable,
    /// The message allocator could not provide storage.
    #[error("message allocation failed: {0}")]
    AllocationFailed(String),
    /// The inter-process transport reported a hard failure.
    #[error("{operation}: {reason}")]
    Transport {
        /// Which publish operation failed.
        operation: &'static str,
        /// Reason reported by the transport.
        reason: String,
    },
    /// Publisher or context configuration is inconsistent.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected before any collaborator saw the message.
    Validation,
    /// A collaborator the publisher only observes is gone.
    StaleCollaborator,
    /// Storage exhaustion in the allocator.
    Resource,
    /// The transport refused the send.
    Transport,
    /// Builder or environment misconfiguration.
    Configuration,
}

impl Error {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidArgument(_) | Error::Unsupported(_) => ErrorKind::Validation,
            Error::RegistryUnavailable => ErrorKind::StaleCollaborator,
            Error::AllocationFailed(_) => ErrorKind::Resource,
            Error::Transport { .. } => ErrorKind::Transport,
            Error::Config(_) => ErrorKind::Configuration,
        }
    }
}

/// Convenient alias for results carrying [`Error`].
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            Error::InvalidArgument("null").kind(),
            ErrorKind::Validation
        );
        assert_eq!(Error::Unsupported("x").kind(), ErrorKind::Validation);
        assert_eq!(
            Error::RegistryUnavailable.kind(),
            ErrorKind::StaleCollaborator
        );
        assert_eq!(
            Error::AllocationFailed("pool".into()).kind(),
            ErrorKind::Resource
        );
        assert_eq!(Error::Config("x".into()).kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_transport_error_message_names_operation() {
        let err = Error::Transport {
            operation: PUBLISH_SERIALIZED_MESSAGE,
            reason: "socket closed".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(
            err.to_string(),
            "failed to publish serialized message: socket closed"
        );
    }

    #[test]
    fn test_registry_unavailable_message() {
        assert_eq!(
            Error::RegistryUnavailable.to_string(),
            "cannot publish after registry teardown"
        );
    }
}
