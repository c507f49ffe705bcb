// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Cross-process send primitive.
//!
//! The publish path only needs "send this message" and "send these bytes".
//! Everything behind that (discovery, wire encoding, reliability) belongs to
//! the transport implementation.

use crate::context::Context;
use crate::message::{Message, SerializedMessage};

/// Outcome of a transport send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportStatus {
    Ok,
    /// The publisher handle is invalid because its context is shutting down.
    /// Expected during teardown; never reported to the caller.
    PublisherInvalidTransient,
    /// The publisher handle is invalid while the context is still valid.
    PublisherInvalid,
    Failed(String),
}

impl TransportStatus {
    /// Classify an invalid-publisher report against the owning context.
    pub fn invalid_publisher(context: &Context) -> Self {
        if context.is_valid() {
            TransportStatus::PublisherInvalid
        } else {
            TransportStatus::PublisherInvalidTransient
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, TransportStatus::Ok)
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, TransportStatus::PublisherInvalidTransient)
    }

    /// Human readable reason for a failed status.
    pub fn reason(&self) -> String {
        match self {
            TransportStatus::Ok => "ok".to_string(),
            TransportStatus::PublisherInvalidTransient => {
                "publisher invalid (context shut down)".to_string()
            }
            TransportStatus::PublisherInvalid => "publisher invalid".to_string(),
            TransportStatus::Failed(reason) => reason.clone(),
        }
    }
}

/// Inter-process send interface used by a [`Publisher`](crate::Publisher).
pub trait InterProcessTransport<T: Message>: Send + Sync {
    fn send(&self, message: &T) -> TransportStatus;

    fn send_serialized(&self, message: &SerializedMessage) -> TransportStatus;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_publisher_classification() {
        let context = Context::new();
        assert_eq!(
            TransportStatus::invalid_publisher(&context),
            TransportStatus::PublisherInvalid
        );

        context.shutdown();
        let status = TransportStatus::invalid_publisher(&context);
        assert!(status.is_transient());
        assert!(!status.is_ok());
    }

    #[test]
    fn test_failed_reason_passthrough() {
        let status = TransportStatus::Failed("socket closed".to_string());
        assert_eq!(status.reason(), "socket closed");
        assert!(TransportStatus::Ok.is_ok());
    }
}
