// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Endpoint QoS subset used for local matching.
//!
//! Only the policies that decide whether a local publisher and subscription
//! may be paired live here. Enforcement is left to the transport.

/// Default history depth for local subscription queues.
pub const DEFAULT_DEPTH: usize = 10;

/// Reliability QoS policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Reliability {
    #[default]
    Reliable,
    BestEffort,
}

/// Durability QoS policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Durability {
    #[default]
    Volatile,
    TransientLocal,
}

/// QoS attached to a publisher or subscription endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointQos {
    pub reliability: Reliability,
    pub durability: Durability,
    /// History depth (queue length for buffered subscriptions).
    pub depth: usize,
}

impl Default for EndpointQos {
    fn default() -> Self {
        Self {
            reliability: Reliability::default(),
            durability: Durability::default(),
            depth: DEFAULT_DEPTH,
        }
    }
}

impl EndpointQos {
    pub fn reliable() -> Self {
        Self::default()
    }

    pub fn best_effort() -> Self {
        Self {
            reliability: Reliability::BestEffort,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn transient_local(mut self) -> Self {
        self.durability = Durability::TransientLocal;
        self
    }

    #[must_use]
    pub fn depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }
}

/// True when a publisher offering `publisher` can serve a subscription
/// requesting `subscription`.
///
/// A reliable subscription never pairs with a best-effort publisher, and
/// durability must match exactly.
pub fn compatible(publisher: &EndpointQos, subscription: &EndpointQos) -> bool {
    let reliability_ok = match (publisher.reliability, subscription.reliability) {
        (Reliability::Reliable, _) => true,
        (Reliability::BestEffort, Reliability::BestEffort) => true,
        (Reliability::BestEffort, Reliability::Reliable) => false,
    };
    reliability_ok && publisher.durability == subscription.durability
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reliability_matrix() {
        let reliable = EndpointQos::reliable();
        let best_effort = EndpointQos::best_effort();

        assert!(compatible(&reliable, &reliable));
        assert!(compatible(&reliable, &best_effort));
        assert!(compatible(&best_effort, &best_effort));
        assert!(!compatible(&best_effort, &reliable));
    }

    #[test]
    fn test_durability_must_match() {
        let volatile = EndpointQos::reliable();
        let latched = EndpointQos::reliable().transient_local();

        assert!(compatible(&latched, &latched));
        assert!(!compatible(&volatile, &latched));
        assert!(!compatible(&latched, &volatile));
    }

    #[test]
    fn test_depth_does_not_affect_matching() {
        let shallow = EndpointQos::reliable().depth(1);
        let deep = EndpointQos::reliable().depth(100);
        assert!(compatible(&shallow, &deep));
        assert_eq!(EndpointQos::default().depth, DEFAULT_DEPTH);
    }
}
