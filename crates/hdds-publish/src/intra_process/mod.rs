// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Same-process delivery.
//!
//! # Architecture
//!
//! ```text
//! Context
//! +-- ArcSwapOption<IntraProcessManager>   (strong, dropped on shutdown)
//!
//! Publisher
//! +-- RegistryLink<T>
//!       +-- Weak<dyn IntraProcessRegistry<T>>  --upgrade()--> manager
//!       +-- PublisherId
//!
//! IntraProcessManager
//! +-- publishers:    PublisherId    -> (MatchKey, EndpointQos, remote count)
//! +-- subscriptions: SubscriptionId -> (MatchKey, EndpointQos, sink)
//! +-- matches:       PublisherId    -> { take_shared, take_ownership }
//! ```
//!
//! The publisher never keeps the registry alive. Once the owning context
//! tears the manager down every link fails with
//! [`Error::RegistryUnavailable`].

mod manager;
mod subscription;

pub use manager::{IntraProcessManager, PublisherRegistration};
pub use subscription::{BufferedSubscription, IntraProcessSubscription, Received};

use crate::error::{Error, Result};
use crate::message::{ExclusiveMessage, Message, SharedMessage};
use std::sync::{Arc, Weak};

/// Identity of a publisher registered for local delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PublisherId(pub u64);

/// Identity of a local subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub u64);

impl std::fmt::Display for PublisherId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "pub#{}", self.0)
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// Subscriber population seen by one publisher at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubscriberCounts {
    /// Subscriptions reachable in this process.
    pub local: usize,
    /// All subscriptions, local ones included.
    pub total: usize,
}

impl SubscriberCounts {
    pub fn new(local: usize, total: usize) -> Self {
        debug_assert!(local <= total, "local count exceeds total");
        Self { local, total }
    }

    pub fn remote(&self) -> usize {
        self.total.saturating_sub(self.local)
    }

    /// True when at least one subscriber lives outside this process.
    pub fn needs_inter_process(&self) -> bool {
        self.total > self.local
    }
}

/// Process-wide table of local subscriptions, as seen by a publisher.
pub trait IntraProcessRegistry<T: Message>: Send + Sync {
    fn subscriber_counts(&self, publisher: PublisherId) -> SubscriberCounts;

    /// Hand an exclusively owned message to every local subscription.
    fn deliver_exclusive(&self, publisher: PublisherId, message: ExclusiveMessage<T>) -> Result<()>;

    /// Hand a shared message to every local subscription.
    fn deliver_shared(&self, publisher: PublisherId, message: SharedMessage<T>) -> Result<()>;
}

/// Non-owning relation from a publisher to its registry.
pub struct RegistryLink<T: Message> {
    registry: Weak<dyn IntraProcessRegistry<T>>,
    publisher: PublisherId,
}

impl<T: Message> RegistryLink<T> {
    pub fn new<R>(registry: &Arc<R>, publisher: PublisherId) -> Self
    where
        R: IntraProcessRegistry<T> + 'static,
    {
        let registry: Arc<dyn IntraProcessRegistry<T>> = registry.clone();
        Self {
            registry: Arc::downgrade(&registry),
            publisher,
        }
    }

    /// Strong reference for the duration of one call.
    pub fn upgrade(&self) -> Result<Arc<dyn IntraProcessRegistry<T>>> {
        self.registry.upgrade().ok_or(Error::RegistryUnavailable)
    }

    pub fn is_alive(&self) -> bool {
        self.registry.strong_count() > 0
    }

    pub fn publisher_id(&self) -> PublisherId {
        self.publisher
    }
}

impl<T: Message> Clone for RegistryLink<T> {
    fn clone(&self) -> Self {
        Self {
            registry: Weak::clone(&self.registry),
            publisher: self.publisher,
        }
    }
}

impl<T: Message> std::fmt::Debug for RegistryLink<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryLink")
            .field("publisher", &self.publisher)
            .field("alive", &self.is_alive())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_remote() {
        let counts = SubscriberCounts::new(1, 3);
        assert_eq!(counts.remote(), 2);
        assert!(counts.needs_inter_process());
        assert!(!SubscriberCounts::new(2, 2).needs_inter_process());
        assert!(!SubscriberCounts::default().needs_inter_process());
    }

    #[test]
    fn test_link_goes_stale_with_registry() {
        let manager = Arc::new(IntraProcessManager::new());
        let id = manager.add_publisher::<u32>("/chatter", crate::EndpointQos::default());
        let link = RegistryLink::<u32>::new(&manager, id);

        assert!(link.is_alive());
        assert!(link.upgrade().is_ok());
        assert_eq!(link.publisher_id(), id);

        drop(manager);
        assert!(!link.is_alive());
        assert!(matches!(link.upgrade(), Err(Error::RegistryUnavailable)));
    }
}
