// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Process-wide intra-process manager.
//!
//! Keeps every local publisher and subscription, pairs them by
//! `(topic, message type)` plus QoS compatibility, and fans messages out to
//! the paired subscriptions.
//!
//! # Thread Safety
//!
//! - Registration and lookups go through one `RwLock` (many readers, few writers)
//! - Delivery collects its targets under the read lock, then releases it
//!   before calling into any subscription

use super::{
    IntraProcessRegistry, IntraProcessSubscription, PublisherId, SubscriberCounts, SubscriptionId,
};
use crate::error::{Error, Result};
use crate::message::{ExclusiveMessage, Message, SharedMessage};
use crate::qos::{self, EndpointQos};
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Two endpoints can pair only if they share topic and message type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MatchKey {
    topic: Arc<str>,
    type_id: TypeId,
}

impl MatchKey {
    fn of<T: Message>(topic: &str) -> Self {
        Self {
            topic: Arc::from(topic),
            type_id: TypeId::of::<T>(),
        }
    }
}

struct PublisherEntry {
    key: MatchKey,
    qos: EndpointQos,
    /// Subscriptions outside this process, as reported by discovery.
    remote: usize,
}

struct SubscriptionEntry {
    key: MatchKey,
    qos: EndpointQos,
    take_shared: bool,
    /// `Arc<dyn IntraProcessSubscription<T>>`, erased.
    sink: Box<dyn Any + Send + Sync>,
}

#[derive(Debug, Default)]
struct SplitSubscriptions {
    take_shared: BTreeSet<SubscriptionId>,
    take_ownership: BTreeSet<SubscriptionId>,
}

impl SplitSubscriptions {
    fn insert(&mut self, id: SubscriptionId, take_shared: bool) {
        if take_shared {
            self.take_shared.insert(id);
        } else {
            self.take_ownership.insert(id);
        }
    }

    fn remove(&mut self, id: SubscriptionId) {
        self.take_shared.remove(&id);
        self.take_ownership.remove(&id);
    }

    fn len(&self) -> usize {
        self.take_shared.len() + self.take_ownership.len()
    }
}

#[derive(Default)]
struct ManagerState {
    publishers: HashMap<PublisherId, PublisherEntry>,
    subscriptions: HashMap<SubscriptionId, SubscriptionEntry>,
    matches: HashMap<PublisherId, SplitSubscriptions>,
}

fn can_communicate(publisher: &PublisherEntry, subscription: &SubscriptionEntry) -> bool {
    publisher.key == subscription.key && qos::compatible(&publisher.qos, &subscription.qos)
}

type Sink<T> = Arc<dyn IntraProcessSubscription<T>>;

struct Targets<T: Message> {
    sharers: Vec<Sink<T>>,
    owners: Vec<Sink<T>>,
}

/// Process-wide registry of local publishers and subscriptions.
pub struct IntraProcessManager {
    state: RwLock<ManagerState>,
    next_id: AtomicU64,
}

impl IntraProcessManager {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(ManagerState::default()),
            next_id: AtomicU64::new(1),
        }
    }

    fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Register a publisher of `T` on `topic` and pair it with every
    /// compatible subscription already present.
    pub fn add_publisher<T: Message>(&self, topic: &str, qos: EndpointQos) -> PublisherId {
        let id = PublisherId(self.allocate_id());
        let entry = PublisherEntry {
            key: MatchKey::of::<T>(topic),
            qos,
            remote: 0,
        };

        let mut state = self.state.write();
        let mut split = SplitSubscriptions::default();
        for (sub_id, sub) in &state.subscriptions {
            if can_communicate(&entry, sub) {
                split.insert(*sub_id, sub.take_shared);
            }
        }
        log::debug!(
            "[intra-process] publisher {} on '{}' matched {} local subscription(s)",
            id,
            topic,
            split.len()
        );
        state.matches.insert(id, split);
        state.publishers.insert(id, entry);
        id
    }

    /// Register `publisher` and return a token that removes it on drop.
    pub fn register_publisher<T: Message>(
        self: &Arc<Self>,
        topic: &str,
        qos: EndpointQos,
    ) -> PublisherRegistration {
        let id = self.add_publisher::<T>(topic, qos);
        PublisherRegistration {
            manager: Arc::downgrade(self),
            id,
        }
    }

    pub fn remove_publisher(&self, id: PublisherId) {
        let mut state = self.state.write();
        state.publishers.remove(&id);
        state.matches.remove(&id);
        log::debug!("[intra-process] removed publisher {}", id);
    }

    /// Register a local subscription of `T` on `topic`.
    pub fn add_subscription<T: Message>(
        &self,
        topic: &str,
        qos: EndpointQos,
        subscription: Arc<dyn IntraProcessSubscription<T>>,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.allocate_id());
        let entry = SubscriptionEntry {
            key: MatchKey::of::<T>(topic),
            qos,
            take_shared: subscription.use_take_shared_method(),
            sink: Box::new(subscription),
        };

        let mut state = self.state.write();
        let ManagerState {
            publishers,
            matches,
            ..
        } = &mut *state;
        for (pub_id, publisher) in publishers.iter() {
            if can_communicate(publisher, &entry) {
                matches
                    .entry(*pub_id)
                    .or_default()
                    .insert(id, entry.take_shared);
            }
        }
        log::debug!(
            "[intra-process] subscription {} on '{}' (take_shared={})",
            id,
            topic,
            entry.take_shared
        );
        state.subscriptions.insert(id, entry);
        id
    }

    pub fn remove_subscription(&self, id: SubscriptionId) {
        let mut state = self.state.write();
        state.subscriptions.remove(&id);
        for split in state.matches.values_mut() {
            split.remove(id);
        }
        log::debug!("[intra-process] removed subscription {}", id);
    }

    /// Record how many subscriptions outside this process match `publisher`.
    ///
    /// Returns false for an unknown publisher.
    pub fn set_inter_process_subscription_count(&self, publisher: PublisherId, count: usize) -> bool {
        match self.state.write().publishers.get_mut(&publisher) {
            Some(entry) => {
                entry.remote = count;
                true
            }
            None => {
                log::warn!(
                    "[intra-process] cannot set remote count: publisher {} not registered",
                    publisher
                );
                false
            }
        }
    }

    /// Counts for `publisher`; zero when it is not registered.
    pub fn subscription_count(&self, publisher: PublisherId) -> SubscriberCounts {
        let state = self.state.read();
        let Some(entry) = state.publishers.get(&publisher) else {
            log::warn!(
                "[intra-process] subscription count requested for unknown publisher {}",
                publisher
            );
            return SubscriberCounts::default();
        };
        let local = state.matches.get(&publisher).map_or(0, SplitSubscriptions::len);
        SubscriberCounts::new(local, local.saturating_add(entry.remote))
    }

    /// Publishers currently paired with `subscription`.
    pub fn matching_publishers(&self, subscription: SubscriptionId) -> Vec<PublisherId> {
        let state = self.state.read();
        let mut ids: Vec<PublisherId> = state
            .matches
            .iter()
            .filter(|(_, split)| {
                split.take_shared.contains(&subscription)
                    || split.take_ownership.contains(&subscription)
            })
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Registered subscription `id`, if it exists and takes messages of `T`.
    pub fn subscription<T: Message>(
        &self,
        id: SubscriptionId,
    ) -> Option<Arc<dyn IntraProcessSubscription<T>>> {
        let state = self.state.read();
        state.subscriptions.get(&id)?.sink.downcast_ref::<Sink<T>>().cloned()
    }

    /// Whether `publisher` is one of this manager's local publishers.
    ///
    /// Lets a subscription discard the inter-process copy of a message it
    /// already received locally.
    pub fn matches_any_publishers(&self, publisher: PublisherId) -> bool {
        self.state.read().publishers.contains_key(&publisher)
    }

    pub fn publisher_count(&self) -> usize {
        self.state.read().publishers.len()
    }

    pub fn subscription_total(&self) -> usize {
        self.state.read().subscriptions.len()
    }

    fn targets<T: Message>(&self, publisher: PublisherId) -> Result<Option<Targets<T>>> {
        let state = self.state.read();
        let Some(entry) = state.publishers.get(&publisher) else {
            return Ok(None);
        };
        if entry.key.type_id != TypeId::of::<T>() {
            log::warn!(
                "[intra-process] publisher {} on '{}' was registered for another message type",
                publisher,
                entry.key.topic
            );
            return Err(Error::InvalidArgument(
                "publisher was registered for another message type",
            ));
        }
        let Some(split) = state.matches.get(&publisher) else {
            return Ok(None);
        };
        let resolve = |ids: &BTreeSet<SubscriptionId>| -> Vec<Sink<T>> {
            ids.iter()
                .filter_map(|id| state.subscriptions.get(id))
                .filter_map(|entry| entry.sink.downcast_ref::<Sink<T>>())
                .cloned()
                .collect()
        };
        Ok(Some(Targets {
            sharers: resolve(&split.take_shared),
            owners: resolve(&split.take_ownership),
        }))
    }

    /// Give `message` to `owners`: copies to all but the last, the original
    /// to the last.
    fn hand_out_owned<T: Message>(owners: &[Sink<T>], message: ExclusiveMessage<T>) -> Result<()> {
        let Some((last, rest)) = owners.split_last() else {
            return Ok(());
        };
        for owner in rest {
            owner.provide_owned(message.try_clone()?);
        }
        last.provide_owned(message);
        Ok(())
    }
}

impl Default for IntraProcessManager {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Message> IntraProcessRegistry<T> for IntraProcessManager {
    fn subscriber_counts(&self, publisher: PublisherId) -> SubscriberCounts {
        self.subscription_count(publisher)
    }

    fn deliver_exclusive(&self, publisher: PublisherId, message: ExclusiveMessage<T>) -> Result<()> {
        if message.is_null() {
            return Err(Error::InvalidArgument("cannot deliver a null message handle"));
        }
        let Some(targets) = self.targets::<T>(publisher)? else {
            log::warn!(
                "[intra-process] delivery from unknown publisher {} dropped",
                publisher
            );
            return Ok(());
        };

        match (targets.sharers.is_empty(), targets.owners.is_empty()) {
            (true, true) => {
                log::trace!("[intra-process] {} has no local subscriptions", publisher);
                Ok(())
            }
            (false, true) => {
                let shared = message.into_shared()?;
                for sharer in &targets.sharers {
                    sharer.provide_shared(shared.clone());
                }
                Ok(())
            }
            (true, false) => Self::hand_out_owned(&targets.owners, message),
            (false, false) => {
                let shared = message.try_clone()?.into_shared()?;
                for sharer in &targets.sharers {
                    sharer.provide_shared(shared.clone());
                }
                Self::hand_out_owned(&targets.owners, message)
            }
        }
    }

    fn deliver_shared(&self, publisher: PublisherId, message: SharedMessage<T>) -> Result<()> {
        let Some(targets) = self.targets::<T>(publisher)? else {
            log::warn!(
                "[intra-process] delivery from unknown publisher {} dropped",
                publisher
            );
            return Ok(());
        };

        for sharer in &targets.sharers {
            sharer.provide_shared(message.clone());
        }
        for owner in &targets.owners {
            let copy = message.deleter().allocate((*message).clone())?;
            owner.provide_owned(copy);
        }
        Ok(())
    }
}

impl std::fmt::Debug for IntraProcessManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("IntraProcessManager")
            .field("publishers", &state.publishers.len())
            .field("subscriptions", &state.subscriptions.len())
            .finish()
    }
}

/// Token returned by [`IntraProcessManager::register_publisher`].
///
/// Removes the publisher when dropped, if the manager still exists.
pub struct PublisherRegistration {
    manager: Weak<IntraProcessManager>,
    id: PublisherId,
}

impl PublisherRegistration {
    pub fn id(&self) -> PublisherId {
        self.id
    }
}

impl Drop for PublisherRegistration {
    fn drop(&mut self) {
        if let Some(manager) = self.manager.upgrade() {
            manager.remove_publisher(self.id);
        }
    }
}

impl std::fmt::Debug for PublisherRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublisherRegistration")
            .field("id", &self.id)
            .finish()
    }
}
