// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use crate::message::{ExclusiveMessage, Message, SharedMessage};
use crate::qos::EndpointQos;
use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicU64, Ordering};

/// Local endpoint that receives messages from the intra-process manager.
pub trait IntraProcessSubscription<T: Message>: Send + Sync {
    /// True when this subscription only reads messages and can share them
    /// with other subscriptions; false when it wants ownership.
    fn use_take_shared_method(&self) -> bool;

    fn provide_shared(&self, message: SharedMessage<T>);

    fn provide_owned(&self, message: ExclusiveMessage<T>);
}

/// Message as handed to a local subscription.
#[derive(Debug)]
pub enum Received<T: Message> {
    Owned(ExclusiveMessage<T>),
    Shared(SharedMessage<T>),
}

impl<T: Message> Received<T> {
    /// Borrow the payload. `None` only for a null owned handle.
    pub fn get(&self) -> Option<&T> {
        match self {
            Received::Owned(msg) => msg.get(),
            Received::Shared(msg) => Some(&**msg),
        }
    }

    pub fn is_shared(&self) -> bool {
        matches!(self, Received::Shared(_))
    }
}

/// Subscription backed by a bounded queue.
///
/// The queue depth comes from the subscription QoS. When the queue is full
/// the incoming message is dropped and counted.
pub struct BufferedSubscription<T: Message> {
    tx: Sender<Received<T>>,
    rx: Receiver<Received<T>>,
    take_shared: bool,
    dropped: AtomicU64,
}

impl<T: Message> BufferedSubscription<T> {
    /// Subscription that wants ownership of every message.
    pub fn owning(qos: &EndpointQos) -> Self {
        Self::with_mode(qos, false)
    }

    /// Subscription that reads messages shared with its peers.
    pub fn sharing(qos: &EndpointQos) -> Self {
        Self::with_mode(qos, true)
    }

    fn with_mode(qos: &EndpointQos, take_shared: bool) -> Self {
        let (tx, rx) = channel::bounded(qos.depth.max(1));
        Self {
            tx,
            rx,
            take_shared,
            dropped: AtomicU64::new(0),
        }
    }

    /// Pop the oldest queued message.
    pub fn try_take(&self) -> Option<Received<T>> {
        self.rx.try_recv().ok()
    }

    /// Drain everything currently queued.
    pub fn take_all(&self) -> Vec<Received<T>> {
        self.rx.try_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Messages discarded because they could not be queued.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn push(&self, message: Received<T>) {
        match self.tx.try_send(message) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => self.record_drop("queue full"),
            Err(TrySendError::Disconnected(_)) => self.record_drop("queue closed"),
        }
    }

    fn record_drop(&self, reason: &str) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
        log::trace!("[intra-process] subscription {}, dropping message", reason);
    }
}

impl<T: Message> IntraProcessSubscription<T> for BufferedSubscription<T> {
    fn use_take_shared_method(&self) -> bool {
        self.take_shared
    }

    fn provide_shared(&self, message: SharedMessage<T>) {
        self.push(Received::Shared(message));
    }

    fn provide_owned(&self, message: ExclusiveMessage<T>) {
        self.push(Received::Owned(message));
    }
}

impl<T: Message> std::fmt::Debug for BufferedSubscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferedSubscription")
            .field("take_shared", &self.take_shared)
            .field("queued", &self.len())
            .field("dropped", &self.dropped())
            .finish()
    }
}
