// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::builder::PublisherBuilder;
use crate::allocator::{HeapAllocator, MessageAllocator, MessageDeleter};
use crate::error::{Error, Result, PUBLISH_MESSAGE, PUBLISH_SERIALIZED_MESSAGE};
use crate::events::{EventBridge, PublisherEvent};
use crate::intra_process::{PublisherId, PublisherRegistration, RegistryLink, SubscriberCounts};
use crate::message::{ExclusiveMessage, Message, SerializedMessage};
use crate::qos::EndpointQos;
use crate::transport::{InterProcessTransport, TransportStatus};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Local route of an intra-process enabled publisher.
pub(super) struct IntraProcessRoute<T: Message> {
    pub(super) link: RegistryLink<T>,
    /// Unregisters the publisher from the context manager on drop.
    pub(super) _registration: Option<PublisherRegistration>,
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublisherStats {
    pub messages_published: u64,
    pub intra_process_deliveries: u64,
    pub inter_process_sends: u64,
    /// Sends that hit a shut-down context and were ignored.
    pub transient_errors: u64,
}

#[derive(Default)]
struct StatCounters {
    published: AtomicU64,
    intra: AtomicU64,
    inter: AtomicU64,
    transient: AtomicU64,
}

/// Typed publisher routing each message to local subscriptions, the
/// inter-process transport, or both.
///
/// Local delivery always happens before the remote send of the same message.
pub struct Publisher<T: Message, A: MessageAllocator<T> = HeapAllocator> {
    pub(super) topic: String,
    pub(super) qos: EndpointQos,
    pub(super) allocator: Arc<A>,
    pub(super) deleter: MessageDeleter<T>,
    pub(super) intra_process: Option<IntraProcessRoute<T>>,
    pub(super) transport: Arc<dyn InterProcessTransport<T>>,
    pub(super) events: EventBridge,
    stats: StatCounters,
}

impl<T: Message> Publisher<T, HeapAllocator> {
    /// Builder for a heap-allocating publisher on `topic`.
    pub fn builder(topic: impl Into<String>) -> PublisherBuilder<T, HeapAllocator> {
        PublisherBuilder::new(topic)
    }
}

impl<T: Message, A: MessageAllocator<T>> Publisher<T, A> {
    pub(super) fn from_parts(
        topic: String,
        qos: EndpointQos,
        allocator: Arc<A>,
        intra_process: Option<IntraProcessRoute<T>>,
        transport: Arc<dyn InterProcessTransport<T>>,
        events: EventBridge,
    ) -> Self {
        let deleter = MessageDeleter::for_allocator(&allocator);
        Self {
            topic,
            qos,
            allocator,
            deleter,
            intra_process,
            transport,
            events,
            stats: StatCounters::default(),
        }
    }

    #[must_use]
    pub fn topic_name(&self) -> &str {
        &self.topic
    }

    #[must_use]
    pub fn qos(&self) -> &EndpointQos {
        &self.qos
    }

    pub fn is_intra_process_enabled(&self) -> bool {
        self.intra_process.is_some()
    }

    /// Identity registered for local delivery, if enabled.
    pub fn intra_process_id(&self) -> Option<PublisherId> {
        self.intra_process.as_ref().map(|route| route.link.publisher_id())
    }

    /// The allocator every message of this publisher goes through.
    pub fn allocator(&self) -> Arc<A> {
        Arc::clone(&self.allocator)
    }

    /// Construct a message with this publisher's allocator, ready for
    /// [`publish`](Self::publish).
    pub fn allocate(&self, value: T) -> Result<ExclusiveMessage<T>> {
        self.deleter.allocate(value)
    }

    /// Current `(local, total)` subscriber counts.
    pub fn subscriber_counts(&self) -> Result<SubscriberCounts> {
        let route = self
            .intra_process
            .as_ref()
            .ok_or(Error::Unsupported("intra-process delivery is disabled for this publisher"))?;
        let registry = route.link.upgrade()?;
        Ok(registry.subscriber_counts(route.link.publisher_id()))
    }

    pub fn events(&self) -> &EventBridge {
        &self.events
    }

    /// Forward a transport-side event to the registered handler.
    pub fn notify_event(&self, event: &PublisherEvent) -> bool {
        let handled = self.events.notify(event);
        if !handled {
            log::trace!(
                "[publisher] '{}' has no handler for {:?}",
                self.topic,
                event.kind()
            );
        }
        handled
    }

    pub fn stats(&self) -> PublisherStats {
        PublisherStats {
            messages_published: self.stats.published.load(Ordering::Relaxed),
            intra_process_deliveries: self.stats.intra.load(Ordering::Relaxed),
            inter_process_sends: self.stats.inter.load(Ordering::Relaxed),
            transient_errors: self.stats.transient.load(Ordering::Relaxed),
        }
    }

    /// Publish an exclusively owned message.
    ///
    /// Local subscriptions receive the message first. When subscribers exist
    /// outside this process the message is promoted to a shared handle so the
    /// same storage feeds both paths; otherwise ownership moves to the local
    /// subscriptions directly.
    pub fn publish(&self, message: ExclusiveMessage<T>) -> Result<()> {
        let Some(value) = message.get() else {
            return Err(Error::InvalidArgument("cannot publish msg which is a null pointer"));
        };

        let Some(route) = &self.intra_process else {
            self.do_inter_process_publish(value)?;
            self.stats.published.fetch_add(1, Ordering::Relaxed);
            return Ok(());
        };

        let registry = route.link.upgrade()?;
        let id = route.link.publisher_id();
        let counts = registry.subscriber_counts(id);
        log::trace!(
            "[publisher] '{}' publish local={} total={}",
            self.topic,
            counts.local,
            counts.total
        );

        if counts.needs_inter_process() {
            let shared = message.into_shared()?;
            registry.deliver_shared(id, shared.clone())?;
            self.stats.intra.fetch_add(1, Ordering::Relaxed);
            self.do_inter_process_publish(&shared)?;
        } else {
            registry.deliver_exclusive(id, message)?;
            self.stats.intra.fetch_add(1, Ordering::Relaxed);
        }
        self.stats.published.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Publish a borrowed message.
    ///
    /// Without local delivery the message goes straight to the transport and
    /// nothing is allocated. Otherwise a copy is made through the publisher's
    /// allocator and published as an exclusive message.
    pub fn publish_ref(&self, message: &T) -> Result<()> {
        if self.intra_process.is_none() {
            self.do_inter_process_publish(message)?;
            self.stats.published.fetch_add(1, Ordering::Relaxed);
            return Ok(());
        }
        let owned = self.deleter.allocate(message.clone())?;
        self.publish(owned)
    }

    /// Publish pre-serialized bytes on the inter-process path.
    ///
    /// Not available while local delivery is enabled.
    pub fn publish_serialized(&self, message: &SerializedMessage) -> Result<()> {
        if self.intra_process.is_some() {
            return Err(Error::Unsupported(
                "storing serialized messages in intra process is not supported yet",
            ));
        }
        if message.is_empty() {
            return Err(Error::InvalidArgument("cannot publish an empty serialized message"));
        }

        let status = self.transport.send_serialized(message);
        self.check_status(status, PUBLISH_SERIALIZED_MESSAGE)?;
        self.stats.published.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn do_inter_process_publish(&self, message: &T) -> Result<()> {
        let status = self.transport.send(message);
        self.check_status(status, PUBLISH_MESSAGE)
    }

    fn check_status(&self, status: TransportStatus, operation: &'static str) -> Result<()> {
        match status {
            TransportStatus::Ok => {
                self.stats.inter.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            TransportStatus::PublisherInvalidTransient => {
                // Context shut down under us; the publisher is going away too.
                self.stats.transient.fetch_add(1, Ordering::Relaxed);
                log::debug!(
                    "[publisher] '{}' ignoring send on shut-down context",
                    self.topic
                );
                Ok(())
            }
            other => {
                log::debug!(
                    "[publisher] '{}' {}: {}",
                    self.topic,
                    operation,
                    other.reason()
                );
                Err(Error::Transport {
                    operation,
                    reason: other.reason(),
                })
            }
        }
    }
}

impl<T: Message, A: MessageAllocator<T>> std::fmt::Debug for Publisher<T, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher")
            .field("topic", &self.topic)
            .field("qos", &self.qos)
            .field("intra_process_id", &self.intra_process_id())
            .field("events", &self.events)
            .finish()
    }
}
